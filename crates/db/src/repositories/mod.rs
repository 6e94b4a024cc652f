//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Methods
//! that take part in a locked request accept `&mut PgConnection`, so callers
//! pass the open transaction (`&mut tx`) and every read and write lands in
//! it. `lock*` methods issue `SELECT ... FOR UPDATE`.

pub mod balance_repo;
pub mod battle_repo;
pub mod bloblet_repo;
pub mod care_order_repo;
pub mod charge_state_repo;
pub mod cooldown_repo;
pub mod gear_repo;
pub mod item_repo;
pub mod loadout_repo;
pub mod telemetry_repo;

pub use balance_repo::BalanceRepo;
pub use battle_repo::BattleRepo;
pub use bloblet_repo::BlobletRepo;
pub use care_order_repo::CareOrderRepo;
pub use charge_state_repo::ChargeStateRepo;
pub use cooldown_repo::CooldownRepo;
pub use gear_repo::GearRepo;
pub use item_repo::ItemRepo;
pub use loadout_repo::LoadoutRepo;
pub use telemetry_repo::TelemetryRepo;
