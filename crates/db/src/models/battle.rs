//! Battle records and directional pair cooldowns.

use bloblets_core::types::{Address, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `battles` table. `outcome` holds the full serialized
/// battle outcome.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BattleRecord {
    pub id: DbId,
    pub attacker: Address,
    pub defender: Address,
    pub winner: Address,
    pub loser: Address,
    pub critical: bool,
    pub transfer_points: i64,
    pub house_points: i64,
    pub outcome: serde_json::Value,
    pub created_at: Timestamp,
}

/// Insert DTO for a battle record.
#[derive(Debug, Clone)]
pub struct NewBattle<'a> {
    pub attacker: &'a str,
    pub defender: &'a str,
    pub winner: &'a str,
    pub loser: &'a str,
    pub critical: bool,
    pub transfer_points: i64,
    pub house_points: i64,
    pub outcome: serde_json::Value,
    pub created_at: Timestamp,
}

/// A row from the `battle_cooldowns` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BattleCooldown {
    pub attacker: Address,
    pub defender: Address,
    pub next_allowed_at: Timestamp,
}
