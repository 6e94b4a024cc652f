//! Row structs and insert DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` struct matching the
//! database row and, where the domain type differs from the row, a conversion
//! into the `bloblets-core` type.

pub mod battle;
pub mod bloblet;
pub mod care_order;
pub mod charge_state;
pub mod economy;
pub mod item;
pub mod loadout;
pub mod telemetry;
