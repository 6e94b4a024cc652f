//! Per-attempt drop telemetry, kept for economy auditing.

use bloblets_core::types::{Address, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

pub const SOURCE_NOURISH: &str = "nourish";
pub const SOURCE_FAST_FORWARD: &str = "fast_forward";

/// A row from the `drop_telemetry` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DropTelemetry {
    pub id: DbId,
    pub address: Address,
    pub source: String,
    pub probability: f64,
    pub roll: f64,
    pub acc_before: f64,
    pub acc_after: f64,
    pub outcome: String,
    pub item_id: Option<DbId>,
    pub created_at: Timestamp,
}
