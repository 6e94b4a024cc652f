//! Settled payment orders that pay for a single nourish.

use bloblets_core::types::{Address, Timestamp};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

pub const ORDER_STATUS_SETTLED: &str = "settled";
pub const ORDER_STATUS_CONSUMED: &str = "consumed";

/// A row from the `care_orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CareOrder {
    pub id: Uuid,
    pub address: Address,
    pub status: String,
    pub consumed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl CareOrder {
    pub fn is_consumed(&self) -> bool {
        self.status == ORDER_STATUS_CONSUMED
    }
}
