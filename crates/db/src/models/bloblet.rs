//! Bloblet (character) model.

use bloblets_core::types::{Address, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `bloblets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Bloblet {
    pub address: Address,
    pub is_alive: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
