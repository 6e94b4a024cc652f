//! Gear catalog model.

use bloblets_core::error::CoreError;
use bloblets_core::gear::{Item, ItemType};
use bloblets_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ItemRow {
    pub id: DbId,
    pub slug: String,
    pub item_type: String,
    pub rarity: String,
    pub op: i32,
    pub dp: i32,
    pub icon: Option<String>,
    pub created_at: Timestamp,
}

impl TryFrom<ItemRow> for Item {
    type Error = CoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(Item {
            id: row.id,
            slug: row.slug,
            item_type: ItemType::from_str_value(&row.item_type)?,
            rarity: row.rarity,
            op: row.op,
            dp: row.dp,
            icon: row.icon,
        })
    }
}

/// Convert a batch of rows, failing on the first unknown item type.
pub fn into_items(rows: Vec<ItemRow>) -> Result<Vec<Item>, CoreError> {
    rows.into_iter().map(Item::try_from).collect()
}

/// DTO for adding a catalog item.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateItem {
    pub slug: String,
    pub item_type: ItemType,
    /// Defaults to `common` if omitted.
    pub rarity: Option<String>,
    pub op: i32,
    pub dp: i32,
    pub icon: Option<String>,
}
