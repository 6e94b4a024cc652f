//! Equipped gear per bloblet.

use bloblets_core::error::CoreError;
use bloblets_core::gear::{Item, ItemType, Loadout};
use bloblets_core::types::{Address, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `loadouts` table. Item ids only; see [`LoadoutRow::resolve`].
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LoadoutRow {
    pub address: Address,
    pub weapon_item_id: Option<DbId>,
    pub shield_item_id: Option<DbId>,
    pub updated_at: Timestamp,
}

impl LoadoutRow {
    /// Ids of every equipped item.
    pub fn item_ids(&self) -> Vec<DbId> {
        self.weapon_item_id
            .into_iter()
            .chain(self.shield_item_id)
            .collect()
    }

    /// Build the domain loadout by looking the equipped ids up in `items`.
    pub fn resolve(&self, items: &[Item]) -> Result<Loadout, CoreError> {
        Ok(Loadout {
            weapon: self.lookup(self.weapon_item_id, ItemType::Weapon, items)?,
            shield: self.lookup(self.shield_item_id, ItemType::Shield, items)?,
        })
    }

    fn lookup(
        &self,
        id: Option<DbId>,
        slot: ItemType,
        items: &[Item],
    ) -> Result<Option<Item>, CoreError> {
        let Some(id) = id else {
            return Ok(None);
        };
        let item = items.iter().find(|item| item.id == id).ok_or_else(|| {
            CoreError::Corrupt(format!("{} equips unknown item {id}", self.address))
        })?;
        if item.item_type != slot {
            return Err(CoreError::Corrupt(format!(
                "{} has {} item {id} in its {} slot",
                self.address,
                item.item_type.as_str(),
                slot.as_str()
            )));
        }
        Ok(Some(item.clone()))
    }
}
