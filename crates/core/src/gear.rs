//! Gear catalog entries and loadouts.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

pub const ITEM_TYPE_WEAPON: &str = "weapon";
pub const ITEM_TYPE_SHIELD: &str = "shield";

/// All valid item type strings.
pub const VALID_ITEM_TYPES: &[&str] = &[ITEM_TYPE_WEAPON, ITEM_TYPE_SHIELD];

/// Equipment slot. Each item type fits exactly one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Weapon,
    Shield,
}

impl ItemType {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            ITEM_TYPE_WEAPON => Ok(Self::Weapon),
            ITEM_TYPE_SHIELD => Ok(Self::Shield),
            _ => Err(CoreError::Validation(format!(
                "Invalid item type '{s}'. Must be one of: {}",
                VALID_ITEM_TYPES.join(", ")
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weapon => ITEM_TYPE_WEAPON,
            Self::Shield => ITEM_TYPE_SHIELD,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Weapon => Self::Shield,
            Self::Shield => Self::Weapon,
        }
    }
}

/// Immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: DbId,
    pub slug: String,
    pub item_type: ItemType,
    pub rarity: String,
    /// Offensive power. Meaningful for weapons.
    pub op: i32,
    /// Defensive power. Meaningful for shields.
    pub dp: i32,
    pub icon: Option<String>,
}

impl Item {
    /// The stat that counts for this item's slot: `op` for weapons, `dp` for
    /// shields.
    pub fn slot_stat(&self) -> i32 {
        match self.item_type {
            ItemType::Weapon => self.op,
            ItemType::Shield => self.dp,
        }
    }

    /// Whether this item is strictly better than whatever occupies its slot.
    /// Anything beats an empty slot.
    pub fn beats(&self, current: Option<&Item>) -> bool {
        current.map_or(true, |c| self.slot_stat() > c.slot_stat())
    }
}

/// A character's equipped weapon and shield.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    pub weapon: Option<Item>,
    pub shield: Option<Item>,
}

impl Loadout {
    pub fn slot(&self, slot: ItemType) -> Option<&Item> {
        match slot {
            ItemType::Weapon => self.weapon.as_ref(),
            ItemType::Shield => self.shield.as_ref(),
        }
    }

    /// Stat of the item in `slot`, or 0 when empty.
    pub fn slot_stat(&self, slot: ItemType) -> i32 {
        self.slot(slot).map_or(0, Item::slot_stat)
    }

    /// Return a copy with `item` in `slot`, plus whatever it displaced.
    pub fn with_item(&self, slot: ItemType, item: Option<Item>) -> (Loadout, Option<Item>) {
        let mut next = self.clone();
        let displaced = match slot {
            ItemType::Weapon => std::mem::replace(&mut next.weapon, item),
            ItemType::Shield => std::mem::replace(&mut next.shield, item),
        };
        (next, displaced)
    }

    pub fn is_empty(&self) -> bool {
        self.weapon.is_none() && self.shield.is_none()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn weapon(id: DbId, op: i32) -> Item {
        Item {
            id,
            slug: format!("weapon-{id}"),
            item_type: ItemType::Weapon,
            rarity: "common".to_string(),
            op,
            dp: 0,
            icon: None,
        }
    }

    pub fn shield(id: DbId, dp: i32) -> Item {
        Item {
            id,
            slug: format!("shield-{id}"),
            item_type: ItemType::Shield,
            rarity: "common".to_string(),
            op: 0,
            dp,
            icon: None,
        }
    }
}
