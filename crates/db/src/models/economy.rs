//! Point balances and the append-only ledger.

use bloblets_core::points::Points;
use bloblets_core::types::{Address, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Ledger reasons. Every balance change records one of these.
pub const REASON_CHARGE_COST: &str = "charge_cost";
pub const REASON_UPKEEP_REWARD: &str = "upkeep_reward";
pub const REASON_BATTLE_WIN: &str = "battle_win";
pub const REASON_BATTLE_LOSS: &str = "battle_loss";
pub const REASON_HOUSE_CUT: &str = "house_cut";
pub const REASON_GRANT: &str = "grant";

/// A row from the `reward_balances` table. `points` is in hundredths.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RewardBalance {
    pub address: Address,
    pub points: i64,
    pub updated_at: Timestamp,
}

impl RewardBalance {
    pub fn balance(&self) -> Points {
        Points::from_units(self.points)
    }
}

/// A row from the `reward_ledger` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LedgerEntry {
    pub id: DbId,
    pub address: Address,
    pub delta: i64,
    pub reason: String,
    pub reference: Option<String>,
    pub created_at: Timestamp,
}

impl LedgerEntry {
    pub fn amount(&self) -> Points {
        Points::from_units(self.delta)
    }
}
