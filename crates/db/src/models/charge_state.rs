//! Persisted charge timers for a bloblet.

use bloblets_core::charge::ChargeState;
use bloblets_core::error::CoreError;
use bloblets_core::types::{Address, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `charge_states` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChargeStateRow {
    pub address: Address,
    pub last_charged_at: Option<Timestamp>,
    pub cooldown_ends_at: Option<Timestamp>,
    pub boosters_active_until: Option<Timestamp>,
    pub drop_acc: f64,
    pub fast_forward_debt_until: Option<Timestamp>,
    pub fast_forward_burst_day: Option<String>,
    pub fast_forward_bursts_used: i32,
    pub fast_forward_last_run_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl TryFrom<ChargeStateRow> for ChargeState {
    type Error = CoreError;

    fn try_from(row: ChargeStateRow) -> Result<Self, Self::Error> {
        let bursts_used = u32::try_from(row.fast_forward_bursts_used).map_err(|_| {
            CoreError::Corrupt(format!(
                "charge state for {} has negative burst count {}",
                row.address, row.fast_forward_bursts_used
            ))
        })?;
        Ok(ChargeState {
            last_charged_at: row.last_charged_at,
            cooldown_ends_at: row.cooldown_ends_at,
            boosters_active_until: row.boosters_active_until,
            drop_acc: row.drop_acc.clamp(0.0, 1.0),
            fast_forward_debt_until: row.fast_forward_debt_until,
            fast_forward_burst_day: row.fast_forward_burst_day,
            fast_forward_bursts_used: bursts_used,
            fast_forward_last_run_at: row.fast_forward_last_run_at,
        })
    }
}
