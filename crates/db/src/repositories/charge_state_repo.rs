//! Repository for the `charge_states` table.

use bloblets_core::charge::ChargeState;
use sqlx::PgConnection;

use crate::models::charge_state::ChargeStateRow;

/// Column list for `charge_states` queries.
const COLUMNS: &str = "\
    address, last_charged_at, cooldown_ends_at, boosters_active_until, drop_acc, \
    fast_forward_debt_until, fast_forward_burst_day, fast_forward_bursts_used, \
    fast_forward_last_run_at, updated_at";

pub struct ChargeStateRepo;

impl ChargeStateRepo {
    pub async fn find(
        conn: &mut PgConnection,
        address: &str,
    ) -> Result<Option<ChargeStateRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM charge_states WHERE address = $1");
        sqlx::query_as::<_, ChargeStateRow>(&query)
            .bind(address)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn lock(
        conn: &mut PgConnection,
        address: &str,
    ) -> Result<Option<ChargeStateRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM charge_states WHERE address = $1 FOR UPDATE");
        sqlx::query_as::<_, ChargeStateRow>(&query)
            .bind(address)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Write the full state back. Inserts the row if it is missing.
    pub async fn save(
        conn: &mut PgConnection,
        address: &str,
        state: &ChargeState,
    ) -> Result<ChargeStateRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO charge_states \
                (address, last_charged_at, cooldown_ends_at, boosters_active_until, drop_acc, \
                 fast_forward_debt_until, fast_forward_burst_day, fast_forward_bursts_used, \
                 fast_forward_last_run_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (address) DO UPDATE SET \
                last_charged_at = EXCLUDED.last_charged_at, \
                cooldown_ends_at = EXCLUDED.cooldown_ends_at, \
                boosters_active_until = EXCLUDED.boosters_active_until, \
                drop_acc = EXCLUDED.drop_acc, \
                fast_forward_debt_until = EXCLUDED.fast_forward_debt_until, \
                fast_forward_burst_day = EXCLUDED.fast_forward_burst_day, \
                fast_forward_bursts_used = EXCLUDED.fast_forward_bursts_used, \
                fast_forward_last_run_at = EXCLUDED.fast_forward_last_run_at, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ChargeStateRow>(&query)
            .bind(address)
            .bind(state.last_charged_at)
            .bind(state.cooldown_ends_at)
            .bind(state.boosters_active_until)
            .bind(state.drop_acc.clamp(0.0, 1.0))
            .bind(state.fast_forward_debt_until)
            .bind(&state.fast_forward_burst_day)
            .bind(i32::try_from(state.fast_forward_bursts_used).unwrap_or(i32::MAX))
            .bind(state.fast_forward_last_run_at)
            .fetch_one(&mut *conn)
            .await
    }
}
