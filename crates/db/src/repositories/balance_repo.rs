//! Repository for `reward_balances` and the `reward_ledger`.
//!
//! Every balance change goes through [`BalanceRepo::apply_delta`], which
//! writes the new balance and its ledger entry in the caller's transaction.

use bloblets_core::points::Points;
use sqlx::PgConnection;

use crate::models::economy::{LedgerEntry, RewardBalance};

/// Column list for `reward_balances` queries.
const COLUMNS: &str = "address, points, updated_at";

/// Column list for `reward_ledger` queries.
const LEDGER_COLUMNS: &str = "id, address, delta, reason, reference, created_at";

pub struct BalanceRepo;

impl BalanceRepo {
    pub async fn find(
        conn: &mut PgConnection,
        address: &str,
    ) -> Result<Option<RewardBalance>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reward_balances WHERE address = $1");
        sqlx::query_as::<_, RewardBalance>(&query)
            .bind(address)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn lock(
        conn: &mut PgConnection,
        address: &str,
    ) -> Result<Option<RewardBalance>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reward_balances WHERE address = $1 FOR UPDATE");
        sqlx::query_as::<_, RewardBalance>(&query)
            .bind(address)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Add `delta` (may be negative) to the balance and append a ledger entry.
    ///
    /// Creates the balance row if it is missing. A zero delta writes nothing.
    /// The `points >= 0` check constraint rejects overdrafts.
    pub async fn apply_delta(
        conn: &mut PgConnection,
        address: &str,
        delta: Points,
        reason: &str,
        reference: Option<&str>,
    ) -> Result<Option<RewardBalance>, sqlx::Error> {
        if delta == Points::ZERO {
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO reward_balances (address, points) VALUES ($1, $2) \
             ON CONFLICT (address) DO UPDATE SET \
                points = reward_balances.points + EXCLUDED.points, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        let balance = sqlx::query_as::<_, RewardBalance>(&query)
            .bind(address)
            .bind(delta.units())
            .fetch_one(&mut *conn)
            .await?;

        sqlx::query(
            "INSERT INTO reward_ledger (address, delta, reason, reference) VALUES ($1, $2, $3, $4)",
        )
        .bind(address)
        .bind(delta.units())
        .bind(reason)
        .bind(reference)
        .execute(&mut *conn)
        .await?;

        Ok(Some(balance))
    }

    /// Ledger entries for `address`, newest first.
    pub async fn ledger(
        conn: &mut PgConnection,
        address: &str,
    ) -> Result<Vec<LedgerEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {LEDGER_COLUMNS} FROM reward_ledger WHERE address = $1 ORDER BY id DESC"
        );
        sqlx::query_as::<_, LedgerEntry>(&query)
            .bind(address)
            .fetch_all(&mut *conn)
            .await
    }
}
