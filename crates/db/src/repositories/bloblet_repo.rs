//! Repository for the `bloblets` table.

use bloblets_core::types::normalize_address;
use sqlx::{PgConnection, PgPool};

use crate::models::bloblet::Bloblet;

/// Column list for `bloblets` queries.
const COLUMNS: &str = "address, is_alive, created_at, updated_at";

pub struct BlobletRepo;

impl BlobletRepo {
    /// Register a new bloblet with an empty charge state, an empty loadout and
    /// a zero balance, all in one transaction.
    ///
    /// Registering an existing address is a no-op that returns the stored row.
    pub async fn register(pool: &PgPool, address: &str) -> Result<Bloblet, sqlx::Error> {
        let address = normalize_address(address);
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO bloblets (address) VALUES ($1) \
             ON CONFLICT (address) DO UPDATE SET updated_at = bloblets.updated_at \
             RETURNING {COLUMNS}"
        );
        let bloblet = sqlx::query_as::<_, Bloblet>(&query)
            .bind(&address)
            .fetch_one(&mut *tx)
            .await?;

        for table in ["charge_states", "loadouts", "reward_balances"] {
            let insert =
                format!("INSERT INTO {table} (address) VALUES ($1) ON CONFLICT (address) DO NOTHING");
            sqlx::query(&insert).bind(&address).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        tracing::debug!(address = %bloblet.address, "Registered bloblet");
        Ok(bloblet)
    }

    pub async fn find(conn: &mut PgConnection, address: &str) -> Result<Option<Bloblet>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bloblets WHERE address = $1");
        sqlx::query_as::<_, Bloblet>(&query)
            .bind(address)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Lock one bloblet row for the rest of the transaction.
    pub async fn lock(conn: &mut PgConnection, address: &str) -> Result<Option<Bloblet>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bloblets WHERE address = $1 FOR UPDATE");
        sqlx::query_as::<_, Bloblet>(&query)
            .bind(address)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Lock several bloblet rows in address order, so two requests locking
    /// the same pair never wait on each other in opposite orders.
    ///
    /// Missing addresses are simply absent from the result.
    pub async fn lock_many(
        conn: &mut PgConnection,
        addresses: &[&str],
    ) -> Result<Vec<Bloblet>, sqlx::Error> {
        let owned: Vec<String> = addresses.iter().map(|a| a.to_string()).collect();
        let query = format!(
            "SELECT {COLUMNS} FROM bloblets WHERE address = ANY($1) \
             ORDER BY address FOR UPDATE"
        );
        sqlx::query_as::<_, Bloblet>(&query)
            .bind(&owned)
            .fetch_all(&mut *conn)
            .await
    }

    pub async fn set_alive(
        conn: &mut PgConnection,
        address: &str,
        is_alive: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE bloblets SET is_alive = $2, updated_at = NOW() WHERE address = $1",
        )
        .bind(address)
        .bind(is_alive)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
