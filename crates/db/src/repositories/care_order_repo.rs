//! Repository for the `care_orders` table.

use bloblets_core::types::Timestamp;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::care_order::{CareOrder, ORDER_STATUS_CONSUMED, ORDER_STATUS_SETTLED};

/// Column list for `care_orders` queries.
const COLUMNS: &str = "id, address, status, consumed_at, created_at";

pub struct CareOrderRepo;

impl CareOrderRepo {
    /// Record a settled order for `address`. Settlement itself happens
    /// upstream; this only makes the order available to a nourish.
    pub async fn create_settled(
        conn: &mut PgConnection,
        address: &str,
    ) -> Result<CareOrder, sqlx::Error> {
        let query = format!(
            "INSERT INTO care_orders (id, address, status) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CareOrder>(&query)
            .bind(Uuid::now_v7())
            .bind(address)
            .bind(ORDER_STATUS_SETTLED)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Option<CareOrder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM care_orders WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, CareOrder>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Mark a settled order consumed. Returns `false` if it was not settled.
    pub async fn consume(
        conn: &mut PgConnection,
        id: Uuid,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE care_orders SET status = $2, consumed_at = $3 WHERE id = $1 AND status = $4",
        )
        .bind(id)
        .bind(ORDER_STATUS_CONSUMED)
        .bind(now)
        .bind(ORDER_STATUS_SETTLED)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
