//! Repository for `drop_telemetry`.

use bloblets_core::drop::DropAttempt;
use bloblets_core::types::Timestamp;
use sqlx::PgConnection;

use crate::models::telemetry::DropTelemetry;

/// Column list for `drop_telemetry` queries.
const COLUMNS: &str = "\
    id, address, source, probability, roll, acc_before, acc_after, outcome, item_id, created_at";

pub struct TelemetryRepo;

impl TelemetryRepo {
    /// Append one record per drop attempt.
    pub async fn record_attempts(
        conn: &mut PgConnection,
        address: &str,
        source: &str,
        attempts: &[DropAttempt],
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        for attempt in attempts {
            sqlx::query(
                "INSERT INTO drop_telemetry \
                    (address, source, probability, roll, acc_before, acc_after, outcome, item_id, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(address)
            .bind(source)
            .bind(attempt.probability)
            .bind(attempt.roll)
            .bind(attempt.acc_before)
            .bind(attempt.next_acc)
            .bind(attempt.outcome.as_str())
            .bind(attempt.item.as_ref().map(|item| item.id))
            .bind(now)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Telemetry for `address`, oldest first.
    pub async fn list_for(
        conn: &mut PgConnection,
        address: &str,
    ) -> Result<Vec<DropTelemetry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM drop_telemetry WHERE address = $1 ORDER BY id");
        sqlx::query_as::<_, DropTelemetry>(&query)
            .bind(address)
            .fetch_all(&mut *conn)
            .await
    }
}
