//! Repository for directional pair cooldowns (`battle_cooldowns`).

use bloblets_core::types::Timestamp;
use sqlx::PgConnection;

use crate::models::battle::BattleCooldown;

/// Column list for `battle_cooldowns` queries.
const COLUMNS: &str = "attacker, defender, next_allowed_at";

pub struct CooldownRepo;

impl CooldownRepo {
    /// Lock the cooldown rows of a pair in both directions, in key order.
    pub async fn lock_pair(
        conn: &mut PgConnection,
        a: &str,
        b: &str,
    ) -> Result<Vec<BattleCooldown>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM battle_cooldowns \
             WHERE (attacker = $1 AND defender = $2) OR (attacker = $2 AND defender = $1) \
             ORDER BY attacker, defender FOR UPDATE"
        );
        sqlx::query_as::<_, BattleCooldown>(&query)
            .bind(a)
            .bind(b)
            .fetch_all(&mut *conn)
            .await
    }

    /// Set `next_allowed_at` for both directions of the pair.
    pub async fn upsert_pair(
        conn: &mut PgConnection,
        a: &str,
        b: &str,
        next_allowed_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO battle_cooldowns (attacker, defender, next_allowed_at) \
             VALUES ($1, $2, $3), ($2, $1, $3) \
             ON CONFLICT (attacker, defender) DO UPDATE SET \
                next_allowed_at = EXCLUDED.next_allowed_at",
        )
        .bind(a)
        .bind(b)
        .bind(next_allowed_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

/// The cooldown blocking `attacker` from challenging `defender`, if any row
/// exists for that direction.
pub fn directional(rows: &[BattleCooldown], attacker: &str, defender: &str) -> Option<Timestamp> {
    rows.iter()
        .find(|row| row.attacker == attacker && row.defender == defender)
        .map(|row| row.next_allowed_at)
}
