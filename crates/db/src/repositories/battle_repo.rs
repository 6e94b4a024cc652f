//! Repository for the append-only `battles` table.

use bloblets_core::types::{DbId, Timestamp};
use sqlx::PgConnection;

use crate::models::battle::{BattleRecord, NewBattle};

/// Column list for `battles` queries.
const COLUMNS: &str = "\
    id, attacker, defender, winner, loser, critical, \
    transfer_points, house_points, outcome, created_at";

/// Maximum page size for battle history.
const MAX_LIMIT: i64 = 100;

pub struct BattleRepo;

impl BattleRepo {
    pub async fn insert(conn: &mut PgConnection, input: &NewBattle<'_>) -> Result<BattleRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO battles \
                (attacker, defender, winner, loser, critical, transfer_points, house_points, \
                 outcome, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BattleRecord>(&query)
            .bind(input.attacker)
            .bind(input.defender)
            .bind(input.winner)
            .bind(input.loser)
            .bind(input.critical)
            .bind(input.transfer_points)
            .bind(input.house_points)
            .bind(&input.outcome)
            .bind(input.created_at)
            .fetch_one(&mut *conn)
            .await
    }

    /// Battles between `a` and `b`, in either direction, since `since`.
    pub async fn count_pair_since(
        conn: &mut PgConnection,
        a: &str,
        b: &str,
        since: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM battles \
             WHERE ((attacker = $1 AND defender = $2) OR (attacker = $2 AND defender = $1)) \
               AND created_at >= $3",
        )
        .bind(a)
        .bind(b)
        .bind(since)
        .fetch_one(&mut *conn)
        .await
    }

    /// When `address` last lost a battle.
    pub async fn last_loss_at(
        conn: &mut PgConnection,
        address: &str,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<Timestamp>>(
            "SELECT MAX(created_at) FROM battles WHERE loser = $1",
        )
        .bind(address)
        .fetch_one(&mut *conn)
        .await
    }

    /// Recent battles involving `address`, newest first.
    pub async fn list_for(
        conn: &mut PgConnection,
        address: &str,
        limit: i64,
    ) -> Result<Vec<BattleRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM battles WHERE attacker = $1 OR defender = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        sqlx::query_as::<_, BattleRecord>(&query)
            .bind(address)
            .bind(limit.clamp(1, MAX_LIMIT))
            .fetch_all(&mut *conn)
            .await
    }

    pub async fn find(conn: &mut PgConnection, id: DbId) -> Result<Option<BattleRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM battles WHERE id = $1");
        sqlx::query_as::<_, BattleRecord>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }
}
