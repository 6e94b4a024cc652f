//! Repository for banked gear (`gear_stash`) and the newcomer check.

use bloblets_core::types::DbId;
use sqlx::PgConnection;

pub const STASH_SOURCE_DROP: &str = "drop_displaced";
pub const STASH_SOURCE_LOOT: &str = "battle_loot";
pub const STASH_SOURCE_LOOT_DISPLACED: &str = "battle_displaced";

pub struct GearRepo;

impl GearRepo {
    /// Bank an unequipped item for `address`.
    pub async fn stash(
        conn: &mut PgConnection,
        address: &str,
        item_id: DbId,
        source: &str,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO gear_stash (address, item_id, source) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(address)
        .bind(item_id)
        .bind(source)
        .fetch_one(&mut *conn)
        .await
    }

    /// Item ids banked for `address`, oldest first.
    pub async fn stashed_item_ids(
        conn: &mut PgConnection,
        address: &str,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT item_id FROM gear_stash WHERE address = $1 ORDER BY id",
        )
        .bind(address)
        .fetch_all(&mut *conn)
        .await
    }

    /// A newcomer has no equipped weapon, no equipped shield and an empty
    /// stash. Unknown addresses are not newcomers.
    pub async fn is_newcomer(conn: &mut PgConnection, address: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
                 SELECT 1 FROM loadouts l \
                 WHERE l.address = $1 \
                   AND l.weapon_item_id IS NULL \
                   AND l.shield_item_id IS NULL \
                   AND NOT EXISTS (SELECT 1 FROM gear_stash s WHERE s.address = l.address) \
             )",
        )
        .bind(address)
        .fetch_one(&mut *conn)
        .await
    }
}
