//! Repository for the `loadouts` table.

use bloblets_core::gear::Loadout;
use sqlx::PgConnection;

use crate::models::loadout::LoadoutRow;

/// Column list for `loadouts` queries.
const COLUMNS: &str = "address, weapon_item_id, shield_item_id, updated_at";

pub struct LoadoutRepo;

impl LoadoutRepo {
    pub async fn find(conn: &mut PgConnection, address: &str) -> Result<Option<LoadoutRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM loadouts WHERE address = $1");
        sqlx::query_as::<_, LoadoutRow>(&query)
            .bind(address)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn lock(conn: &mut PgConnection, address: &str) -> Result<Option<LoadoutRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM loadouts WHERE address = $1 FOR UPDATE");
        sqlx::query_as::<_, LoadoutRow>(&query)
            .bind(address)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn save(
        conn: &mut PgConnection,
        address: &str,
        loadout: &Loadout,
    ) -> Result<LoadoutRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO loadouts (address, weapon_item_id, shield_item_id) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (address) DO UPDATE SET \
                weapon_item_id = EXCLUDED.weapon_item_id, \
                shield_item_id = EXCLUDED.shield_item_id, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LoadoutRow>(&query)
            .bind(address)
            .bind(loadout.weapon.as_ref().map(|item| item.id))
            .bind(loadout.shield.as_ref().map(|item| item.id))
            .fetch_one(&mut *conn)
            .await
    }
}
