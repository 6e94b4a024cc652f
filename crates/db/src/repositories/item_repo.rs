//! Repository for the `items` catalog.

use bloblets_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::item::{CreateItem, ItemRow};

/// Column list for `items` queries.
const COLUMNS: &str = "id, slug, item_type, rarity, op, dp, icon, created_at";

/// Rarity assigned when the create DTO leaves it out.
const DEFAULT_RARITY: &str = "common";

pub struct ItemRepo;

impl ItemRepo {
    /// Insert a catalog item, or overwrite every catalog column of an
    /// existing slug.
    pub async fn upsert(conn: &mut PgConnection, input: &CreateItem) -> Result<ItemRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO items (slug, item_type, rarity, op, dp, icon) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (slug) DO UPDATE SET \
                item_type = EXCLUDED.item_type, rarity = EXCLUDED.rarity, \
                op = EXCLUDED.op, dp = EXCLUDED.dp, icon = EXCLUDED.icon \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ItemRow>(&query)
            .bind(&input.slug)
            .bind(input.item_type.as_str())
            .bind(input.rarity.as_deref().unwrap_or(DEFAULT_RARITY))
            .bind(input.op)
            .bind(input.dp)
            .bind(&input.icon)
            .fetch_one(&mut *conn)
            .await
    }

    /// Upsert several items in one transaction.
    pub async fn seed(pool: &PgPool, items: &[CreateItem]) -> Result<Vec<ItemRow>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut rows = Vec::with_capacity(items.len());
        for input in items {
            rows.push(Self::upsert(&mut tx, input).await?);
        }
        tx.commit().await?;
        Ok(rows)
    }

    /// The whole catalog, ordered by id.
    pub async fn catalog(conn: &mut PgConnection) -> Result<Vec<ItemRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM items ORDER BY id");
        sqlx::query_as::<_, ItemRow>(&query)
            .fetch_all(&mut *conn)
            .await
    }

    pub async fn find_many(
        conn: &mut PgConnection,
        ids: &[DbId],
    ) -> Result<Vec<ItemRow>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("SELECT {COLUMNS} FROM items WHERE id = ANY($1) ORDER BY id");
        sqlx::query_as::<_, ItemRow>(&query)
            .bind(ids)
            .fetch_all(&mut *conn)
            .await
    }
}
