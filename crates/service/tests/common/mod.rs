//! Shared helpers for the orchestrator integration tests.

#![allow(dead_code)]

use bloblets_core::gear::{Item, ItemType, Loadout};
use bloblets_core::points::Points;
use bloblets_core::types::Timestamp;
use bloblets_db::models::economy::REASON_GRANT;
use bloblets_db::models::item::{into_items, CreateItem};
use bloblets_db::repositories::{BalanceRepo, BlobletRepo, ItemRepo, LoadoutRepo};
use bloblets_service::{ServiceConfig, ServiceState};
use chrono::{TimeZone, Utc};
use sqlx::PgPool;

pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Default configuration with a placeholder database URL; tests get their
/// pool from `#[sqlx::test]`.
pub fn config() -> ServiceConfig {
    ServiceConfig::from_lookup(|name| {
        (name == "DATABASE_URL").then(|| "postgres://unused".to_string())
    })
    .unwrap()
}

pub fn state(pool: &PgPool, config: ServiceConfig) -> ServiceState {
    ServiceState::new(pool.clone(), config)
}

/// Register `address` and grant it `points` whole points.
pub async fn bloblet(pool: &PgPool, address: &str, points: i64) {
    BlobletRepo::register(pool, address).await.unwrap();
    if points > 0 {
        let mut conn = pool.acquire().await.unwrap();
        BalanceRepo::apply_delta(&mut conn, address, Points::whole(points), REASON_GRANT, None)
            .await
            .unwrap();
    }
}

pub async fn balance(pool: &PgPool, address: &str) -> Points {
    let mut conn = pool.acquire().await.unwrap();
    BalanceRepo::find(&mut conn, address)
        .await
        .unwrap()
        .map_or(Points::ZERO, |row| row.balance())
}

pub async fn seed(pool: &PgPool, items: &[(&str, ItemType, i32)]) -> Vec<Item> {
    let input: Vec<CreateItem> = items
        .iter()
        .map(|(slug, item_type, stat)| CreateItem {
            slug: slug.to_string(),
            item_type: *item_type,
            rarity: None,
            op: if *item_type == ItemType::Weapon { *stat } else { 0 },
            dp: if *item_type == ItemType::Shield { *stat } else { 0 },
            icon: None,
        })
        .collect();
    into_items(ItemRepo::seed(pool, &input).await.unwrap()).unwrap()
}

pub async fn equip(pool: &PgPool, address: &str, loadout: &Loadout) {
    let mut conn = pool.acquire().await.unwrap();
    LoadoutRepo::save(&mut conn, address, loadout).await.unwrap();
}
