//! Operator tool: apply migrations, seed the gear catalog, register bloblets
//! and grant points.
//!
//! ```text
//! bloblets-admin migrate
//! bloblets-admin seed-items <catalog.json>
//! bloblets-admin register <address>
//! bloblets-admin grant <address> <points>
//! bloblets-admin battles <address>
//! ```

use anyhow::{bail, Context};
use bloblets_core::points::Points;
use bloblets_db::models::economy::REASON_GRANT;
use bloblets_db::models::item::CreateItem;
use bloblets_db::repositories::{BalanceRepo, BattleRepo, BlobletRepo, ItemRepo};
use bloblets_service::{ServiceConfig, ServiceState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How many battles `battles` prints.
const RECENT_BATTLES: i64 = 20;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bloblets_service=info,bloblets_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let config = ServiceConfig::from_env().context("Invalid configuration")?;
    let state = ServiceState::connect(config).await?;

    match args.as_slice() {
        ["migrate"] => {
            // Applied by `connect`.
            tracing::info!("Database is up to date");
        }
        ["seed-items", path] => {
            let raw = std::fs::read_to_string(path).with_context(|| format!("Reading {path}"))?;
            let items: Vec<CreateItem> =
                serde_json::from_str(&raw).with_context(|| format!("Parsing {path}"))?;
            let rows = ItemRepo::seed(&state.pool, &items).await?;
            tracing::info!(count = rows.len(), "Seeded gear catalog");
        }
        ["register", address] => {
            let bloblet = BlobletRepo::register(&state.pool, address).await?;
            tracing::info!(address = %bloblet.address, "Bloblet registered");
        }
        ["grant", address, amount] => {
            let points = amount
                .parse::<f64>()
                .ok()
                .and_then(Points::from_f64)
                .with_context(|| format!("Invalid amount {amount}"))?;
            if !points.is_positive() {
                bail!("Grant amount must be positive");
            }
            let address = bloblets_core::types::normalize_address(address);
            let mut tx = state.pool.begin().await?;
            let balance = BalanceRepo::apply_delta(&mut tx, &address, points, REASON_GRANT, None).await?;
            tx.commit().await?;
            tracing::info!(
                %address,
                granted = %points,
                balance = %balance.map_or(points, |b| b.balance()),
                "Points granted",
            );
        }
        ["battles", address] => {
            let address = bloblets_core::types::normalize_address(address);
            let mut conn = state.pool.acquire().await?;
            let history = BattleRepo::list_for(&mut conn, &address, RECENT_BATTLES).await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        _ => bail!(
            "usage: bloblets-admin <migrate | seed-items FILE | register ADDRESS | grant ADDRESS POINTS | battles ADDRESS>"
        ),
    }

    Ok(())
}
