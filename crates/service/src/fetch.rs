//! Fetch-under-lock stage shared by the orchestrators.
//!
//! Callers lock the `bloblets` row first; everything here then locks the
//! dependent rows of that bloblet in a fixed table order (charge state,
//! loadout, balance) so concurrent requests always queue in the same order.

use bloblets_core::charge::{derive_status, ChargeState, ChargeStatus, FastForwardContext};
use bloblets_core::error::CoreError;
use bloblets_core::gear::Loadout;
use bloblets_core::points::Points;
use bloblets_core::types::Timestamp;
use bloblets_db::models::bloblet::Bloblet;
use bloblets_db::models::item::into_items;
use bloblets_db::repositories::{BalanceRepo, ChargeStateRepo, GearRepo, ItemRepo, LoadoutRepo};
use sqlx::PgConnection;

use crate::config::ServiceConfig;

/// A bloblet's mutable rows, read under lock.
#[derive(Debug, Clone)]
pub(crate) struct LockedBloblet {
    pub bloblet: Bloblet,
    pub state: ChargeState,
    pub loadout: Loadout,
    pub balance: Points,
    pub is_newcomer: bool,
}

impl LockedBloblet {
    pub fn address(&self) -> &str {
        &self.bloblet.address
    }

    pub fn status(&self, now: Timestamp, config: &ServiceConfig) -> ChargeStatus {
        charge_status(&self.state, now, self.is_newcomer, config)
    }
}

/// Lock and load the rows of an already locked bloblet.
pub(crate) async fn lock_rows<E>(
    conn: &mut PgConnection,
    bloblet: Bloblet,
) -> Result<LockedBloblet, E>
where
    E: From<sqlx::Error> + From<CoreError>,
{
    let address = bloblet.address.clone();

    let state = match ChargeStateRepo::lock(conn, &address).await? {
        Some(row) => ChargeState::try_from(row)?,
        None => ChargeState::default(),
    };

    let loadout = match LoadoutRepo::lock(conn, &address).await? {
        Some(row) => {
            let items = into_items(ItemRepo::find_many(conn, &row.item_ids()).await?)?;
            row.resolve(&items)?
        }
        None => Loadout::default(),
    };

    let balance = BalanceRepo::lock(conn, &address)
        .await?
        .map_or(Points::ZERO, |row| row.balance());

    let is_newcomer = GearRepo::is_newcomer(conn, &address).await?;

    Ok(LockedBloblet {
        bloblet,
        state,
        loadout,
        balance,
        is_newcomer,
    })
}

/// Charge status under the configured fast-forward rules.
pub(crate) fn charge_status(
    state: &ChargeState,
    now: Timestamp,
    is_newcomer: bool,
    config: &ServiceConfig,
) -> ChargeStatus {
    let ff = FastForwardContext {
        enabled: config.fast_forward.enabled,
        is_newcomer,
        daily_bursts: config.fast_forward.daily_bursts,
    };
    derive_status(state, now, &ff, &config.charge)
}
