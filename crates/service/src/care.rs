//! Care orchestrator: status, nourish and fast-forward.
//!
//! Every mutating operation runs in one transaction: lock the bloblet and its
//! rows, run the pure rules, write the results, commit. Domain errors return
//! before the first write and the dropped transaction rolls back.

use bloblets_core::charge::{self, blocking_cooldown, ChargeState, ChargeStatus};
use bloblets_core::drop::{apply_drop, attempt_drop, DropAttempt};
use bloblets_core::fast_forward::{run_burst, BurstInput, BurstOutcome, BurstRules};
use bloblets_core::gear::{Item, Loadout};
use bloblets_core::points::Points;
use bloblets_core::rng::RandomSource;
use bloblets_core::types::{normalize_address, Address, Timestamp};
use bloblets_db::models::economy::{REASON_CHARGE_COST, REASON_UPKEEP_REWARD};
use bloblets_db::models::item::into_items;
use bloblets_db::models::telemetry::{SOURCE_FAST_FORWARD, SOURCE_NOURISH};
use bloblets_db::repositories::gear_repo::STASH_SOURCE_DROP;
use bloblets_db::repositories::{
    BalanceRepo, BlobletRepo, CareOrderRepo, ChargeStateRepo, GearRepo, ItemRepo, LoadoutRepo,
    TelemetryRepo,
};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::CareError;
use crate::fetch::{charge_status, lock_rows, LockedBloblet};
use crate::state::ServiceState;

/// How a nourish is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "method", content = "order_id", rename_all = "snake_case")]
pub enum Payment {
    /// Debit the charge cost from the bloblet's point balance.
    Points,
    /// Consume a settled care order.
    Order(Uuid),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NourishRequest {
    pub address: String,
    pub payment: Payment,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FastForwardRequest {
    pub address: String,
    pub max_attempts: u32,
}

/// Read-only view for display.
#[derive(Debug, Clone, Serialize)]
pub struct CareStatus {
    pub address: Address,
    pub alive: bool,
    pub balance: Points,
    pub charge: ChargeStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct NourishOutcome {
    pub address: Address,
    pub attempt: DropAttempt,
    pub loadout: Loadout,
    pub displaced: Option<Item>,
    pub cost: Points,
    pub reward: Points,
    pub balance: Points,
    pub status: ChargeStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct FastForwardOutcome {
    pub address: Address,
    pub burst: BurstOutcome,
    pub balance: Points,
    pub status: ChargeStatus,
}

#[derive(Clone)]
pub struct CareService {
    state: ServiceState,
}

impl CareService {
    pub fn new(state: ServiceState) -> Self {
        Self { state }
    }

    /// Current charge status of a bloblet. Takes no locks.
    #[tracing::instrument(skip(self))]
    pub async fn status(&self, address: &str, now: Timestamp) -> Result<CareStatus, CareError> {
        let address = normalize_address(address);
        let mut conn = self.state.pool.acquire().await?;

        let bloblet = BlobletRepo::find(&mut conn, &address)
            .await?
            .ok_or_else(|| CareError::BlobletNotFound(address.clone()))?;
        let state = match ChargeStateRepo::find(&mut conn, &address).await? {
            Some(row) => ChargeState::try_from(row)?,
            None => ChargeState::default(),
        };
        let is_newcomer = GearRepo::is_newcomer(&mut conn, &address).await?;
        let balance = BalanceRepo::find(&mut conn, &address)
            .await?
            .map_or(Points::ZERO, |row| row.balance());

        Ok(CareStatus {
            charge: charge_status(&state, now, is_newcomer, &self.state.config),
            address,
            alive: bloblet.is_alive,
            balance,
        })
    }

    /// Charge once: reset the cooldown, refresh boosters and roll for a drop.
    #[tracing::instrument(skip(self, rng), fields(address = %request.address))]
    pub async fn nourish<R>(
        &self,
        request: &NourishRequest,
        now: Timestamp,
        rng: &mut R,
    ) -> Result<NourishOutcome, CareError>
    where
        R: RandomSource + Send + ?Sized,
    {
        let config = &self.state.config;
        let pricing = config.effective_pricing();
        let address = normalize_address(&request.address);
        let mut tx = self.state.pool.begin().await?;

        // 1. Fetch under lock.
        let locked = lock_bloblet(&mut tx, &address).await?;
        if let Some(cooldown_until) = blocking_cooldown(&locked.state, now) {
            tracing::warn!(%address, %cooldown_until, "Nourish rejected: cooldown");
            return Err(CareError::ChargeCooldown { cooldown_until });
        }
        match request.payment {
            Payment::Points => {
                if locked.balance < pricing.charge_cost {
                    return Err(CareError::PaymentRequired {
                        required: pricing.charge_cost,
                        balance: locked.balance,
                    });
                }
            }
            Payment::Order(order_id) => {
                let order = CareOrderRepo::lock(&mut tx, order_id)
                    .await?
                    .filter(|order| order.address == address)
                    .ok_or(CareError::OrderMissing(order_id))?;
                if order.is_consumed() {
                    return Err(CareError::OrderConflict(order_id));
                }
            }
        }
        let catalog = into_items(ItemRepo::catalog(&mut tx).await?)?;

        // 2. Resolve.
        let attempt = attempt_drop(
            &locked.loadout,
            &catalog,
            locked.state.drop_acc,
            &config.drop,
            rng,
        );
        let (loadout, displaced) = apply_drop(&locked.loadout, &attempt);
        let mut next_state = charge::advance(now, &locked.state, &config.charge);
        next_state.drop_acc = attempt.next_acc;

        // Order payments are settled upstream; only points are debited here.
        let cost = match request.payment {
            Payment::Points => pricing.charge_cost,
            Payment::Order(_) => Points::ZERO,
        };
        let reward = pricing.upkeep_reward;

        // 3. Persist.
        ChargeStateRepo::save(&mut tx, &address, &next_state).await?;
        if attempt.awarded {
            LoadoutRepo::save(&mut tx, &address, &loadout).await?;
            if let Some(old) = displaced.as_ref().filter(|_| config.economy.bank_displaced_gear) {
                GearRepo::stash(&mut tx, &address, old.id, STASH_SOURCE_DROP).await?;
            }
        }
        let reference = match request.payment {
            Payment::Points => None,
            Payment::Order(order_id) => {
                if !CareOrderRepo::consume(&mut tx, order_id, now).await? {
                    return Err(CareError::OrderConflict(order_id));
                }
                Some(format!("order:{order_id}"))
            }
        };
        BalanceRepo::apply_delta(
            &mut tx,
            &address,
            -cost,
            REASON_CHARGE_COST,
            reference.as_deref(),
        )
        .await?;
        BalanceRepo::apply_delta(&mut tx, &address, reward, REASON_UPKEEP_REWARD, reference.as_deref())
            .await?;
        TelemetryRepo::record_attempts(&mut tx, &address, SOURCE_NOURISH, std::slice::from_ref(&attempt), now)
            .await?;

        tx.commit().await?;

        let balance = locked.balance - cost + reward;
        tracing::info!(
            %address,
            outcome = attempt.outcome.as_str(),
            roll = attempt.roll,
            next_acc = attempt.next_acc,
            item_id = attempt.item.as_ref().map(|i| i.id),
            "Nourished",
        );

        Ok(NourishOutcome {
            status: charge_status(&next_state, now, locked.is_newcomer && loadout.is_empty(), config),
            address,
            attempt,
            loadout,
            displaced,
            cost,
            reward,
            balance,
        })
    }

    /// Run a fast-forward burst.
    #[tracing::instrument(skip(self, rng), fields(address = %request.address, max_attempts = request.max_attempts))]
    pub async fn fast_forward<R>(
        &self,
        request: &FastForwardRequest,
        now: Timestamp,
        rng: &mut R,
    ) -> Result<FastForwardOutcome, CareError>
    where
        R: RandomSource + Send + ?Sized,
    {
        let config = &self.state.config;
        let pricing = config.effective_pricing();
        let address = normalize_address(&request.address);
        let mut tx = self.state.pool.begin().await?;

        // 1. Fetch under lock.
        let locked = lock_bloblet(&mut tx, &address).await?;
        let catalog = into_items(ItemRepo::catalog(&mut tx).await?)?;

        // 2. Resolve. Rejections happen before any write.
        let input = BurstInput {
            state: &locked.state,
            loadout: &locked.loadout,
            catalog: &catalog,
            balance: locked.balance,
            is_newcomer: locked.is_newcomer,
            max_attempts: request.max_attempts,
        };
        let rules = BurstRules {
            fast_forward: &config.fast_forward,
            charge: &config.charge,
            drop: &config.drop,
            pricing: &pricing,
        };
        let burst = run_burst(&input, now, &rules, rng).map_err(|rejection| {
            tracing::warn!(%address, %rejection, "Fast-forward rejected");
            CareError::from(rejection)
        })?;

        // 3. Persist.
        ChargeStateRepo::save(&mut tx, &address, &burst.next_state).await?;
        if burst.awarded().is_some() {
            LoadoutRepo::save(&mut tx, &address, &burst.loadout).await?;
            if let Some(old) = burst.displaced.as_ref().filter(|_| config.economy.bank_displaced_gear) {
                GearRepo::stash(&mut tx, &address, old.id, STASH_SOURCE_DROP).await?;
            }
        }
        bill_attempts(&mut tx, &address, burst.attempts_used(), pricing.charge_cost, pricing.upkeep_reward)
            .await?;
        TelemetryRepo::record_attempts(&mut tx, &address, SOURCE_FAST_FORWARD, &burst.attempts, now)
            .await?;

        tx.commit().await?;

        let balance = locked.balance - burst.total_cost + burst.total_reward;
        tracing::info!(
            %address,
            attempts = burst.attempts_used(),
            stop_reason = ?burst.stop_reason,
            debt_until = %burst.debt_until,
            "Fast-forward burst complete",
        );

        let status = charge_status(
            &burst.next_state,
            now,
            locked.is_newcomer && burst.loadout.is_empty(),
            config,
        );
        Ok(FastForwardOutcome {
            address,
            burst,
            balance,
            status,
        })
    }
}

/// Lock the bloblet row, then its dependent rows.
async fn lock_bloblet(conn: &mut PgConnection, address: &str) -> Result<LockedBloblet, CareError> {
    let bloblet = BlobletRepo::lock(conn, address)
        .await?
        .ok_or_else(|| CareError::BlobletNotFound(address.to_string()))?;
    lock_rows(conn, bloblet).await
}

/// One debit and one credit per attempt, so the ledger shows every attempt
/// was billed.
async fn bill_attempts(
    conn: &mut PgConnection,
    address: &str,
    attempts: u32,
    cost: Points,
    reward: Points,
) -> Result<(), sqlx::Error> {
    for n in 1..=attempts {
        let reference = format!("fast_forward:{n}/{attempts}");
        BalanceRepo::apply_delta(conn, address, -cost, REASON_CHARGE_COST, Some(&reference))
            .await?;
        BalanceRepo::apply_delta(conn, address, reward, REASON_UPKEEP_REWARD, Some(&reference)).await?;
    }
    Ok(())
}
