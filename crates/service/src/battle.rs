//! Battle orchestrator.
//!
//! A challenge locks both bloblets in address order, checks the pair windows
//! and eligibility, resolves the fight with the pure engine and writes every
//! consequence (loadouts, stash, ledger, cooldowns, battle record) in the same
//! transaction.

use bloblets_core::battle::{resolve, BattleContext, BattleOutcome, ParticipantState, Side};
use bloblets_core::eligibility::{check_pair_windows, evaluate};
use bloblets_core::rng::RandomSource;
use bloblets_core::types::{normalize_address, DbId, Timestamp};
use bloblets_db::models::battle::NewBattle;
use bloblets_db::models::economy::{REASON_BATTLE_LOSS, REASON_BATTLE_WIN, REASON_HOUSE_CUT};
use bloblets_db::repositories::cooldown_repo::directional;
use bloblets_db::repositories::gear_repo::{STASH_SOURCE_LOOT, STASH_SOURCE_LOOT_DISPLACED};
use bloblets_db::repositories::{
    BalanceRepo, BattleRepo, BlobletRepo, CooldownRepo, GearRepo, LoadoutRepo,
};
use chrono::Duration;
use serde::Serialize;
use sqlx::PgConnection;

use crate::config::ServiceConfig;
use crate::error::BattleError;
use crate::fetch::{lock_rows, LockedBloblet};
use crate::state::ServiceState;

/// Window over which pair battles count toward the anti-farm surcharge.
const ANTI_FARM_WINDOW_SECS: i64 = 3600;

/// A committed battle.
#[derive(Debug, Clone, Serialize)]
pub struct BattleReport {
    pub battle_id: DbId,
    pub outcome: BattleOutcome,
}

#[derive(Clone)]
pub struct BattleService {
    state: ServiceState,
}

impl BattleService {
    pub fn new(state: ServiceState) -> Self {
        Self { state }
    }

    /// `attacker` challenges `defender`.
    #[tracing::instrument(skip(self, rng))]
    pub async fn challenge<R>(
        &self,
        attacker: &str,
        defender: &str,
        now: Timestamp,
        rng: &mut R,
    ) -> Result<BattleReport, BattleError>
    where
        R: RandomSource + Send + ?Sized,
    {
        let config = &self.state.config;
        let battle_config = config.effective_battle();
        let attacker = normalize_address(attacker);
        let defender = normalize_address(defender);
        if attacker == defender {
            return Err(BattleError::SelfTarget);
        }

        let mut tx = self.state.pool.begin().await?;

        // 1. Fetch under lock.
        let (attacker_rows, defender_rows) = lock_pair(&mut tx, &attacker, &defender).await?;

        let cooldowns = CooldownRepo::lock_pair(&mut tx, &attacker, &defender).await?;
        let last_loss = BattleRepo::last_loss_at(&mut tx, &defender).await?;
        check_pair_windows(
            now,
            directional(&cooldowns, &attacker, &defender),
            last_loss,
            battle_config.defender_grace,
        )
        .into_result()
        .inspect_err(|blocker| {
            tracing::warn!(%attacker, %defender, code = blocker.code.as_str(), "Challenge blocked");
        })?;

        let attacker_state = participant(&attacker_rows, now, config);
        let defender_state = participant(&defender_rows, now, config);
        evaluate(&attacker_state, &defender_state, battle_config.min_stake)
            .into_result()
            .inspect_err(|blocker| {
                tracing::warn!(%attacker, %defender, code = blocker.code.as_str(), "Challenge blocked");
            })?;

        let since = now - Duration::seconds(ANTI_FARM_WINDOW_SECS);
        let recent = BattleRepo::count_pair_since(&mut tx, &attacker, &defender, since).await?;

        // 2. Resolve.
        let ctx = BattleContext {
            attacker: &attacker_state,
            defender: &defender_state,
            config: &battle_config,
            now,
            recent_pair_battles: u32::try_from(recent).unwrap_or(u32::MAX),
        };
        let outcome = resolve(&ctx, rng);
        tracing::debug!(
            attacker_roll = outcome.attacker.roll,
            defender_roll = outcome.defender.roll,
            critical = outcome.critical,
            "Battle resolved",
        );

        // 3. Persist.
        let battle_id = persist(&mut tx, &outcome, now, config).await?;
        tx.commit().await?;

        tracing::info!(
            battle_id,
            %attacker,
            %defender,
            winner = outcome.winner.as_str(),
            transfer = %outcome.transfer.transfer,
            house = %outcome.transfer.house,
            loot = outcome.loot.len(),
            "Battle committed",
        );

        Ok(BattleReport { battle_id, outcome })
    }
}

/// Lock both bloblets (one statement, address order), then each one's rows
/// in the same order.
async fn lock_pair(
    conn: &mut PgConnection,
    attacker: &str,
    defender: &str,
) -> Result<(LockedBloblet, LockedBloblet), BattleError> {
    let mut bloblets = BlobletRepo::lock_many(conn, &[attacker, defender]).await?;

    let defender_idx = bloblets.iter().position(|b| b.address == defender);
    let attacker_idx = bloblets.iter().position(|b| b.address == attacker);
    let (Some(attacker_idx), Some(defender_idx)) = (attacker_idx, defender_idx) else {
        return Err(match attacker_idx {
            None => BattleError::BlobletNotFound(attacker.to_string()),
            Some(_) => BattleError::DefenderMissing(defender.to_string()),
        });
    };

    // Remove the higher index first so the lower one stays valid.
    let (first_idx, second_idx) = (attacker_idx.min(defender_idx), attacker_idx.max(defender_idx));
    let second = bloblets.swap_remove(second_idx);
    let first = bloblets.swap_remove(first_idx);

    let first = lock_rows::<BattleError>(conn, first).await?;
    let second = lock_rows::<BattleError>(conn, second).await?;

    if first.address() == attacker {
        Ok((first, second))
    } else {
        Ok((second, first))
    }
}

fn participant(rows: &LockedBloblet, now: Timestamp, config: &ServiceConfig) -> ParticipantState {
    let charge_status = rows.status(now, config);
    ParticipantState {
        address: rows.bloblet.address.clone(),
        alive: rows.bloblet.is_alive,
        points: rows.balance,
        booster_level: charge_status.booster_level,
        charge_status,
        loadout: rows.loadout.clone(),
    }
}

/// Write every consequence of `outcome`. Returns the battle record id.
async fn persist(
    conn: &mut PgConnection,
    outcome: &BattleOutcome,
    now: Timestamp,
    config: &ServiceConfig,
) -> Result<DbId, BattleError> {
    let winner = outcome.winner_outcome();
    let loser = outcome.loser_outcome();

    let record = BattleRepo::insert(
        conn,
        &NewBattle {
            attacker: &outcome.attacker.address,
            defender: &outcome.defender.address,
            winner: &winner.address,
            loser: &loser.address,
            critical: outcome.critical,
            transfer_points: outcome.transfer.transfer.units(),
            house_points: outcome.transfer.house.units(),
            outcome: serde_json::to_value(outcome)?,
            created_at: now,
        },
    )
    .await?;
    let reference = format!("battle:{}", record.id);

    // Loadouts, in address order.
    let mut sides = [Side::Attacker, Side::Defender];
    sides.sort_by(|a, b| outcome.side(*a).address.cmp(&outcome.side(*b).address));
    for side in sides {
        let after = outcome.side(side);
        LoadoutRepo::save(conn, &after.address, &after.loadout_after).await?;
    }

    for entry in &outcome.loot {
        if !entry.equipped && config.economy.bank_unequipped_loot {
            GearRepo::stash(conn, &winner.address, entry.item.id, STASH_SOURCE_LOOT).await?;
        }
        if let Some(displaced) = entry.displaced.as_ref().filter(|_| config.economy.bank_displaced_gear) {
            GearRepo::stash(conn, &winner.address, displaced.id, STASH_SOURCE_LOOT_DISPLACED).await?;
        }
    }

    let transfer = &outcome.transfer;
    if transfer.transfer.is_positive() {
        BalanceRepo::apply_delta(
            conn,
            &loser.address,
            -transfer.transfer,
            REASON_BATTLE_LOSS,
            Some(&reference),
        )
        .await?;
        BalanceRepo::apply_delta(
            conn,
            &winner.address,
            transfer.winner_gain,
            REASON_BATTLE_WIN,
            Some(&reference),
        )
        .await?;
        BalanceRepo::apply_delta(
            conn,
            &config.economy.treasury_address,
            transfer.house,
            REASON_HOUSE_CUT,
            Some(&reference),
        )
        .await?;
    }

    CooldownRepo::upsert_pair(
        conn,
        &outcome.attacker.address,
        &outcome.defender.address,
        outcome.next_pair_cooldown_at,
    )
    .await?;

    Ok(record.id)
}
