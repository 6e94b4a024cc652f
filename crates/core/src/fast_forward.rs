//! Fast-forward burst runner.
//!
//! A newcomer may compress several charge attempts into one request. The
//! burst stops on the first drop, bills every attempt it ran, and leaves a
//! cooldown debt proportional to the time it skipped. One burst consumes one
//! unit of the daily budget no matter how many attempts it ran.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::charge::{
    self, bursts_remaining, day_key, debt_active, next_day_reset, ChargeConfig, ChargePricing,
    ChargeState,
};
use crate::drop::{apply_drop, attempt_drop, DropAttempt, DropConfig};
use crate::gear::{Item, Loadout};
use crate::points::Points;
use crate::rng::RandomSource;
use crate::types::Timestamp;

/// Bursts allowed per bloblet per UTC day.
pub const DEFAULT_DAILY_BURSTS: u32 = 1;
/// Upper bound on attempts in a single burst.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastForwardConfig {
    pub enabled: bool,
    pub daily_bursts: u32,
    pub max_attempts: u32,
}

impl Default for FastForwardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_bursts: DEFAULT_DAILY_BURSTS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Why a burst ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    DropHit,
    AttemptsExhausted,
}

/// Precondition failures, checked in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BurstRejection {
    #[error("fast-forward is disabled")]
    Disabled,

    #[error("burst of {requested} attempts is outside 1..={max}")]
    InvalidAttempts { requested: u32, max: u32 },

    #[error("cooldown debt runs until {until}")]
    DebtActive { until: Timestamp },

    #[error("daily burst budget spent; resets at {reset_at}")]
    DailyCapReached { reset_at: Timestamp },

    #[error("fast-forward is reserved for newcomers")]
    NotNewcomer,

    #[error("burst needs {required} points, balance is {balance}")]
    InsufficientBalance { required: Points, balance: Points },
}

/// Everything the runner reads about the bloblet, loaded under lock.
#[derive(Debug, Clone, Copy)]
pub struct BurstInput<'a> {
    pub state: &'a ChargeState,
    pub loadout: &'a Loadout,
    pub catalog: &'a [Item],
    pub balance: Points,
    pub is_newcomer: bool,
    pub max_attempts: u32,
}

/// Parameters a burst runs under.
#[derive(Debug, Clone, Copy)]
pub struct BurstRules<'a> {
    pub fast_forward: &'a FastForwardConfig,
    pub charge: &'a ChargeConfig,
    pub drop: &'a DropConfig,
    pub pricing: &'a ChargePricing,
}

/// Result of a burst, including the state to persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BurstOutcome {
    pub attempts: Vec<DropAttempt>,
    pub stop_reason: StopReason,
    pub debt_until: Timestamp,
    pub bursts_remaining: u32,
    pub total_cost: Points,
    pub total_reward: Points,
    #[serde(skip)]
    pub next_state: ChargeState,
    pub loadout: Loadout,
    /// Item pushed out of its slot by the drop, if any.
    pub displaced: Option<Item>,
}

impl BurstOutcome {
    pub fn attempts_used(&self) -> u32 {
        self.attempts.len() as u32
    }

    pub fn awarded(&self) -> Option<&DropAttempt> {
        self.attempts.iter().find(|a| a.awarded)
    }
}

/// Check every precondition without drawing any randomness.
pub fn check_burst(
    input: &BurstInput<'_>,
    now: Timestamp,
    rules: &BurstRules<'_>,
) -> Result<(), BurstRejection> {
    let config = rules.fast_forward;
    if !config.enabled {
        return Err(BurstRejection::Disabled);
    }
    if input.max_attempts == 0 || input.max_attempts > config.max_attempts {
        return Err(BurstRejection::InvalidAttempts {
            requested: input.max_attempts,
            max: config.max_attempts,
        });
    }
    if let Some(until) = input.state.fast_forward_debt_until.filter(|_| debt_active(input.state, now)) {
        return Err(BurstRejection::DebtActive { until });
    }
    if bursts_remaining(input.state, now, config.daily_bursts) == 0 {
        return Err(BurstRejection::DailyCapReached {
            reset_at: next_day_reset(now),
        });
    }
    if !input.is_newcomer {
        return Err(BurstRejection::NotNewcomer);
    }
    let required = rules.pricing.charge_cost * input.max_attempts;
    if input.balance < required {
        return Err(BurstRejection::InsufficientBalance {
            required,
            balance: input.balance,
        });
    }
    Ok(())
}

/// Run a burst of up to `input.max_attempts` drop attempts.
pub fn run_burst<R: RandomSource + ?Sized>(
    input: &BurstInput<'_>,
    now: Timestamp,
    rules: &BurstRules<'_>,
    rng: &mut R,
) -> Result<BurstOutcome, BurstRejection> {
    check_burst(input, now, rules)?;

    let mut acc = input.state.drop_acc;
    let mut attempts = Vec::with_capacity(input.max_attempts as usize);
    let mut stop_reason = StopReason::AttemptsExhausted;

    for _ in 0..input.max_attempts {
        let attempt = attempt_drop(input.loadout, input.catalog, acc, rules.drop, rng);
        acc = attempt.next_acc;
        let hit = attempt.awarded;
        attempts.push(attempt);
        if hit {
            stop_reason = StopReason::DropHit;
            break;
        }
    }

    let used = attempts.len() as u32;
    let debt_until = debt_window_end(input.state, now, used, rules.charge.cooldown);

    let (loadout, displaced) = match attempts.last() {
        Some(last) if last.awarded => apply_drop(input.loadout, last),
        _ => (input.loadout.clone(), None),
    };

    let remaining_before = bursts_remaining(input.state, now, rules.fast_forward.daily_bursts);
    let used_today = rules.fast_forward.daily_bursts - remaining_before;

    let mut next_state = charge::advance(now, input.state, rules.charge);
    next_state.drop_acc = acc.clamp(0.0, 1.0);
    next_state.cooldown_ends_at = Some(debt_until);
    next_state.fast_forward_debt_until = Some(debt_until);
    next_state.fast_forward_burst_day = Some(day_key(now));
    next_state.fast_forward_bursts_used = used_today + 1;
    next_state.fast_forward_last_run_at = Some(now);

    Ok(BurstOutcome {
        attempts,
        stop_reason,
        debt_until,
        bursts_remaining: remaining_before - 1,
        total_cost: rules.pricing.charge_cost * used,
        total_reward: rules.pricing.upkeep_reward * used,
        next_state,
        loadout,
        displaced,
    })
}

/// End of the cooldown debt a burst of `used` attempts leaves behind.
///
/// The natural ready time stacks `used` cooldowns on top of the current one;
/// the debt is the skipped time not already covered by real elapsed time. The
/// later of the two wins.
pub fn debt_window_end(
    state: &ChargeState,
    now: Timestamp,
    used: u32,
    cooldown: Duration,
) -> Timestamp {
    let skipped = cooldown * used as i32;
    let ready_base = charge::blocking_cooldown(state, now).unwrap_or(now);
    let natural_ready = ready_base + skipped;

    let elapsed = state
        .fast_forward_last_run_at
        .into_iter()
        .chain(state.last_charged_at)
        .max()
        .map(|since| (now - since).max(Duration::zero()))
        .unwrap_or_else(Duration::zero);
    let debt = (skipped - elapsed).max(Duration::zero());

    natural_ready.max(now + debt)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
