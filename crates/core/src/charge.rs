//! Charge ("nourish") state machine.
//!
//! A bloblet's persisted [`ChargeState`] plus the current time fully determine
//! whether it is boosted (`covered`), waiting out a cooldown, or ready to be
//! nourished again. Nothing here reads the clock; callers pass `now`.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::points::Points;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Time between charges.
pub const DEFAULT_COOLDOWN_SECS: i64 = 6 * 3600;
/// How long boosters stay active after a charge.
pub const DEFAULT_BOOSTER_WINDOW_SECS: i64 = 4 * 3600;
/// Booster level granted while covered.
pub const DEFAULT_BOOSTER_LEVEL: i32 = 2;
/// How long a lapsed cooldown may go unanswered before the bloblet is overdue.
pub const DEFAULT_OVERDUE_GRACE_SECS: i64 = 24 * 3600;
/// Points debited per charge attempt.
pub const DEFAULT_CHARGE_COST: Points = Points::whole(10);
/// Points credited back per charge attempt.
pub const DEFAULT_UPKEEP_REWARD: Points = Points::whole(2);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Timing parameters for the charge cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeConfig {
    pub cooldown: Duration,
    pub booster_window: Duration,
    pub booster_level: i32,
    pub overdue_grace: Duration,
}

impl Default for ChargeConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::seconds(DEFAULT_COOLDOWN_SECS),
            booster_window: Duration::seconds(DEFAULT_BOOSTER_WINDOW_SECS),
            booster_level: DEFAULT_BOOSTER_LEVEL,
            overdue_grace: Duration::seconds(DEFAULT_OVERDUE_GRACE_SECS),
        }
    }
}

/// What a single charge attempt costs and earns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargePricing {
    pub charge_cost: Points,
    pub upkeep_reward: Points,
}

impl Default for ChargePricing {
    fn default() -> Self {
        Self {
            charge_cost: DEFAULT_CHARGE_COST,
            upkeep_reward: DEFAULT_UPKEEP_REWARD,
        }
    }
}

/// Persisted per-bloblet charge timers and drop bookkeeping.
///
/// `drop_acc` is kept in `[0, 1]`. The fast-forward fields track the daily
/// burst budget (keyed by UTC day) and the debt window a burst leaves behind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChargeState {
    pub last_charged_at: Option<Timestamp>,
    pub cooldown_ends_at: Option<Timestamp>,
    pub boosters_active_until: Option<Timestamp>,
    pub drop_acc: f64,
    pub fast_forward_debt_until: Option<Timestamp>,
    pub fast_forward_burst_day: Option<String>,
    pub fast_forward_bursts_used: u32,
    pub fast_forward_last_run_at: Option<Timestamp>,
}

/// Which part of the charge cycle a bloblet is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargePhase {
    Covered,
    Cooldown,
    Ready,
}

/// Facts about fast-forward that live outside the charge state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastForwardContext {
    pub enabled: bool,
    /// Supplied by the gear inventory: no equipped gear and an empty stash.
    pub is_newcomer: bool,
    pub daily_bursts: u32,
}

/// Derived, display-oriented charge status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChargeStatus {
    pub state: ChargePhase,
    pub booster_level: i32,
    pub overdue: bool,
    pub cooldown_until: Option<Timestamp>,
    pub fast_forward_eligible: bool,
    pub fast_forward_bursts_remaining: u32,
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// The later of the stored cooldown end and any fast-forward debt window.
pub fn effective_cooldown_end(state: &ChargeState) -> Option<Timestamp> {
    match (state.cooldown_ends_at, state.fast_forward_debt_until) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Whether a fast-forward debt window is still running at `now`.
pub fn debt_active(state: &ChargeState, now: Timestamp) -> bool {
    state.fast_forward_debt_until.is_some_and(|until| now < until)
}

/// UTC day key used to reset the daily burst budget.
pub fn day_key(now: Timestamp) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Start of the next UTC day, when the burst budget resets.
pub fn next_day_reset(now: Timestamp) -> Timestamp {
    now.date_naive()
        .succ_opt()
        .map(|day| day.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or(now + Duration::days(1))
}

/// Bursts left today. A stale day key means nothing has been used yet today.
pub fn bursts_remaining(state: &ChargeState, now: Timestamp, daily_bursts: u32) -> u32 {
    let used_today = match &state.fast_forward_burst_day {
        Some(day) if *day == day_key(now) => state.fast_forward_bursts_used,
        _ => 0,
    };
    daily_bursts.saturating_sub(used_today)
}

/// Derive the charge status shown to players.
pub fn derive_status(
    state: &ChargeState,
    now: Timestamp,
    ff: &FastForwardContext,
    config: &ChargeConfig,
) -> ChargeStatus {
    let cooldown_until = effective_cooldown_end(state);

    let (phase, booster_level) = if state.boosters_active_until.is_some_and(|t| now < t) {
        (ChargePhase::Covered, config.booster_level.max(1))
    } else if cooldown_until.is_some_and(|t| now < t) {
        (ChargePhase::Cooldown, 0)
    } else {
        (ChargePhase::Ready, 0)
    };

    let overdue = phase == ChargePhase::Ready
        && cooldown_until.is_some_and(|lapsed_at| now - lapsed_at > config.overdue_grace);

    let remaining = bursts_remaining(state, now, ff.daily_bursts);
    let fast_forward_eligible =
        ff.enabled && ff.is_newcomer && remaining > 0 && !debt_active(state, now);

    ChargeStatus {
        state: phase,
        booster_level,
        overdue,
        cooldown_until: cooldown_until.filter(|t| now < *t),
        fast_forward_eligible,
        fast_forward_bursts_remaining: remaining,
    }
}

/// Whether a charge at `now` must be refused because of a running cooldown.
/// Returns the time the cooldown ends.
pub fn blocking_cooldown(state: &ChargeState, now: Timestamp) -> Option<Timestamp> {
    effective_cooldown_end(state).filter(|until| now < *until)
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// State after a successful charge at `now`.
///
/// Drop accumulator and fast-forward bookkeeping carry over; the caller
/// overwrites them when the charge changed them. The stored cooldown end never
/// undercuts a running debt window.
pub fn advance(now: Timestamp, previous: &ChargeState, config: &ChargeConfig) -> ChargeState {
    let natural_end = now + config.cooldown;
    let cooldown_end = match previous.fast_forward_debt_until {
        Some(debt) if debt > natural_end => debt,
        _ => natural_end,
    };

    ChargeState {
        last_charged_at: Some(now),
        cooldown_ends_at: Some(cooldown_end),
        boosters_active_until: Some(now + config.booster_window),
        ..previous.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn t0() -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn ff(is_newcomer: bool) -> FastForwardContext {
        FastForwardContext {
            enabled: true,
            is_newcomer,
            daily_bursts: 2,
        }
    }

    fn charged_at(at: Timestamp) -> ChargeState {
        advance(at, &ChargeState::default(), &ChargeConfig::default())
    }

    // -- derive_status --

    #[test]
    fn fresh_state_is_ready_and_not_overdue() {
        let status = derive_status(&ChargeState::default(), t0(), &ff(true), &ChargeConfig::default());
        assert_eq!(status.state, ChargePhase::Ready);
        assert_eq!(status.booster_level, 0);
        assert!(!status.overdue);
        assert!(status.cooldown_until.is_none());
    }

    #[test]
    fn covered_right_after_charge() {
        let config = ChargeConfig::default();
        let state = charged_at(t0());
        let status = derive_status(&state, t0() + Duration::minutes(5), &ff(false), &config);
        assert_eq!(status.state, ChargePhase::Covered);
        assert_eq!(status.booster_level, DEFAULT_BOOSTER_LEVEL);
    }

    #[test]
    fn cooldown_after_boosters_expire() {
        let config = ChargeConfig::default();
        let state = charged_at(t0());
        let now = t0() + config.booster_window + Duration::minutes(1);
        let status = derive_status(&state, now, &ff(false), &config);
        assert_eq!(status.state, ChargePhase::Cooldown);
        assert_eq!(status.booster_level, 0);
        assert_eq!(status.cooldown_until, Some(t0() + config.cooldown));
    }

    #[test]
    fn ready_once_cooldown_lapses() {
        let config = ChargeConfig::default();
        let state = charged_at(t0());
        let status = derive_status(&state, t0() + config.cooldown, &ff(false), &config);
        assert_eq!(status.state, ChargePhase::Ready);
        assert!(!status.overdue);
    }

    #[test]
    fn overdue_only_after_grace() {
        let config = ChargeConfig::default();
        let state = charged_at(t0());
        let lapsed = t0() + config.cooldown;

        let within = derive_status(&state, lapsed + config.overdue_grace, &ff(false), &config);
        assert!(!within.overdue);

        let past = derive_status(
            &state,
            lapsed + config.overdue_grace + Duration::seconds(1),
            &ff(false),
            &config,
        );
        assert!(past.overdue);
    }

    #[test]
    fn debt_window_extends_cooldown() {
        let config = ChargeConfig::default();
        let mut state = charged_at(t0());
        state.fast_forward_debt_until = Some(t0() + Duration::hours(30));

        let now = t0() + config.cooldown + Duration::hours(1);
        let status = derive_status(&state, now, &ff(true), &config);
        assert_eq!(status.state, ChargePhase::Cooldown);
        assert_eq!(status.cooldown_until, Some(t0() + Duration::hours(30)));
        assert!(!status.fast_forward_eligible);
    }

    #[test]
    fn fast_forward_eligibility_requires_every_condition() {
        let config = ChargeConfig::default();
        let state = ChargeState::default();

        assert!(derive_status(&state, t0(), &ff(true), &config).fast_forward_eligible);
        assert!(!derive_status(&state, t0(), &ff(false), &config).fast_forward_eligible);

        let disabled = FastForwardContext {
            enabled: false,
            ..ff(true)
        };
        assert!(!derive_status(&state, t0(), &disabled, &config).fast_forward_eligible);

        let spent = ChargeState {
            fast_forward_burst_day: Some(day_key(t0())),
            fast_forward_bursts_used: 2,
            ..ChargeState::default()
        };
        let status = derive_status(&spent, t0(), &ff(true), &config);
        assert_eq!(status.fast_forward_bursts_remaining, 0);
        assert!(!status.fast_forward_eligible);
    }

    // -- bursts_remaining --

    #[test]
    fn burst_budget_resets_on_new_day() {
        let state = ChargeState {
            fast_forward_burst_day: Some(day_key(t0())),
            fast_forward_bursts_used: 2,
            ..ChargeState::default()
        };
        assert_eq!(bursts_remaining(&state, t0(), 2), 0);
        assert_eq!(bursts_remaining(&state, t0() + Duration::days(1), 2), 2);
    }

    #[test]
    fn next_day_reset_is_utc_midnight() {
        let reset = next_day_reset(t0());
        assert_eq!(reset, chrono::Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap());
    }

    // -- advance --

    #[test]
    fn advance_sets_timers_and_keeps_bookkeeping() {
        let config = ChargeConfig::default();
        let previous = ChargeState {
            drop_acc: 0.4,
            fast_forward_bursts_used: 1,
            fast_forward_burst_day: Some(day_key(t0())),
            ..ChargeState::default()
        };
        let next = advance(t0(), &previous, &config);
        assert_eq!(next.last_charged_at, Some(t0()));
        assert_eq!(next.cooldown_ends_at, Some(t0() + config.cooldown));
        assert_eq!(next.boosters_active_until, Some(t0() + config.booster_window));
        assert_eq!(next.drop_acc, 0.4);
        assert_eq!(next.fast_forward_bursts_used, 1);
    }

    #[test]
    fn advance_never_undercuts_debt() {
        let config = ChargeConfig::default();
        let debt = t0() + Duration::days(2);
        let previous = ChargeState {
            fast_forward_debt_until: Some(debt),
            ..ChargeState::default()
        };
        let next = advance(t0(), &previous, &config);
        assert_eq!(next.cooldown_ends_at, Some(debt));
    }

    #[test]
    fn blocking_cooldown_reports_end() {
        let config = ChargeConfig::default();
        let state = charged_at(t0());
        assert_eq!(blocking_cooldown(&state, t0()), Some(t0() + config.cooldown));
        assert_eq!(blocking_cooldown(&state, t0() + config.cooldown), None);
    }
}
