//! Battle eligibility checks -- pure logic, no database access.
//!
//! The checks run in a fixed order and the first failure is reported, because
//! the order decides which message a player sees.

use serde::Serialize;

use crate::battle::{ParticipantState, Side};
use crate::points::Points;
use crate::types::Timestamp;

/// Machine-readable reason a challenge is not allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockerCode {
    AttackerDead,
    AttackerOverdue,
    AttackerBalanceLow,
    DefenderBalanceLow,
    DefenderDead,
    PairCooldown,
    DefenderRecentlyLost,
}

impl BlockerCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AttackerDead => "attacker_dead",
            Self::AttackerOverdue => "attacker_overdue",
            Self::AttackerBalanceLow => "attacker_balance_low",
            Self::DefenderBalanceLow => "defender_balance_low",
            Self::DefenderDead => "defender_dead",
            Self::PairCooldown => "pair_cooldown",
            Self::DefenderRecentlyLost => "defender_recently_lost",
        }
    }
}

/// Structured details attached to a blocker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BlockerDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_points: Option<Points>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Points>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_allowed_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Blocker {
    pub role: Side,
    pub code: BlockerCode,
    pub details: BlockerDetails,
}

/// Outcome of the eligibility evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityDecision {
    pub allowed: bool,
    pub blocker: Option<Blocker>,
}

impl EligibilityDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            blocker: None,
        }
    }

    fn deny(role: Side, code: BlockerCode, details: BlockerDetails) -> Self {
        Self {
            allowed: false,
            blocker: Some(Blocker {
                role,
                code,
                details,
            }),
        }
    }

    /// `Ok(())` when allowed, the blocker otherwise.
    pub fn into_result(self) -> Result<(), Blocker> {
        match self.blocker {
            Some(blocker) => Err(blocker),
            None => Ok(()),
        }
    }
}

/// Evaluate whether `attacker` may challenge `defender`.
///
/// Order: attacker alive, attacker not overdue, attacker balance, defender
/// balance, defender alive.
pub fn evaluate(
    attacker: &ParticipantState,
    defender: &ParticipantState,
    min_stake: Points,
) -> EligibilityDecision {
    if !attacker.alive {
        return EligibilityDecision::deny(
            Side::Attacker,
            BlockerCode::AttackerDead,
            BlockerDetails::default(),
        );
    }
    if attacker.charge_status.overdue {
        return EligibilityDecision::deny(
            Side::Attacker,
            BlockerCode::AttackerOverdue,
            BlockerDetails::default(),
        );
    }
    if attacker.points < min_stake {
        return EligibilityDecision::deny(
            Side::Attacker,
            BlockerCode::AttackerBalanceLow,
            stake_details(min_stake, attacker.points),
        );
    }
    if defender.points < min_stake {
        return EligibilityDecision::deny(
            Side::Defender,
            BlockerCode::DefenderBalanceLow,
            stake_details(min_stake, defender.points),
        );
    }
    if !defender.alive {
        return EligibilityDecision::deny(
            Side::Defender,
            BlockerCode::DefenderDead,
            BlockerDetails::default(),
        );
    }
    EligibilityDecision::allow()
}

fn stake_details(min_stake: Points, balance: Points) -> BlockerDetails {
    BlockerDetails {
        min_points: Some(min_stake),
        balance: Some(balance),
        next_allowed_at: None,
    }
}

/// Time-window checks for a pair: the directional pair cooldown first, then the
/// defender's grace window after its most recent loss.
pub fn check_pair_windows(
    now: Timestamp,
    pair_next_allowed_at: Option<Timestamp>,
    defender_last_loss_at: Option<Timestamp>,
    defender_grace: chrono::Duration,
) -> EligibilityDecision {
    if let Some(next_allowed_at) = pair_next_allowed_at.filter(|t| now < *t) {
        return EligibilityDecision::deny(
            Side::Attacker,
            BlockerCode::PairCooldown,
            BlockerDetails {
                next_allowed_at: Some(next_allowed_at),
                ..BlockerDetails::default()
            },
        );
    }
    if let Some(grace_ends) = defender_last_loss_at
        .map(|lost_at| lost_at + defender_grace)
        .filter(|t| now < *t)
    {
        return EligibilityDecision::deny(
            Side::Defender,
            BlockerCode::DefenderRecentlyLost,
            BlockerDetails {
                next_allowed_at: Some(grace_ends),
                ..BlockerDetails::default()
            },
        );
    }
    EligibilityDecision::allow()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::battle::fixtures::participant;

    fn t0() -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap()
    }

    fn code(decision: &EligibilityDecision) -> Option<BlockerCode> {
        decision.blocker.as_ref().map(|b| b.code)
    }

    // -- evaluate --

    #[test]
    fn healthy_pair_is_allowed() {
        let decision = evaluate(
            &participant("0xa", 50),
            &participant("0xb", 50),
            Points::whole(10),
        );
        assert!(decision.allowed);
        assert!(decision.blocker.is_none());
    }

    #[test]
    fn dead_check_precedes_overdue() {
        let mut attacker = participant("0xa", 50);
        attacker.alive = false;
        attacker.charge_status.overdue = true;
        let decision = evaluate(&attacker, &participant("0xb", 50), Points::whole(10));
        assert!(!decision.allowed);
        assert_eq!(code(&decision), Some(BlockerCode::AttackerDead));
    }

    #[test]
    fn overdue_attacker_blocked() {
        let mut attacker = participant("0xa", 50);
        attacker.charge_status.overdue = true;
        let decision = evaluate(&attacker, &participant("0xb", 0), Points::whole(10));
        assert_eq!(code(&decision), Some(BlockerCode::AttackerOverdue));
    }

    #[test]
    fn attacker_balance_checked_before_defender() {
        let decision = evaluate(
            &participant("0xa", 5),
            &participant("0xb", 5),
            Points::whole(10),
        );
        let blocker = decision.blocker.unwrap();
        assert_eq!(blocker.code, BlockerCode::AttackerBalanceLow);
        assert_eq!(blocker.role, Side::Attacker);
        assert_eq!(blocker.details.min_points, Some(Points::whole(10)));
        assert_eq!(blocker.details.balance, Some(Points::whole(5)));
    }

    #[test]
    fn defender_balance_checked_before_defender_alive() {
        let mut defender = participant("0xb", 5);
        defender.alive = false;
        let decision = evaluate(&participant("0xa", 50), &defender, Points::whole(10));
        assert_eq!(code(&decision), Some(BlockerCode::DefenderBalanceLow));
    }

    #[test]
    fn dead_defender_blocked_last() {
        let mut defender = participant("0xb", 50);
        defender.alive = false;
        let decision = evaluate(&participant("0xa", 50), &defender, Points::whole(10));
        assert_eq!(code(&decision), Some(BlockerCode::DefenderDead));
        assert_eq!(decision.blocker.unwrap().role, Side::Defender);
    }

    #[test]
    fn balance_equal_to_stake_is_enough() {
        let decision = evaluate(
            &participant("0xa", 10),
            &participant("0xb", 10),
            Points::whole(10),
        );
        assert!(decision.into_result().is_ok());
    }

    // -- check_pair_windows --

    #[test]
    fn pair_cooldown_blocks_until_expiry() {
        let next = t0() + Duration::minutes(30);
        let decision = check_pair_windows(t0(), Some(next), None, Duration::hours(1));
        let blocker = decision.into_result().unwrap_err();
        assert_eq!(blocker.code, BlockerCode::PairCooldown);
        assert_eq!(blocker.details.next_allowed_at, Some(next));

        let later = check_pair_windows(next, Some(next), None, Duration::hours(1));
        assert!(later.allowed);
    }

    #[test]
    fn pair_cooldown_reported_before_grace() {
        let decision = check_pair_windows(
            t0(),
            Some(t0() + Duration::minutes(5)),
            Some(t0() - Duration::minutes(1)),
            Duration::hours(1),
        );
        assert_eq!(code(&decision), Some(BlockerCode::PairCooldown));
    }

    #[test]
    fn defender_grace_after_loss() {
        let lost_at = t0() - Duration::minutes(10);
        let decision = check_pair_windows(t0(), None, Some(lost_at), Duration::minutes(15));
        let blocker = decision.into_result().unwrap_err();
        assert_eq!(blocker.code, BlockerCode::DefenderRecentlyLost);
        assert_eq!(blocker.details.next_allowed_at, Some(lost_at + Duration::minutes(15)));

        let expired = check_pair_windows(t0(), None, Some(lost_at), Duration::minutes(10));
        assert!(expired.allowed);
    }
}
