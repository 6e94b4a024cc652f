//! Battle resolution -- pure logic, no database access.
//!
//! [`resolve`] turns two participants, the battle parameters and a randomness
//! source into a complete [`BattleOutcome`]: rolls, winner, critical, stolen
//! gear and the point transfer. Given the same inputs and the same sequence of
//! draws it always produces the same outcome.
//!
//! Draw order: attacker roll, defender roll, tie coin (only inside the tie
//! band), critical.

use chrono::Duration;
use serde::Serialize;

use crate::charge::ChargeStatus;
use crate::gear::{Item, ItemType, Loadout};
use crate::points::{Points, BPS_DENOMINATOR};
use crate::rng::RandomSource;
use crate::types::{Address, DbId, Timestamp};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Hard cap on the luck variance: rolls never move more than ±50%.
pub const MAX_LUCK_VARIANCE: f64 = 0.5;

pub const DEFAULT_LUCK_VARIANCE: f64 = 0.25;
pub const DEFAULT_TIE_BAND: f64 = 0.5;
pub const DEFAULT_CRITICAL_CHANCE: f64 = 0.1;
pub const DEFAULT_TRANSFER_BPS: u32 = 1000;
pub const DEFAULT_HOUSE_BPS: u32 = 1000;
pub const DEFAULT_MIN_TRANSFER: Points = Points::whole(1);
pub const DEFAULT_MIN_STAKE: Points = Points::whole(10);
/// Battles per pair per trailing hour before the surcharge applies.
pub const DEFAULT_PAIR_HOURLY_LIMIT: u32 = 3;
pub const DEFAULT_ANTI_FARM_SURCHARGE_BPS: u32 = 2000;
pub const DEFAULT_DEFENDER_GRACE_SECS: i64 = 10 * 60;
pub const DEFAULT_PAIR_COOLDOWN_SECS: i64 = 30 * 60;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Battle parameters, assembled per request.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleConfig {
    pub luck_variance: f64,
    pub tie_band: f64,
    pub critical_chance: f64,
    pub transfer_bps: u32,
    pub house_bps: u32,
    pub min_transfer: Points,
    /// Both sides must hold at least this much to battle.
    pub min_stake: Points,
    pub pair_hourly_limit: u32,
    pub anti_farm_surcharge_bps: u32,
    pub defender_grace: Duration,
    pub pair_cooldown: Duration,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            luck_variance: DEFAULT_LUCK_VARIANCE,
            tie_band: DEFAULT_TIE_BAND,
            critical_chance: DEFAULT_CRITICAL_CHANCE,
            transfer_bps: DEFAULT_TRANSFER_BPS,
            house_bps: DEFAULT_HOUSE_BPS,
            min_transfer: DEFAULT_MIN_TRANSFER,
            min_stake: DEFAULT_MIN_STAKE,
            pair_hourly_limit: DEFAULT_PAIR_HOURLY_LIMIT,
            anti_farm_surcharge_bps: DEFAULT_ANTI_FARM_SURCHARGE_BPS,
            defender_grace: Duration::seconds(DEFAULT_DEFENDER_GRACE_SECS),
            pair_cooldown: Duration::seconds(DEFAULT_PAIR_COOLDOWN_SECS),
        }
    }
}

/// One side of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attacker => "attacker",
            Self::Defender => "defender",
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::Attacker => Self::Defender,
            Self::Defender => Self::Attacker,
        }
    }
}

/// Everything the engine knows about one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantState {
    pub address: Address,
    pub alive: bool,
    pub points: Points,
    pub booster_level: i32,
    pub charge_status: ChargeStatus,
    pub loadout: Loadout,
}

/// Inputs to a single battle.
#[derive(Debug, Clone, Copy)]
pub struct BattleContext<'a> {
    pub attacker: &'a ParticipantState,
    pub defender: &'a ParticipantState,
    pub config: &'a BattleConfig,
    pub now: Timestamp,
    /// Battles between this pair (either direction) in the trailing hour.
    pub recent_pair_battles: u32,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Typed record of what happened, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BattleEffect {
    CoinFlip {
        winner: Side,
    },
    Critical,
    ItemStolen {
        slot: ItemType,
        item_id: DbId,
        from: Side,
        equipped: bool,
    },
    AntiFarmSurcharge {
        surcharge_bps: u32,
    },
    PointsTransferred {
        amount: Points,
    },
    HouseCut {
        amount: Points,
        bps: u32,
    },
}

/// Per-side numbers after resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideOutcome {
    pub address: Address,
    pub base: f64,
    pub roll: f64,
    pub points_before: Points,
    pub points_after: Points,
    pub loadout_after: Loadout,
}

/// An item taken from the loser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LootEntry {
    pub slot: ItemType,
    pub item: Item,
    pub from: Side,
    pub to: Side,
    /// Whether the winner equipped it. Unequipped loot is banked or destroyed
    /// by the caller.
    pub equipped: bool,
    /// The winner's previous item in that slot, when the loot replaced it.
    pub displaced: Option<Item>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferBreakdown {
    pub transfer: Points,
    pub house: Points,
    pub winner_gain: Points,
    /// House rate actually applied, surcharge included.
    pub house_bps: u32,
    pub surcharged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleOutcome {
    pub winner: Side,
    pub critical: bool,
    pub effects: Vec<BattleEffect>,
    pub attacker: SideOutcome,
    pub defender: SideOutcome,
    pub loot: Vec<LootEntry>,
    pub transfer: TransferBreakdown,
    pub next_pair_cooldown_at: Timestamp,
}

impl BattleOutcome {
    pub fn side(&self, side: Side) -> &SideOutcome {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    pub fn winner_outcome(&self) -> &SideOutcome {
        self.side(self.winner)
    }

    pub fn loser_outcome(&self) -> &SideOutcome {
        self.side(self.winner.opponent())
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve a battle.
pub fn resolve<R: RandomSource + ?Sized>(ctx: &BattleContext<'_>, rng: &mut R) -> BattleOutcome {
    let config = ctx.config;
    let mut effects = Vec::new();

    // 1. Base stats.
    let attacker_base = base_stat(ctx.attacker, ItemType::Weapon);
    let defender_base = base_stat(ctx.defender, ItemType::Shield);

    // 2. Rolls.
    // NaN variance counts as no luck.
    let variance = config.luck_variance.max(0.0).min(MAX_LUCK_VARIANCE);
    let attacker_roll = roll(attacker_base, variance, rng);
    let defender_roll = roll(defender_base, variance, rng);

    // 3. Winner.
    let winner = if (attacker_roll - defender_roll).abs() <= config.tie_band {
        let winner = if rng.next_f64() < 0.5 {
            Side::Attacker
        } else {
            Side::Defender
        };
        effects.push(BattleEffect::CoinFlip { winner });
        winner
    } else if attacker_roll > defender_roll {
        Side::Attacker
    } else {
        Side::Defender
    };

    // 4. Critical, drawn regardless of the winner.
    let critical = rng.next_f64() < config.critical_chance;
    if critical {
        effects.push(BattleEffect::Critical);
    }

    // 5. Loot.
    let loot = resolve_loot(winner, critical, &ctx.attacker.loadout, &ctx.defender.loadout);
    for entry in &loot.entries {
        effects.push(BattleEffect::ItemStolen {
            slot: entry.slot,
            item_id: entry.item.id,
            from: entry.from,
            equipped: entry.equipped,
        });
    }

    // 6. Transfer.
    let (winner_state, loser_state) = match winner {
        Side::Attacker => (ctx.attacker, ctx.defender),
        Side::Defender => (ctx.defender, ctx.attacker),
    };
    let transfer = compute_transfer(loser_state.points, config, ctx.recent_pair_battles);
    if transfer.surcharged {
        effects.push(BattleEffect::AntiFarmSurcharge {
            surcharge_bps: config.anti_farm_surcharge_bps,
        });
    }
    if transfer.transfer.is_positive() {
        effects.push(BattleEffect::PointsTransferred {
            amount: transfer.transfer,
        });
        effects.push(BattleEffect::HouseCut {
            amount: transfer.house,
            bps: transfer.house_bps,
        });
    }

    // 7. Final points.
    let winner_after = winner_state.points + transfer.winner_gain;
    let loser_after = loser_state.points.saturating_sub(transfer.transfer);
    let (attacker_after, defender_after) = match winner {
        Side::Attacker => (winner_after, loser_after),
        Side::Defender => (loser_after, winner_after),
    };

    BattleOutcome {
        winner,
        critical,
        effects,
        attacker: SideOutcome {
            address: ctx.attacker.address.clone(),
            base: attacker_base,
            roll: attacker_roll,
            points_before: ctx.attacker.points,
            points_after: attacker_after,
            loadout_after: loot.attacker,
        },
        defender: SideOutcome {
            address: ctx.defender.address.clone(),
            base: defender_base,
            roll: defender_roll,
            points_before: ctx.defender.points,
            points_after: defender_after,
            loadout_after: loot.defender,
        },
        loot: loot.entries,
        transfer,
        // 8. Pair cooldown.
        next_pair_cooldown_at: ctx.now + config.pair_cooldown,
    }
}

/// Slot stat of the relevant item plus the booster level. Missing item = 0.
fn base_stat(participant: &ParticipantState, slot: ItemType) -> f64 {
    f64::from(participant.loadout.slot_stat(slot) + participant.booster_level)
}

/// `base × (1 + (2r − 1) × variance)`: symmetric noise around the base.
fn roll<R: RandomSource + ?Sized>(base: f64, variance: f64, rng: &mut R) -> f64 {
    let noise = 2.0 * rng.next_f64() - 1.0;
    base * (1.0 + noise * variance)
}

struct LootResolution {
    attacker: Loadout,
    defender: Loadout,
    entries: Vec<LootEntry>,
}

/// Apply steals to copies of both loadouts. The winner always takes one slot
/// (attacker: the shield, defender: the weapon); a critical takes the other
/// slot too.
fn resolve_loot(
    winner: Side,
    critical: bool,
    attacker: &Loadout,
    defender: &Loadout,
) -> LootResolution {
    let (mut winner_loadout, mut loser_loadout) = match winner {
        Side::Attacker => (attacker.clone(), defender.clone()),
        Side::Defender => (defender.clone(), attacker.clone()),
    };

    let primary = match winner {
        Side::Attacker => ItemType::Shield,
        Side::Defender => ItemType::Weapon,
    };
    let mut slots = vec![primary];
    if critical {
        slots.push(primary.other());
    }

    let mut entries = Vec::with_capacity(slots.len());
    for slot in slots {
        let (loser_next, taken) = loser_loadout.with_item(slot, None);
        let Some(item) = taken else {
            continue;
        };
        loser_loadout = loser_next;

        let equipped = item.beats(winner_loadout.slot(slot));
        let displaced = if equipped {
            let (winner_next, displaced) = winner_loadout.with_item(slot, Some(item.clone()));
            winner_loadout = winner_next;
            displaced
        } else {
            None
        };

        entries.push(LootEntry {
            slot,
            item,
            from: winner.opponent(),
            to: winner,
            equipped,
            displaced,
        });
    }

    let (attacker, defender) = match winner {
        Side::Attacker => (winner_loadout, loser_loadout),
        Side::Defender => (loser_loadout, winner_loadout),
    };
    LootResolution {
        attacker,
        defender,
        entries,
    }
}

/// Point transfer from the loser.
///
/// `transfer = min(loser, max(floor, ceil(loser × rate)))`; the house keeps
/// `transfer × house_rate` (surcharged once the pair reaches the hourly
/// limit) and the winner gets the rest. `house + winner_gain == transfer`.
pub fn compute_transfer(
    loser_points: Points,
    config: &BattleConfig,
    recent_pair_battles: u32,
) -> TransferBreakdown {
    let loser_points = loser_points.max(Points::ZERO);
    let proportional = loser_points.mul_bps_ceil_whole(config.transfer_bps);
    let transfer = loser_points.min(proportional.max(config.min_transfer));

    let surcharged = config.pair_hourly_limit > 0 && recent_pair_battles >= config.pair_hourly_limit;
    let house_bps = if surcharged {
        config
            .house_bps
            .saturating_add(config.anti_farm_surcharge_bps)
            .min(BPS_DENOMINATOR as u32)
    } else {
        config.house_bps.min(BPS_DENOMINATOR as u32)
    };

    if !transfer.is_positive() {
        return TransferBreakdown {
            transfer: Points::ZERO,
            house: Points::ZERO,
            winner_gain: Points::ZERO,
            house_bps,
            surcharged,
        };
    }

    let house = transfer.mul_bps_floor(house_bps);
    TransferBreakdown {
        transfer,
        house,
        winner_gain: transfer - house,
        house_bps,
        surcharged,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::charge::ChargePhase;

    pub fn ready_status() -> ChargeStatus {
        ChargeStatus {
            state: ChargePhase::Ready,
            booster_level: 0,
            overdue: false,
            cooldown_until: None,
            fast_forward_eligible: false,
            fast_forward_bursts_remaining: 0,
        }
    }

    /// A live, unequipped participant holding `points` whole points.
    pub fn participant(address: &str, points: i64) -> ParticipantState {
        ParticipantState {
            address: address.to_string(),
            alive: true,
            points: Points::whole(points),
            booster_level: 0,
            charge_status: ready_status(),
            loadout: Loadout::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::fixtures::participant;
    use super::*;
    use crate::gear::fixtures::{shield, weapon};
    use crate::rng::ScriptedRandom;

    fn t0() -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2024, 7, 4, 20, 0, 0).unwrap()
    }

    fn calm_config() -> BattleConfig {
        BattleConfig {
            luck_variance: 0.0,
            tie_band: 0.2,
            critical_chance: 0.1,
            ..BattleConfig::default()
        }
    }

    fn armed(address: &str, points: i64, op: i32, dp: i32) -> ParticipantState {
        let mut p = participant(address, points);
        p.loadout = Loadout {
            weapon: Some(weapon(100 + op as i64, op)),
            shield: Some(shield(200 + dp as i64, dp)),
        };
        p
    }

    fn ctx<'a>(
        attacker: &'a ParticipantState,
        defender: &'a ParticipantState,
        config: &'a BattleConfig,
    ) -> BattleContext<'a> {
        BattleContext {
            attacker,
            defender,
            config,
            now: t0(),
            recent_pair_battles: 0,
        }
    }

    // -- rolls and winner --

    #[test]
    fn stronger_weapon_wins_without_variance() {
        let attacker = armed("0xa", 50, 10, 1);
        let defender = armed("0xb", 50, 1, 4);
        let config = calm_config();
        let mut rng = ScriptedRandom::new([0.3, 0.8, 0.9]);

        let outcome = resolve(&ctx(&attacker, &defender, &config), &mut rng);

        assert_eq!(outcome.attacker.roll, 10.0);
        assert_eq!(outcome.defender.roll, 4.0);
        assert_eq!(outcome.winner, Side::Attacker);
        assert!(!outcome.critical);
        assert_eq!(rng.drawn().len(), 3);
    }

    #[test]
    fn nan_variance_rolls_the_base_stats() {
        let attacker = armed("0xa", 50, 100, 1);
        let defender = armed("0xb", 50, 1, 1);
        let config = BattleConfig {
            luck_variance: f64::NAN,
            ..calm_config()
        };

        let outcome = resolve(&ctx(&attacker, &defender, &config), &mut ScriptedRandom::constant(0.9));

        assert_eq!(outcome.attacker.roll, 100.0);
        assert_eq!(outcome.defender.roll, 1.0);
        assert_eq!(outcome.winner, Side::Attacker);
    }

    #[test]
    fn boosters_add_to_base() {
        let mut attacker = armed("0xa", 50, 3, 1);
        attacker.booster_level = 2;
        let mut defender = armed("0xb", 50, 1, 4);
        defender.booster_level = 1;
        let config = calm_config();
        let mut rng = ScriptedRandom::new([0.5, 0.5, 0.9]);

        let outcome = resolve(&ctx(&attacker, &defender, &config), &mut rng);
        assert_eq!(outcome.attacker.base, 5.0);
        assert_eq!(outcome.defender.base, 5.0);
    }

    #[test]
    fn variance_is_capped_at_half() {
        let attacker = armed("0xa", 50, 10, 1);
        let defender = armed("0xb", 50, 1, 10);
        let config = BattleConfig {
            luck_variance: 3.0,
            tie_band: 0.0,
            ..calm_config()
        };
        let mut rng = ScriptedRandom::new([0.0, 0.75, 0.9]);

        let outcome = resolve(&ctx(&attacker, &defender, &config), &mut rng);
        assert_eq!(outcome.attacker.roll, 5.0);
        assert_eq!(outcome.defender.roll, 12.5);
        assert_eq!(outcome.winner, Side::Defender);
    }

    #[test]
    fn tie_band_goes_to_coin_flip() {
        let attacker = armed("0xa", 50, 5, 1);
        let defender = armed("0xb", 50, 1, 5);
        let config = calm_config();

        let mut rng = ScriptedRandom::new([0.5, 0.5, 0.2, 0.9]);
        let outcome = resolve(&ctx(&attacker, &defender, &config), &mut rng);
        assert_eq!(outcome.winner, Side::Attacker);
        assert_eq!(
            outcome.effects.first(),
            Some(&BattleEffect::CoinFlip {
                winner: Side::Attacker
            })
        );

        let mut rng = ScriptedRandom::new([0.5, 0.5, 0.7, 0.9]);
        let outcome = resolve(&ctx(&attacker, &defender, &config), &mut rng);
        assert_eq!(outcome.winner, Side::Defender);
    }

    // -- loot --

    #[test]
    fn normal_win_steals_exactly_one_slot() {
        let attacker = armed("0xa", 50, 10, 1);
        let defender = armed("0xb", 50, 1, 4);
        let config = calm_config();
        let mut rng = ScriptedRandom::new([0.5, 0.5, 0.9]);

        let outcome = resolve(&ctx(&attacker, &defender, &config), &mut rng);

        assert_eq!(outcome.loot.len(), 1);
        let entry = &outcome.loot[0];
        assert_eq!(entry.slot, ItemType::Shield);
        assert_eq!(entry.from, Side::Defender);
        // dp 4 beats the attacker's dp 1 shield.
        assert!(entry.equipped);
        assert_eq!(entry.displaced.as_ref().map(|i| i.dp), Some(1));
        assert!(outcome.defender.loadout_after.shield.is_none());
        assert_eq!(outcome.attacker.loadout_after.slot_stat(ItemType::Shield), 4);
        // Defender keeps its weapon.
        assert!(outcome.defender.loadout_after.weapon.is_some());
    }

    #[test]
    fn critical_win_steals_both_slots() {
        let attacker = armed("0xa", 50, 2, 9);
        let defender = armed("0xb", 50, 8, 5);
        let config = calm_config();
        // Defender wins on rolls (5 vs 2), critical fires.
        let mut rng = ScriptedRandom::new([0.5, 0.5, 0.05]);

        let outcome = resolve(&ctx(&attacker, &defender, &config), &mut rng);

        assert_eq!(outcome.winner, Side::Attacker.opponent());
        assert!(outcome.critical);
        assert_eq!(outcome.loot.len(), 2);
        assert_eq!(outcome.loot[0].slot, ItemType::Weapon);
        assert_eq!(outcome.loot[1].slot, ItemType::Shield);
        assert!(outcome.attacker.loadout_after.is_empty());

        // Weapon op 2 does not beat op 8: taken but not equipped.
        assert!(!outcome.loot[0].equipped);
        assert_eq!(outcome.defender.loadout_after.slot_stat(ItemType::Weapon), 8);
        // Shield dp 9 beats dp 5: equipped.
        assert!(outcome.loot[1].equipped);
        assert_eq!(outcome.defender.loadout_after.slot_stat(ItemType::Shield), 9);
    }

    #[test]
    fn equal_stat_loot_is_not_equipped() {
        let attacker = armed("0xa", 50, 10, 4);
        let defender = armed("0xb", 50, 1, 4);
        let config = calm_config();
        let mut rng = ScriptedRandom::new([0.5, 0.5, 0.9]);

        let outcome = resolve(&ctx(&attacker, &defender, &config), &mut rng);
        assert_eq!(outcome.loot.len(), 1);
        assert!(!outcome.loot[0].equipped);
        assert!(outcome.loot[0].displaced.is_none());
        assert_eq!(outcome.attacker.loadout_after, attacker.loadout);
    }

    #[test]
    fn empty_loser_slot_yields_no_loot() {
        let attacker = armed("0xa", 50, 10, 1);
        let mut defender = participant("0xb", 50);
        defender.loadout.weapon = Some(weapon(7, 1));
        let config = calm_config();
        let mut rng = ScriptedRandom::new([0.5, 0.5, 0.9]);

        let outcome = resolve(&ctx(&attacker, &defender, &config), &mut rng);
        assert_eq!(outcome.winner, Side::Attacker);
        assert!(outcome.loot.is_empty());
        assert!(!outcome
            .effects
            .iter()
            .any(|e| matches!(e, BattleEffect::ItemStolen { .. })));
    }

    #[test]
    fn winner_with_empty_slot_equips_loot() {
        let mut attacker = participant("0xa", 50);
        attacker.loadout.weapon = Some(weapon(1, 10));
        let defender = armed("0xb", 50, 1, 3);
        let config = calm_config();
        let mut rng = ScriptedRandom::new([0.5, 0.5, 0.9]);

        let outcome = resolve(&ctx(&attacker, &defender, &config), &mut rng);
        assert!(outcome.loot[0].equipped);
        assert_eq!(outcome.attacker.loadout_after.slot_stat(ItemType::Shield), 3);
    }

    // -- transfer --

    #[test]
    fn transfer_scenario_fifty_points() {
        let config = BattleConfig {
            transfer_bps: 1000,
            min_transfer: Points::whole(1),
            house_bps: 1000,
            ..BattleConfig::default()
        };
        let breakdown = compute_transfer(Points::whole(50), &config, 0);
        assert_eq!(breakdown.transfer, Points::whole(5));
        assert_eq!(breakdown.house, Points::from_units(50));
        assert_eq!(breakdown.winner_gain, Points::from_units(450));
        assert!(!breakdown.surcharged);
    }

    #[test]
    fn transfer_floor_and_loser_cap() {
        let config = BattleConfig {
            transfer_bps: 100,
            min_transfer: Points::whole(3),
            ..BattleConfig::default()
        };
        // 1% of 20 = 0.2 -> ceil 1 -> floor lifts to 3.
        assert_eq!(compute_transfer(Points::whole(20), &config, 0).transfer, Points::whole(3));
        // Loser only has 2: cap.
        assert_eq!(compute_transfer(Points::whole(2), &config, 0).transfer, Points::whole(2));
    }

    #[test]
    fn broke_loser_transfers_nothing() {
        let breakdown = compute_transfer(Points::ZERO, &BattleConfig::default(), 0);
        assert_eq!(breakdown.transfer, Points::ZERO);
        assert_eq!(breakdown.house, Points::ZERO);
        assert_eq!(breakdown.winner_gain, Points::ZERO);
    }

    #[test]
    fn anti_farm_surcharge_raises_house_cut() {
        let config = BattleConfig {
            transfer_bps: 1000,
            house_bps: 1000,
            pair_hourly_limit: 3,
            anti_farm_surcharge_bps: 2000,
            ..BattleConfig::default()
        };
        let below = compute_transfer(Points::whole(50), &config, 2);
        assert!(!below.surcharged);
        assert_eq!(below.house_bps, 1000);

        let at = compute_transfer(Points::whole(50), &config, 3);
        assert!(at.surcharged);
        assert_eq!(at.house_bps, 3000);
        assert_eq!(at.house, Points::from_units(150));
        assert_eq!(at.winner_gain, Points::from_units(350));
    }

    #[test]
    fn transfer_is_zero_sum_across_inputs() {
        for loser in [0, 1, 7, 13, 50, 99, 1234, 100_000] {
            for transfer_bps in [0, 1, 333, 1000, 2500, 10_000] {
                for house_bps in [0, 1, 777, 1000, 5000, 10_000] {
                    let config = BattleConfig {
                        transfer_bps,
                        house_bps,
                        ..BattleConfig::default()
                    };
                    let loser_points = Points::from_units(loser * 37);
                    let b = compute_transfer(loser_points, &config, 0);
                    assert_eq!(b.winner_gain + b.house, b.transfer);
                    assert!(b.transfer <= loser_points);
                    assert!(b.house >= Points::ZERO && b.winner_gain >= Points::ZERO);
                }
            }
        }
    }

    #[test]
    fn final_points_move_by_transfer() {
        let attacker = armed("0xa", 50, 10, 1);
        let defender = armed("0xb", 50, 1, 4);
        let config = BattleConfig {
            transfer_bps: 1000,
            house_bps: 1000,
            ..calm_config()
        };
        let mut rng = ScriptedRandom::new([0.5, 0.5, 0.9]);

        let outcome = resolve(&ctx(&attacker, &defender, &config), &mut rng);
        assert_eq!(outcome.attacker.points_after, Points::from_units(5450));
        assert_eq!(outcome.defender.points_after, Points::whole(45));
        assert_eq!(
            outcome.loser_outcome().points_after,
            outcome
                .loser_outcome()
                .points_before
                .saturating_sub(outcome.transfer.transfer)
        );
        assert!(outcome
            .effects
            .contains(&BattleEffect::PointsTransferred {
                amount: Points::whole(5)
            }));
    }

    // -- determinism and cooldown --

    #[test]
    fn identical_inputs_and_draws_replay_identically() {
        let attacker = armed("0xa", 80, 6, 3);
        let defender = armed("0xb", 60, 2, 6);
        let config = BattleConfig::default();
        let script = [0.42, 0.17, 0.61, 0.03];

        let first = resolve(&ctx(&attacker, &defender, &config), &mut ScriptedRandom::new(script));
        let second = resolve(&ctx(&attacker, &defender, &config), &mut ScriptedRandom::new(script));
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn pair_cooldown_from_now() {
        let attacker = armed("0xa", 50, 10, 1);
        let defender = armed("0xb", 50, 1, 4);
        let config = calm_config();
        let mut rng = ScriptedRandom::new([0.5, 0.5, 0.9]);
        let outcome = resolve(&ctx(&attacker, &defender, &config), &mut rng);
        assert_eq!(outcome.next_pair_cooldown_at, t0() + config.pair_cooldown);
    }
}
