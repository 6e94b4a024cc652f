//! Gear drop accumulator.
//!
//! Each charge attempt rolls against `base_probability` plus a carried-forward
//! accumulator. Misses feed the accumulator, so a drop is guaranteed within
//! `ceil(1 / base_probability)` attempts once an upgrade exists. Upgrades are
//! incremental: the smallest strictly-better item for the targeted slot.

use serde::{Deserialize, Serialize};

use crate::gear::{Item, ItemType, Loadout};
use crate::rng::RandomSource;

/// Default per-attempt drop probability before accumulation.
pub const DEFAULT_BASE_PROBABILITY: f64 = 0.2;

/// Summed probabilities this close to 1 count as certain, so float drift in
/// the accumulator never delays the guaranteed attempt.
const SATURATION_TOLERANCE: f64 = 1e-9;

/// Drop law parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DropConfig {
    pub base_probability: f64,
    /// With both slots empty, target the shield instead of flipping a coin.
    pub prefer_shield_when_empty: bool,
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            base_probability: DEFAULT_BASE_PROBABILITY,
            prefer_shield_when_empty: true,
        }
    }
}

/// How an attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropOutcome {
    /// Roll passed and an upgrade was awarded.
    Awarded,
    /// Roll passed but no catalog item beats the targeted slot.
    NoCandidate,
    /// Roll failed.
    Miss,
}

impl DropOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Awarded => "awarded",
            Self::NoCandidate => "no_candidate",
            Self::Miss => "miss",
        }
    }
}

/// Result of one drop attempt. Doubles as the telemetry record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropAttempt {
    pub awarded: bool,
    pub item: Option<Item>,
    pub slot: Option<ItemType>,
    pub roll: f64,
    /// Effective probability used for this roll.
    pub probability: f64,
    pub acc_before: f64,
    pub next_acc: f64,
    pub outcome: DropOutcome,
}

/// Roll once for a gear upgrade.
///
/// Draw order: the pass roll first, then (only if it passed and the slot
/// choice needs one) a coin for the slot.
pub fn attempt_drop<R: RandomSource + ?Sized>(
    loadout: &Loadout,
    catalog: &[Item],
    prior_acc: f64,
    config: &DropConfig,
    rng: &mut R,
) -> DropAttempt {
    let acc_before = prior_acc.clamp(0.0, 1.0);
    let mut effective = (config.base_probability + acc_before).min(1.0);
    if effective >= 1.0 - SATURATION_TOLERANCE {
        effective = 1.0;
    }
    let roll = rng.next_f64();
    let passed = effective >= 1.0 || roll <= effective;

    if !passed {
        return DropAttempt {
            awarded: false,
            item: None,
            slot: None,
            roll,
            probability: effective,
            acc_before,
            next_acc: effective.clamp(0.0, 1.0),
            outcome: DropOutcome::Miss,
        };
    }

    let slot = choose_slot(loadout, config, rng);
    match find_upgrade(catalog, slot, loadout.slot_stat(slot)) {
        Some(item) => DropAttempt {
            awarded: true,
            item: Some(item.clone()),
            slot: Some(slot),
            roll,
            probability: effective,
            acc_before,
            next_acc: (effective - 1.0).max(0.0),
            outcome: DropOutcome::Awarded,
        },
        // Guarantee-carry: a pass with nothing to give keeps the next attempt
        // at least one base step from certain.
        None => DropAttempt {
            awarded: false,
            item: None,
            slot: Some(slot),
            roll,
            probability: effective,
            acc_before,
            next_acc: effective.max(1.0 - config.base_probability).clamp(0.0, 1.0),
            outcome: DropOutcome::NoCandidate,
        },
    }
}

/// Pick the slot a passing roll upgrades.
fn choose_slot<R: RandomSource + ?Sized>(
    loadout: &Loadout,
    config: &DropConfig,
    rng: &mut R,
) -> ItemType {
    match (&loadout.weapon, &loadout.shield) {
        (None, Some(_)) => ItemType::Weapon,
        (Some(_), None) => ItemType::Shield,
        (None, None) if config.prefer_shield_when_empty => ItemType::Shield,
        (None, None) => coin(rng),
        (Some(weapon), Some(shield)) => match weapon.op.cmp(&shield.dp) {
            std::cmp::Ordering::Less => ItemType::Weapon,
            std::cmp::Ordering::Greater => ItemType::Shield,
            std::cmp::Ordering::Equal => coin(rng),
        },
    }
}

fn coin<R: RandomSource + ?Sized>(rng: &mut R) -> ItemType {
    if rng.next_f64() < 0.5 {
        ItemType::Weapon
    } else {
        ItemType::Shield
    }
}

/// Smallest strictly-better catalog item for `slot`. Ties go to the lowest id.
pub fn find_upgrade(catalog: &[Item], slot: ItemType, current_stat: i32) -> Option<&Item> {
    catalog
        .iter()
        .filter(|item| item.item_type == slot && item.slot_stat() > current_stat)
        .min_by_key(|item| (item.slot_stat(), item.id))
}

/// Equip an awarded item on a copy of `loadout`. Returns the new loadout and
/// the item it displaced, if any.
pub fn apply_drop(loadout: &Loadout, attempt: &DropAttempt) -> (Loadout, Option<Item>) {
    match (&attempt.item, attempt.slot) {
        (Some(item), Some(slot)) if attempt.awarded => loadout.with_item(slot, Some(item.clone())),
        _ => (loadout.clone(), None),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
