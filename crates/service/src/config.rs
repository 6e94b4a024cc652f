//! Service configuration loaded from environment variables.
//!
//! Every knob has a default suitable for local development. Values that fail
//! to parse are reported as [`ConfigError`] instead of silently falling back.

use std::str::FromStr;

use bloblets_core::battle::{BattleConfig, MAX_LUCK_VARIANCE};
use bloblets_core::charge::{ChargeConfig, ChargePricing};
use bloblets_core::drop::DropConfig;
use bloblets_core::fast_forward::FastForwardConfig;
use bloblets_core::points::Points;
use bloblets_core::types::{normalize_address, Address};
use chrono::Duration;

/// Default pool size for [`DbConfig`].
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;

/// Default system account credited with battle house cuts.
pub const DEFAULT_TREASURY_ADDRESS: &str = "treasury";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is required")]
    Missing { name: &'static str },

    #[error("{name}={value:?} is not a valid value: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
}

/// Economy switches that sit outside the pure rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EconomyConfig {
    /// With rewards off, nourishing is free and battles move no points.
    pub rewards_enabled: bool,
    /// Balance account that receives house cuts.
    pub treasury_address: Address,
    /// Bank stolen items the winner did not equip, instead of destroying them.
    pub bank_unequipped_loot: bool,
    /// Bank items pushed out of a slot by a drop or by equipped loot.
    pub bank_displaced_gear: bool,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            rewards_enabled: true,
            treasury_address: DEFAULT_TREASURY_ADDRESS.to_string(),
            bank_unequipped_loot: true,
            bank_displaced_gear: true,
        }
    }
}

/// Everything the orchestrators need, assembled once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub db: DbConfig,
    pub charge: ChargeConfig,
    pub pricing: ChargePricing,
    pub drop: DropConfig,
    pub fast_forward: FastForwardConfig,
    pub battle: BattleConfig,
    pub economy: EconomyConfig,
}

impl ServiceConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// | Env Var                          | Default     |
    /// |----------------------------------|-------------|
    /// | `DATABASE_URL`                   | (required)  |
    /// | `DB_MAX_CONNECTIONS`             | `20`        |
    /// | `CHARGE_COOLDOWN_SECS`           | `21600`     |
    /// | `CHARGE_BOOSTER_WINDOW_SECS`     | `14400`     |
    /// | `CHARGE_BOOSTER_LEVEL`           | `2`         |
    /// | `CHARGE_OVERDUE_GRACE_SECS`      | `86400`     |
    /// | `CHARGE_COST_POINTS`             | `10`        |
    /// | `UPKEEP_REWARD_POINTS`           | `2`         |
    /// | `DROP_BASE_PROBABILITY`          | `0.2`       |
    /// | `DROP_PREFER_SHIELD_WHEN_EMPTY`  | `true`      |
    /// | `FAST_FORWARD_ENABLED`           | `true`      |
    /// | `FAST_FORWARD_DAILY_BURSTS`      | `1`         |
    /// | `FAST_FORWARD_MAX_ATTEMPTS`      | `5`         |
    /// | `BATTLE_LUCK_VARIANCE`           | `0.25`      |
    /// | `BATTLE_TIE_BAND`                | `0.5`       |
    /// | `BATTLE_CRITICAL_CHANCE`         | `0.1`       |
    /// | `BATTLE_TRANSFER_BPS`            | `1000`      |
    /// | `BATTLE_HOUSE_BPS`               | `1000`      |
    /// | `BATTLE_MIN_TRANSFER_POINTS`     | `1`         |
    /// | `BATTLE_MIN_STAKE_POINTS`        | `10`        |
    /// | `BATTLE_PAIR_HOURLY_LIMIT`       | `3`         |
    /// | `BATTLE_ANTI_FARM_SURCHARGE_BPS` | `2000`      |
    /// | `BATTLE_DEFENDER_GRACE_SECS`     | `600`       |
    /// | `BATTLE_PAIR_COOLDOWN_SECS`      | `1800`      |
    /// | `REWARDS_ENABLED`                | `true`      |
    /// | `TREASURY_ADDRESS`               | `treasury`  |
    /// | `BANK_UNEQUIPPED_LOOT`           | `true`      |
    /// | `BANK_DISPLACED_GEAR`            | `true`      |
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let db = DbConfig {
            database_url: env.required("DATABASE_URL")?,
            max_connections: env.parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
        };

        let charge_defaults = ChargeConfig::default();
        let charge = ChargeConfig {
            cooldown: env.secs("CHARGE_COOLDOWN_SECS", charge_defaults.cooldown)?,
            booster_window: env.secs("CHARGE_BOOSTER_WINDOW_SECS", charge_defaults.booster_window)?,
            booster_level: env.parse("CHARGE_BOOSTER_LEVEL", charge_defaults.booster_level)?,
            overdue_grace: env.secs("CHARGE_OVERDUE_GRACE_SECS", charge_defaults.overdue_grace)?,
        };

        let pricing_defaults = ChargePricing::default();
        let pricing = ChargePricing {
            charge_cost: env.points("CHARGE_COST_POINTS", pricing_defaults.charge_cost)?,
            upkeep_reward: env.points("UPKEEP_REWARD_POINTS", pricing_defaults.upkeep_reward)?,
        };

        let drop_defaults = DropConfig::default();
        let drop = DropConfig {
            base_probability: env.probability(
                "DROP_BASE_PROBABILITY",
                drop_defaults.base_probability,
            )?,
            prefer_shield_when_empty: env.flag(
                "DROP_PREFER_SHIELD_WHEN_EMPTY",
                drop_defaults.prefer_shield_when_empty,
            )?,
        };
        if drop.base_probability <= 0.0 {
            return Err(ConfigError::Invalid {
                name: "DROP_BASE_PROBABILITY",
                value: drop.base_probability.to_string(),
                reason: "must be greater than 0".into(),
            });
        }

        let ff_defaults = FastForwardConfig::default();
        let fast_forward = FastForwardConfig {
            enabled: env.flag("FAST_FORWARD_ENABLED", ff_defaults.enabled)?,
            daily_bursts: env.parse("FAST_FORWARD_DAILY_BURSTS", ff_defaults.daily_bursts)?,
            max_attempts: env.parse("FAST_FORWARD_MAX_ATTEMPTS", ff_defaults.max_attempts)?,
        };

        let b = BattleConfig::default();
        let battle = BattleConfig {
            luck_variance: env.ranged("BATTLE_LUCK_VARIANCE", b.luck_variance, MAX_LUCK_VARIANCE)?,
            tie_band: env.ranged("BATTLE_TIE_BAND", b.tie_band, f64::MAX)?,
            critical_chance: env.probability("BATTLE_CRITICAL_CHANCE", b.critical_chance)?,
            transfer_bps: env.bps("BATTLE_TRANSFER_BPS", b.transfer_bps)?,
            house_bps: env.bps("BATTLE_HOUSE_BPS", b.house_bps)?,
            min_transfer: env.points("BATTLE_MIN_TRANSFER_POINTS", b.min_transfer)?,
            min_stake: env.points("BATTLE_MIN_STAKE_POINTS", b.min_stake)?,
            pair_hourly_limit: env.parse("BATTLE_PAIR_HOURLY_LIMIT", b.pair_hourly_limit)?,
            anti_farm_surcharge_bps: env.bps(
                "BATTLE_ANTI_FARM_SURCHARGE_BPS",
                b.anti_farm_surcharge_bps,
            )?,
            defender_grace: env.secs("BATTLE_DEFENDER_GRACE_SECS", b.defender_grace)?,
            pair_cooldown: env.secs("BATTLE_PAIR_COOLDOWN_SECS", b.pair_cooldown)?,
        };

        let e = EconomyConfig::default();
        let economy = EconomyConfig {
            rewards_enabled: env.flag("REWARDS_ENABLED", e.rewards_enabled)?,
            treasury_address: env
                .get("TREASURY_ADDRESS")
                .map(|v| normalize_address(&v))
                .unwrap_or(e.treasury_address),
            bank_unequipped_loot: env.flag("BANK_UNEQUIPPED_LOOT", e.bank_unequipped_loot)?,
            bank_displaced_gear: env.flag("BANK_DISPLACED_GEAR", e.bank_displaced_gear)?,
        };

        Ok(Self {
            db,
            charge,
            pricing,
            drop,
            fast_forward,
            battle,
            economy,
        })
    }

    /// Pricing actually billed. Free when rewards are disabled.
    pub fn effective_pricing(&self) -> ChargePricing {
        if self.economy.rewards_enabled {
            self.pricing
        } else {
            ChargePricing {
                charge_cost: Points::ZERO,
                upkeep_reward: Points::ZERO,
            }
        }
    }

    /// Battle rules actually applied. With rewards disabled no points move
    /// and no stake is required.
    pub fn effective_battle(&self) -> BattleConfig {
        if self.economy.rewards_enabled {
            self.battle.clone()
        } else {
            BattleConfig {
                transfer_bps: 0,
                min_transfer: Points::ZERO,
                min_stake: Points::ZERO,
                ..self.battle.clone()
            }
        }
    }
}

/// Typed access to a variable lookup.
struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name).ok_or(ConfigError::Missing { name })
    }

    fn parse<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value,
            }),
        }
    }

    fn flag(&self, name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.get(name).map(|v| v.to_ascii_lowercase()) {
            None => Ok(default),
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
            Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
            Some(value) => Err(ConfigError::Invalid {
                name,
                value,
                reason: "expected a boolean".into(),
            }),
        }
    }

    fn secs(&self, name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        let secs: u32 = self.parse(name, u32::try_from(default.num_seconds()).unwrap_or(u32::MAX))?;
        Ok(Duration::seconds(i64::from(secs)))
    }

    fn points(&self, name: &'static str, default: Points) -> Result<Points, ConfigError> {
        let value: f64 = self.parse(name, default.as_f64())?;
        Points::from_f64(value)
            .filter(|points| *points >= Points::ZERO)
            .ok_or_else(|| ConfigError::Invalid {
                name,
                value: value.to_string(),
                reason: "must be a non-negative number".into(),
            })
    }

    fn probability(&self, name: &'static str, default: f64) -> Result<f64, ConfigError> {
        self.ranged(name, default, 1.0)
    }

    /// A finite float within `0..=max`. Rejects NaN and infinities.
    fn ranged(&self, name: &'static str, default: f64, max: f64) -> Result<f64, ConfigError> {
        let value: f64 = self.parse(name, default)?;
        if !(0.0..=max).contains(&value) {
            return Err(ConfigError::Invalid {
                name,
                value: value.to_string(),
                reason: format!("must be a finite number within 0..={max}"),
            });
        }
        Ok(value)
    }

    fn bps(&self, name: &'static str, default: u32) -> Result<u32, ConfigError> {
        let value: u32 = self.parse(name, default)?;
        if value > 10_000 {
            return Err(ConfigError::Invalid {
                name,
                value: value.to_string(),
                reason: "basis points must be at most 10000".into(),
            });
        }
        Ok(value)
    }
}
