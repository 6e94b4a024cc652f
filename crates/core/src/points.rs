//! Fixed-point reward points.
//!
//! Balances, costs and transfers are held as integer hundredths of a point so
//! that every split (transfer = house + winner gain) is exact. The JSON form is
//! a plain number (`4.5`) for display.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of stored units per whole point.
pub const UNITS_PER_POINT: i64 = 100;

/// Denominator for basis-point rates (10 000 bps = 100%).
pub const BPS_DENOMINATOR: i64 = 10_000;

/// An amount of reward points with two decimal places.
///
/// Arithmetic saturates at the `i64` bounds instead of overflowing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Points(i64);

impl Points {
    pub const ZERO: Points = Points(0);

    /// Build from whole points.
    pub const fn whole(points: i64) -> Self {
        Self(points.saturating_mul(UNITS_PER_POINT))
    }

    /// Build from raw hundredths, as stored in the database.
    pub const fn from_units(units: i64) -> Self {
        Self(units)
    }

    /// Raw hundredths, as stored in the database.
    pub const fn units(self) -> i64 {
        self.0
    }

    /// Round a decimal amount to the nearest hundredth. `None` for NaN and
    /// infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        value
            .is_finite()
            .then(|| Points((value * UNITS_PER_POINT as f64).round() as i64))
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / UNITS_PER_POINT as f64
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Subtract, flooring the result at zero.
    pub fn saturating_sub(self, rhs: Points) -> Points {
        Points(self.0.saturating_sub(rhs.0).max(0))
    }

    /// `self × bps / 10 000`, rounded up to the next whole point.
    pub fn mul_bps_ceil_whole(self, bps: u32) -> Points {
        let numerator = self.0.max(0) as i128 * bps as i128;
        let denominator = BPS_DENOMINATOR as i128 * UNITS_PER_POINT as i128;
        let whole = (numerator + denominator - 1) / denominator;
        Points(i64::try_from(whole).unwrap_or(i64::MAX).saturating_mul(UNITS_PER_POINT))
    }

    /// `self × bps / 10 000`, floored to the nearest hundredth.
    pub fn mul_bps_floor(self, bps: u32) -> Points {
        let product = self.0.max(0) as i128 * bps as i128 / BPS_DENOMINATOR as i128;
        Points(i64::try_from(product).unwrap_or(i64::MAX))
    }
}

impl Add for Points {
    type Output = Points;

    fn add(self, rhs: Points) -> Points {
        Points(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Points {
    fn add_assign(&mut self, rhs: Points) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Points {
    type Output = Points;

    fn sub(self, rhs: Points) -> Points {
        Points(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Points {
    type Output = Points;

    fn neg(self) -> Points {
        Points(self.0.saturating_neg())
    }
}

impl Mul<u32> for Points {
    type Output = Points;

    fn mul(self, rhs: u32) -> Points {
        Points(self.0.saturating_mul(i64::from(rhs)))
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = UNITS_PER_POINT as u64;
        write!(f, "{sign}{}.{:02}", abs / per, abs % per)
    }
}

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Points::from_f64(value)
            .ok_or_else(|| serde::de::Error::custom("points must be a finite number"))
    }
}
