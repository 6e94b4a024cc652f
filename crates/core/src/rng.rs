//! Randomness provider used by the drop and battle algorithms.
//!
//! Pure components never reach for a global RNG; every draw goes through a
//! [`RandomSource`] handed in by the caller, so a recorded sequence of draws
//! replays an outcome exactly.

use std::collections::VecDeque;

use rand::Rng;

/// A source of uniform floats in `[0, 1)`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

/// Production source backed by rand's thread-local CSPRNG.
///
/// Holds no generator state itself, so it is `Send` and can live across
/// `.await` points in the orchestrators.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRandom;

impl RandomSource for SystemRandom {
    fn next_f64(&mut self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Replays a fixed sequence of draws.
///
/// Once the script is exhausted the last value repeats (or `0.0` for an empty
/// script). Every value handed out is recorded in [`ScriptedRandom::drawn`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    script: VecDeque<f64>,
    last: f64,
    drawn: Vec<f64>,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            script: values.into_iter().collect(),
            last: 0.0,
            drawn: Vec::new(),
        }
    }

    /// A source that always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self {
            script: VecDeque::new(),
            last: value,
            drawn: Vec::new(),
        }
    }

    /// Values handed out so far, in draw order.
    pub fn drawn(&self) -> &[f64] {
        &self.drawn
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        if let Some(value) = self.script.pop_front() {
            self.last = value;
        }
        let value = self.last.clamp(0.0, 1.0 - f64::EPSILON);
        self.drawn.push(value);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_random_stays_in_unit_interval() {
        let mut rng = SystemRandom;
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn scripted_replays_then_repeats_last() {
        let mut rng = ScriptedRandom::new([0.1, 0.7]);
        assert_eq!(rng.next_f64(), 0.1);
        assert_eq!(rng.next_f64(), 0.7);
        assert_eq!(rng.next_f64(), 0.7);
        assert_eq!(rng.drawn(), &[0.1, 0.7, 0.7]);
    }

    #[test]
    fn scripted_clamps_out_of_range_values() {
        let mut rng = ScriptedRandom::new([1.5, -0.2]);
        assert!(rng.next_f64() < 1.0);
        assert_eq!(rng.next_f64(), 0.0);
    }

    #[test]
    fn constant_source() {
        let mut rng = ScriptedRandom::constant(0.99);
        assert_eq!(rng.next_f64(), 0.99);
        assert_eq!(rng.next_f64(), 0.99);
    }
}
