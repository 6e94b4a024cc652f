//! Pure game rules for the bloblets arena.
//!
//! Nothing in this crate touches the database or reads the clock. Callers
//! pass `now` and a [`rng::RandomSource`] explicitly, so every rule here is
//! replayable from its inputs.

pub mod battle;
pub mod charge;
pub mod drop;
pub mod eligibility;
pub mod error;
pub mod fast_forward;
pub mod gear;
pub mod points;
pub mod rng;
pub mod types;
