//! Orchestrators for the bloblets arena.
//!
//! [`care::CareService`] and [`battle::BattleService`] are the only components
//! that touch storage. Each request runs fetch-under-lock, pure resolution and
//! persistence inside one PostgreSQL transaction.

pub mod battle;
pub mod care;
pub mod config;
pub mod error;
mod fetch;
pub mod state;

pub use battle::{BattleReport, BattleService};
pub use care::{CareService, FastForwardRequest, NourishRequest, Payment};
pub use config::{ConfigError, ServiceConfig};
pub use error::{BattleError, CareError, ServiceError};
pub use state::{ServiceState, StartupError};
