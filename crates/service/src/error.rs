//! Typed error families for the care and battle orchestrators.
//!
//! Each error carries an HTTP-style status, a machine-readable code and
//! optional structured details, so an embedding transport can render a
//! consistent `{error, code, details}` body without knowing the variants.

use bloblets_core::eligibility::{Blocker, BlockerCode};
use bloblets_core::error::CoreError;
use bloblets_core::fast_forward::BurstRejection;
use bloblets_core::points::Points;
use bloblets_core::types::{Address, Timestamp};
use serde_json::{json, Value};
use uuid::Uuid;

const INTERNAL_ERROR: &str = "internal_error";
const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Common surface of the service error families.
pub trait ServiceError: std::error::Error {
    fn status(&self) -> u16;
    fn code(&self) -> &'static str;
    fn details(&self) -> Option<Value>;

    /// Whether this is an infrastructure failure rather than a domain error.
    fn is_internal(&self) -> bool {
        self.status() >= 500
    }

    /// Render the error body. Internal errors are logged and sanitised.
    fn body(&self) -> Value {
        if self.is_internal() {
            tracing::error!(error = %self, "Internal service error");
            return json!({ "error": INTERNAL_MESSAGE, "code": INTERNAL_ERROR });
        }
        let mut body = json!({ "error": self.to_string(), "code": self.code() });
        if let Some(details) = self.details() {
            body["details"] = details;
        }
        body
    }
}

// ---------------------------------------------------------------------------
// Care
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CareError {
    #[error("Bloblet {0} not found")]
    BlobletNotFound(Address),

    #[error("Charge is on cooldown until {cooldown_until}")]
    ChargeCooldown { cooldown_until: Timestamp },

    #[error("Payment of {required} points required, balance is {balance}")]
    PaymentRequired { required: Points, balance: Points },

    #[error("Care order {0} not found")]
    OrderMissing(Uuid),

    #[error("Care order {0} was already consumed")]
    OrderConflict(Uuid),

    #[error("Fast-forward is disabled")]
    FastForwardDisabled,

    #[error("Fast-forward is only available to newcomers")]
    IneligibleNewcomer,

    #[error("Daily fast-forward budget spent, resets at {reset_at}")]
    DailyCapReached { reset_at: Timestamp },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<BurstRejection> for CareError {
    fn from(rejection: BurstRejection) -> Self {
        match rejection {
            BurstRejection::Disabled => Self::FastForwardDisabled,
            BurstRejection::InvalidAttempts { .. } => Self::InvalidRequest(rejection.to_string()),
            BurstRejection::DebtActive { until } => Self::ChargeCooldown {
                cooldown_until: until,
            },
            BurstRejection::DailyCapReached { reset_at } => Self::DailyCapReached { reset_at },
            BurstRejection::NotNewcomer => Self::IneligibleNewcomer,
            BurstRejection::InsufficientBalance { required, balance } => {
                Self::PaymentRequired { required, balance }
            }
        }
    }
}

impl ServiceError for CareError {
    fn status(&self) -> u16 {
        match self {
            Self::BlobletNotFound(_) | Self::OrderMissing(_) => 404,
            Self::ChargeCooldown { .. } | Self::InvalidRequest(_) => 400,
            Self::PaymentRequired { .. } | Self::FastForwardDisabled | Self::IneligibleNewcomer => {
                403
            }
            Self::OrderConflict(_) => 409,
            Self::DailyCapReached { .. } => 429,
            Self::Core(CoreError::Validation(_)) => 400,
            Self::Core(CoreError::Corrupt(_)) | Self::Database(_) => 500,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::BlobletNotFound(_) => "bloblet_not_found",
            Self::ChargeCooldown { .. } => "charge_cooldown",
            Self::PaymentRequired { .. } => "payment_required",
            Self::OrderMissing(_) => "order_missing",
            Self::OrderConflict(_) => "order_conflict",
            Self::FastForwardDisabled => "fast_forward_disabled",
            Self::IneligibleNewcomer => "ineligible_newcomer",
            Self::DailyCapReached { .. } => "daily_cap_reached",
            Self::InvalidRequest(_) | Self::Core(CoreError::Validation(_)) => "invalid_request",
            Self::Core(CoreError::Corrupt(_)) | Self::Database(_) => INTERNAL_ERROR,
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            Self::ChargeCooldown { cooldown_until } => {
                Some(json!({ "cooldown_until": cooldown_until }))
            }
            Self::PaymentRequired { required, balance } => {
                Some(json!({ "required": required, "balance": balance }))
            }
            Self::DailyCapReached { reset_at } => Some(json!({ "reset_at": reset_at })),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Battle
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum BattleError {
    #[error("A bloblet cannot challenge itself")]
    SelfTarget,

    #[error("Bloblet {0} not found")]
    BlobletNotFound(Address),

    #[error("Defender {0} not found")]
    DefenderMissing(Address),

    #[error("Challenge not allowed: {}", .0.code.as_str())]
    Ineligible(Blocker),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<Blocker> for BattleError {
    fn from(blocker: Blocker) -> Self {
        Self::Ineligible(blocker)
    }
}

impl ServiceError for BattleError {
    fn status(&self) -> u16 {
        match self {
            Self::SelfTarget => 400,
            Self::BlobletNotFound(_) | Self::DefenderMissing(_) => 404,
            Self::Ineligible(blocker) => match blocker.code {
                BlockerCode::PairCooldown | BlockerCode::DefenderRecentlyLost => 429,
                BlockerCode::AttackerDead
                | BlockerCode::AttackerOverdue
                | BlockerCode::AttackerBalanceLow
                | BlockerCode::DefenderBalanceLow
                | BlockerCode::DefenderDead => 400,
            },
            Self::Core(CoreError::Validation(_)) => 400,
            Self::Core(CoreError::Corrupt(_)) | Self::Database(_) | Self::Serialization(_) => 500,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::SelfTarget => "self_target",
            Self::BlobletNotFound(_) => "bloblet_not_found",
            Self::DefenderMissing(_) => "defender_missing",
            Self::Ineligible(blocker) => blocker.code.as_str(),
            Self::Core(CoreError::Validation(_)) => "invalid_request",
            Self::Core(CoreError::Corrupt(_)) | Self::Database(_) | Self::Serialization(_) => {
                INTERNAL_ERROR
            }
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            Self::Ineligible(blocker) => {
                let mut details = serde_json::to_value(&blocker.details).ok()?;
                details["role"] = json!(blocker.role);
                Some(details)
            }
            _ => None,
        }
    }
}
