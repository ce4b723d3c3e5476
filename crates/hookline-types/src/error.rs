use thiserror::Error;

use crate::models::Tier;

/// Failure taxonomy for the generate operation. Validation and quota
/// failures happen before any external call; backend and parse failures
/// leave counters untouched. A counter update that fails after the
/// generation landed is logged and reconciled, never surfaced here.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("{reason}")]
    QuotaExceeded {
        reason: String,
        upgrade_required: bool,
        upgrade_hint: Option<Tier>,
    },

    #[error("generation backend unavailable: {detail}")]
    BackendUnavailable { detail: String },

    #[error("the model response contained no usable hooks")]
    NoHooksProduced,

    #[error("storage failure: {detail}")]
    Storage { detail: String },
}

impl GenerateError {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        GenerateError::Storage {
            detail: err.to_string(),
        }
    }
}
