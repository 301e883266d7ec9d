//! Error types for pathscout

use thiserror::Error;

use crate::types::ScanState;

/// Main error type for scan operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("a scan is already {0}")]
    AlreadyRunning(ScanState),

    #[error("cannot {action} a scan that is {state}")]
    InvalidTransition {
        action: &'static str,
        state: ScanState,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for scan operations
pub type Result<T> = std::result::Result<T, ScanError>;
