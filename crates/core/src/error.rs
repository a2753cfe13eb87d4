//! Error types for the skillbox domain.
//!
//! Uses `thiserror` for ergonomic error definitions. The policy engine
//! never fails a decision; errors only arise in the collaborators around it.

use thiserror::Error;

/// The top-level error type for skillbox operations outside the pure core.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of a capability classifier call.
#[derive(Debug, Clone, Error)]
pub enum ClassifierError {
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Classifier request failed for {tool_name}: {reason}")]
    RequestFailed { tool_name: String, reason: String },
}
