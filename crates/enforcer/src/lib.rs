//! Enforcement layer for skillbox.
//!
//! The policy engine in `skillbox-policy` is pure; this crate is the layer
//! that calls it. It provides:
//! - **Snapshot ownership**: the current `GlobalPolicy` and capability cache,
//!   rebuilt and swapped together under one lock
//! - **Classification**: invoking a `CapabilityClassifier` for unlisted tools
//!   and caching the answer
//! - **Decisions**: enforce vs. monitor mode
//! - **Bookkeeping**: per-skill tool-call counters, a bounded log of recent
//!   violations, and audit sinks

pub mod audit;
pub mod classifier;
pub mod counter;
pub mod enforcer;
pub mod log;

pub use audit::{AuditEntry, AuditOutcome, AuditSink, MemorySink, TracingSink};
pub use classifier::KeywordClassifier;
pub use counter::ToolCallCounter;
pub use enforcer::{Decision, Enforcer, EnforcerOptions};
pub use log::ViolationLog;

/// Errors from the enforcement layer.
#[derive(Debug, thiserror::Error)]
pub enum EnforcerError {
    #[error("failed to load boxes: {0}")]
    Contract(#[from] skillbox_contracts::ContractError),

    #[error("configuration error: {0}")]
    Config(#[from] skillbox_config::ConfigError),

    #[error("invalid enforcer option: {0}")]
    InvalidOption(String),
}
