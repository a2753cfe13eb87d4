//! Audit sinks: where recorded violations are forwarded.
//!
//! Alert delivery and formatting live outside skillbox; sinks are the seam
//! they plug into.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use skillbox_policy::Violation;

/// A single audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub outcome: AuditOutcome,
    pub violation: Violation,
}

/// What happened to the call that produced the violation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The call was blocked (enforce mode).
    Blocked,
    /// The call went ahead; the violation was only recorded.
    Flagged,
}

/// Trait for audit log sinks (where entries are written).
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: &AuditEntry);
}

/// A tracing-based audit sink that logs entries via `tracing::warn!`.
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&self, entry: &AuditEntry) {
        let v = &entry.violation;
        tracing::warn!(
            outcome = ?entry.outcome,
            violation = %v.violation_type,
            severity = %v.severity,
            skill = %v.skill_id,
            tool = %v.tool_name,
            rule = %v.rule,
            "{}",
            v.message
        );
    }
}

/// In-memory sink that keeps every entry. Useful for testing and for
/// hosts that drain entries into their own alerting.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }

    /// Remove and return every stored entry.
    pub fn drain(&self) -> Vec<AuditEntry> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }
}

impl AuditSink for MemorySink {
    fn record(&self, entry: &AuditEntry) {
        self.entries.lock().push(entry.clone());
    }
}

impl<T: AuditSink + ?Sized> AuditSink for std::sync::Arc<T> {
    fn record(&self, entry: &AuditEntry) {
        (**self).record(entry);
    }
}
