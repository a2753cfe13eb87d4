//! Violation records: the sole output of the policy engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of rule breaches the engine can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    /// The tool is denied by at least one box and allowed by none.
    DeniedTool,
    /// No box names the tool and no capability covers it.
    UnlistedTool,
    /// The tool was classified under a denied capability.
    DeniedCapability,
    /// The tool was classified but matched no capability at all.
    UnlistedCapability,
    /// A path matched a denied pattern of some box.
    FilesystemDenied,
    FilesystemReadViolation,
    FilesystemWriteViolation,
    NetworkViolation,
    /// A skill went past its `maxToolCalls` bound. Produced by call
    /// counters outside the evaluator.
    MaxToolCallsExceeded,
}

impl ViolationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationType::DeniedTool => "denied_tool",
            ViolationType::UnlistedTool => "unlisted_tool",
            ViolationType::DeniedCapability => "denied_capability",
            ViolationType::UnlistedCapability => "unlisted_capability",
            ViolationType::FilesystemDenied => "filesystem_denied",
            ViolationType::FilesystemReadViolation => "filesystem_read_violation",
            ViolationType::FilesystemWriteViolation => "filesystem_write_violation",
            ViolationType::NetworkViolation => "network_violation",
            ViolationType::MaxToolCallsExceeded => "max_tool_calls_exceeded",
        }
    }
}

impl std::fmt::Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgent a violation is. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// One detected breach of policy.
///
/// Produced fresh for every evaluation and never mutated afterwards; the
/// engine persists nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
    pub severity: Severity,
    /// Attributed skill: an ID, a comma-joined list of IDs, or `"unknown"`.
    pub skill_id: String,
    pub tool_name: String,
    pub message: String,
    /// The specific rule that was broken.
    pub rule: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl Violation {
    pub fn new(
        violation_type: ViolationType,
        severity: Severity,
        skill_id: impl Into<String>,
        tool_name: impl Into<String>,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            violation_type,
            severity,
            skill_id: skill_id.into(),
            tool_name: tool_name.into(),
            message: message.into(),
            rule: rule.into(),
            timestamp: Utc::now(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Whether two violations describe the same finding, ignoring the
    /// random ID and the timestamp.
    pub fn same_finding(&self, other: &Violation) -> bool {
        self.violation_type == other.violation_type
            && self.severity == other.severity
            && self.skill_id == other.skill_id
            && self.tool_name == other.tool_name
            && self.message == other.message
            && self.rule == other.rule
            && self.details == other.details
    }

    /// The skill IDs this violation is attributed to.
    pub fn skill_ids(&self) -> impl Iterator<Item = &str> {
        self.skill_id.split(',').map(str::trim).filter(|s| !s.is_empty())
    }
}
