//! Capability classification: the semantic fallback for unlisted tools.
//!
//! When no box names a tool explicitly, a classifier decides whether the
//! tool falls under one of the free-text capabilities the boxes allow or
//! deny (e.g. "Shell or command execution"). Classifiers are typically
//! LLM-backed, so they are slow and non-deterministic: the enforcement path
//! only ever reads cached classifications, and the calling layer is
//! responsible for invoking the classifier and populating the cache.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;

/// The outcome of classifying one tool name against the capability lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityClassification {
    /// Whether the tool falls under an allowed capability.
    pub allowed: bool,

    /// Human-readable explanation from the classifier.
    #[serde(default)]
    pub reason: String,

    /// The capability description the tool matched, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_capability: Option<String>,
}

impl CapabilityClassification {
    /// The tool matched an allowed capability.
    pub fn allowed(capability: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
            matched_capability: Some(capability.into()),
        }
    }

    /// The tool matched a denied capability.
    pub fn denied(capability: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            matched_capability: Some(capability.into()),
        }
    }

    /// The tool matched no capability at all.
    pub fn unmatched(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            matched_capability: None,
        }
    }
}

/// A semantic classifier for tool names.
///
/// Implementations must be deterministic enough that caching the answer per
/// tool name is acceptable: params are supplied for context but the result
/// is stored under the tool name alone.
#[async_trait]
pub trait CapabilityClassifier: Send + Sync {
    /// A short identifier for logs (e.g., "keyword", "llm").
    fn name(&self) -> &str;

    /// Classify `tool_name` against the allowed and denied capability lists.
    async fn classify(
        &self,
        tool_name: &str,
        params: &serde_json::Value,
        allowed_capabilities: &[String],
        denied_capabilities: &[String],
    ) -> std::result::Result<CapabilityClassification, ClassifierError>;
}
