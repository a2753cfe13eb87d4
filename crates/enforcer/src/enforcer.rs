//! The enforcer: owns the current policy snapshot and capability cache,
//! evaluates tool calls, and turns violations into decisions.

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use skillbox_config::{AppConfig, EnforcementMode};
use skillbox_contracts::{ContractSet, load_dir};
use skillbox_core::{CapabilityClassifier, ToolCall};
use skillbox_policy::{
    CapabilityCache, GlobalPolicy, Severity, ToolCallMatcher, Violation, ViolationType,
    build_global_policy,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::EnforcerError;
use crate::audit::{AuditEntry, AuditOutcome, AuditSink, TracingSink};
use crate::classifier::KeywordClassifier;
use crate::counter::ToolCallCounter;
use crate::log::ViolationLog;

/// Runtime options, usually derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct EnforcerOptions {
    pub mode: EnforcementMode,
    /// Lowest severity that blocks a call in enforce mode.
    pub block_severity: Severity,
    pub violation_log_capacity: usize,
    /// Applied to boxes without `behavior.maxToolCalls`.
    pub default_max_tool_calls: Option<u32>,
    /// Consult cached capability classifications for unlisted tools.
    pub capabilities_enabled: bool,
}

impl Default for EnforcerOptions {
    fn default() -> Self {
        Self {
            mode: EnforcementMode::Monitor,
            block_severity: Severity::High,
            violation_log_capacity: 1000,
            default_max_tool_calls: None,
            capabilities_enabled: true,
        }
    }
}

impl EnforcerOptions {
    pub fn from_config(config: &AppConfig) -> Result<Self, EnforcerError> {
        let block_severity: Severity = config
            .block_severity
            .parse()
            .map_err(EnforcerError::InvalidOption)?;
        Ok(Self {
            mode: config.mode,
            block_severity,
            violation_log_capacity: config.violation_log_capacity,
            default_max_tool_calls: config.default_max_tool_calls,
            capabilities_enabled: config.capabilities.enabled,
        })
    }
}

/// The outcome of checking one tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the host should let the call run.
    pub allowed: bool,
    pub mode: EnforcementMode,
    pub violations: Vec<Violation>,
}

impl Decision {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// The most severe violation, if any.
    pub fn max_severity(&self) -> Option<Severity> {
        self.violations.iter().map(|v| v.severity).max()
    }
}

/// Policy snapshot and the cache derived from it. They live under one lock
/// so a rebuild never leaves classifications from the old policy behind.
struct PolicyState {
    policy: Arc<GlobalPolicy>,
    cache: CapabilityCache,
}

/// Evaluates tool calls against the boxes currently loaded.
///
/// Thread-safe. Evaluation only takes a read lock; `reload` and classifier
/// results take the write lock briefly.
pub struct Enforcer {
    state: RwLock<PolicyState>,
    matcher: ToolCallMatcher,
    classifier: Option<Arc<dyn CapabilityClassifier>>,
    options: EnforcerOptions,
    log: ViolationLog,
    counter: ToolCallCounter,
    sinks: Vec<Box<dyn AuditSink>>,
}

impl Enforcer {
    /// Create an enforcer over `set` with no classifier and no sinks.
    pub fn new(set: &ContractSet, options: EnforcerOptions) -> Self {
        let policy = build_global_policy(&set.boxes);
        info!(
            boxes = policy.box_count(),
            mode = ?options.mode,
            "Enforcer initialised"
        );
        Self {
            state: RwLock::new(PolicyState {
                policy: Arc::new(policy),
                cache: CapabilityCache::new(),
            }),
            matcher: ToolCallMatcher::new(),
            classifier: None,
            log: ViolationLog::new(options.violation_log_capacity),
            counter: ToolCallCounter::new(),
            sinks: Vec::new(),
            options,
        }
    }

    /// Build an enforcer from configuration: options, the configured
    /// classifier, and a tracing sink.
    pub fn from_config(config: &AppConfig, set: &ContractSet) -> Result<Self, EnforcerError> {
        config.validate()?;
        let options = EnforcerOptions::from_config(config)?;
        let mut enforcer = Self::new(set, options).with_sink(TracingSink);
        match config.capabilities.classifier.as_str() {
            "keyword" => enforcer = enforcer.with_classifier(Arc::new(KeywordClassifier::new())),
            "none" => {}
            other => {
                return Err(EnforcerError::InvalidOption(format!(
                    "unknown classifier '{other}'"
                )));
            }
        }
        Ok(enforcer)
    }

    /// Load boxes from the configured directory and build an enforcer.
    pub fn load(config: &AppConfig) -> Result<Self, EnforcerError> {
        let set = load_dir(&config.boxes_dir())?;
        Self::from_config(config, &set)
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn CapabilityClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_sink(mut self, sink: impl AuditSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn options(&self) -> &EnforcerOptions {
        &self.options
    }

    /// Rebuild the global policy from `set`. The new snapshot replaces the
    /// old one and the capability cache is emptied in the same critical
    /// section.
    pub fn reload(&self, set: &ContractSet) {
        let policy = Arc::new(build_global_policy(&set.boxes));
        let boxes = policy.box_count();

        let mut state = self.state.write();
        let dropped = state.cache.len();
        state.policy = policy;
        state.cache.clear();
        drop(state);

        info!(boxes, dropped_classifications = dropped, "Policy reloaded");
    }

    /// The current policy. Callers may evaluate against it without holding
    /// any lock.
    pub fn snapshot(&self) -> Arc<GlobalPolicy> {
        Arc::clone(&self.state.read().policy)
    }

    /// Check a tool call using only what is already cached.
    pub fn check(&self, tool_name: &str, params: &Value) -> Decision {
        let (policy, mut violations) = {
            let state = self.state.read();
            let cache = self.options.capabilities_enabled.then_some(&state.cache);
            let violations = self
                .matcher
                .match_tool_call(tool_name, params, &state.policy, cache);
            (Arc::clone(&state.policy), violations)
        };

        violations.extend(self.count_call(tool_name, &policy));

        let allowed = match self.options.mode {
            EnforcementMode::Monitor => true,
            EnforcementMode::Enforce => !violations
                .iter()
                .any(|v| v.severity >= self.options.block_severity),
        };

        if violations.is_empty() {
            debug!(tool = %tool_name, "Tool call clean");
        } else {
            self.record(&violations, allowed);
            debug!(
                tool = %tool_name,
                violations = violations.len(),
                allowed,
                "Tool call has violations"
            );
        }

        Decision {
            allowed,
            mode: self.options.mode,
            violations,
        }
    }

    /// Check a tool call, first classifying it against the capability lists
    /// when it is unlisted and not yet cached.
    pub async fn check_with_classifier(&self, tool_name: &str, params: &Value) -> Decision {
        if let Some(classifier) = &self.classifier
            && let Some(policy) = self.needs_classification(tool_name)
        {
            match classifier
                .classify(
                    tool_name,
                    params,
                    &policy.all_allowed_capabilities,
                    &policy.all_denied_capabilities,
                )
                .await
            {
                Ok(classification) => {
                    let mut state = self.state.write();
                    if Arc::ptr_eq(&state.policy, &policy) {
                        debug!(
                            tool = %tool_name,
                            classifier = classifier.name(),
                            allowed = classification.allowed,
                            "Cached capability classification"
                        );
                        state.cache.insert(tool_name, classification);
                    } else {
                        debug!(tool = %tool_name, "Policy reloaded during classification, discarding result");
                    }
                }
                Err(e) => {
                    warn!(
                        tool = %tool_name,
                        classifier = classifier.name(),
                        error = %e,
                        "Capability classification failed"
                    );
                }
            }
        }

        self.check(tool_name, params)
    }

    /// [`Self::check_with_classifier`] for a parsed [`ToolCall`].
    pub async fn check_call(&self, call: &ToolCall) -> Decision {
        self.check_with_classifier(&call.name, &call.params).await
    }

    pub fn log(&self) -> &ViolationLog {
        &self.log
    }

    pub fn counter(&self) -> &ToolCallCounter {
        &self.counter
    }

    pub fn cache_len(&self) -> usize {
        self.state.read().cache.len()
    }

    pub fn box_count(&self) -> usize {
        self.state.read().policy.box_count()
    }

    /// The policy to classify against, when the tool needs a classification.
    fn needs_classification(&self, tool_name: &str) -> Option<Arc<GlobalPolicy>> {
        if !self.options.capabilities_enabled {
            return None;
        }
        let state = self.state.read();
        let policy = &state.policy;
        let needed = policy.claiming_skills(tool_name).is_empty()
            && policy.denied_tool(tool_name).is_none()
            && !policy.is_empty()
            && policy.has_capabilities()
            && !state.cache.contains(tool_name);
        needed.then(|| Arc::clone(policy))
    }

    /// Count the call against every claiming skill and flag skills that
    /// went past their bound.
    fn count_call(&self, tool_name: &str, policy: &GlobalPolicy) -> Vec<Violation> {
        let mut violations = Vec::new();
        for skill in policy.claiming_skills(tool_name) {
            let count = self.counter.record(skill);
            let limit = policy
                .boxes
                .get(skill)
                .and_then(|b| b.behavior.max_tool_calls)
                .or(self.options.default_max_tool_calls);
            if let Some(limit) = limit
                && count > limit
            {
                violations.push(
                    Violation::new(
                        ViolationType::MaxToolCallsExceeded,
                        Severity::High,
                        skill.as_str(),
                        tool_name,
                        format!("Skill '{skill}' made {count} tool calls, exceeding its limit of {limit}"),
                        "behavior.maxToolCalls",
                    )
                    .with_details(json!({ "count": count, "limit": limit })),
                );
            }
        }
        violations
    }

    fn record(&self, violations: &[Violation], allowed: bool) {
        let outcome = if allowed {
            AuditOutcome::Flagged
        } else {
            AuditOutcome::Blocked
        };
        for violation in violations {
            if !self.sinks.is_empty() {
                let entry = AuditEntry {
                    timestamp: Utc::now(),
                    outcome,
                    violation: violation.clone(),
                };
                for sink in &self.sinks {
                    sink.record(&entry);
                }
            }
            self.log.record(violation.clone());
        }
    }
}
