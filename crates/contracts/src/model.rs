//! Box data model: the types that define a skill's behavioral contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ContractError;

/// A set of boxes loaded from configuration, in load order.
///
/// Load order matters: the global policy lists claiming skills in the order
/// their boxes appear here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractSet {
    #[serde(default)]
    pub boxes: Vec<Contract>,
}

impl ContractSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a box set from a TOML string (`[[boxes]]` tables).
    pub fn from_toml(toml_str: &str) -> Result<Self, ContractError> {
        let set: ContractSet = toml::from_str(toml_str)?;
        set.validate()?;
        Ok(set)
    }

    /// Load a box set from a JSON string (`{"boxes": [...]}`).
    pub fn from_json(json_str: &str) -> Result<Self, ContractError> {
        let set: ContractSet = serde_json::from_str(json_str)?;
        set.validate()?;
        Ok(set)
    }

    /// Add a box. A box with the same skill ID is replaced wholesale,
    /// keeping its position in load order.
    pub fn add(&mut self, contract: Contract) {
        match self
            .boxes
            .iter_mut()
            .find(|c| c.skill_id == contract.skill_id)
        {
            Some(existing) => *existing = contract,
            None => self.boxes.push(contract),
        }
    }

    /// Remove a box by skill ID.  Returns `true` if found.
    pub fn remove(&mut self, skill_id: &str) -> bool {
        let before = self.boxes.len();
        self.boxes.retain(|c| c.skill_id != skill_id);
        self.boxes.len() < before
    }

    pub fn get(&self, skill_id: &str) -> Option<&Contract> {
        self.boxes.iter().find(|c| c.skill_id == skill_id)
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Validate every box in the set. A skill ID may appear only once.
    pub fn validate(&self) -> Result<(), ContractError> {
        let mut seen = HashSet::new();
        for contract in &self.boxes {
            contract.validate()?;
            if !seen.insert(contract.skill_id.as_str()) {
                return Err(contract.invalid("skillId appears in more than one box"));
            }
        }
        Ok(())
    }
}

/// A single box: the behavioral contract of one skill.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    /// Unique identifier of the skill this box governs.
    pub skill_id: String,

    /// Human-readable skill name.
    #[serde(default)]
    pub skill_name: String,

    /// Tools the skill may invoke, in authoring order.
    #[serde(default)]
    pub allowed_tools: Vec<ToolRule>,

    /// Tools the skill must never invoke.
    #[serde(default)]
    pub denied_tools: Vec<ToolRule>,

    /// Conceptual capabilities the skill may use, for tools no box names.
    #[serde(default)]
    pub allowed_capabilities: Vec<String>,

    /// Conceptual capabilities the skill must never use.
    #[serde(default)]
    pub denied_capabilities: Vec<String>,

    #[serde(default)]
    pub filesystem: FilesystemRules,

    #[serde(default)]
    pub network: NetworkRules,

    #[serde(default)]
    pub behavior: BehaviorRules,

    #[serde(default)]
    pub drift: DriftInfo,
}

/// A named tool together with the reason it is allowed or denied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolRule {
    pub name: String,
    #[serde(default)]
    pub reason: String,
}

impl ToolRule {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Glob patterns bounding filesystem access.
///
/// An empty `readable` or `writable` list leaves that operation
/// unrestricted; `denied` always wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilesystemRules {
    #[serde(default)]
    pub readable: Vec<String>,
    #[serde(default)]
    pub writable: Vec<String>,
    #[serde(default)]
    pub denied: Vec<String>,
}

/// Hostname patterns bounding network access.
///
/// Patterns are exact hostnames, `*` (any host), or `*.suffix` (any
/// subdomain of suffix, excluding the bare suffix itself).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRules {
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
    #[serde(default)]
    pub denied_hosts: Vec<String>,
}

/// Free-text guidance plus an optional bound on tool calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorRules {
    #[serde(default)]
    pub guidance: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tool_calls: Option<u32>,
}

/// Provenance of a box, consumed by drift detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriftInfo {
    /// Hash of the skill definition the box was generated against.
    #[serde(default)]
    pub skill_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review_status: ReviewStatus,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl Contract {
    /// Create an empty box for a skill. Everything is open until rules are added.
    pub fn new(skill_id: impl Into<String>, skill_name: impl Into<String>) -> Self {
        Self {
            skill_id: skill_id.into(),
            skill_name: skill_name.into(),
            ..Self::default()
        }
    }

    /// Does this box list `tool_name` under `allowedTools`?
    pub fn allows_tool(&self, tool_name: &str) -> bool {
        self.allowed_tools.iter().any(|t| t.name == tool_name)
    }

    /// Does this box list `tool_name` under `deniedTools`?
    pub fn denies_tool(&self, tool_name: &str) -> bool {
        self.denied_tools.iter().any(|t| t.name == tool_name)
    }

    /// Validate that the box is well-formed.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.skill_id.trim().is_empty() {
            return Err(self.invalid("skillId cannot be empty"));
        }

        for (list, rules) in [
            ("allowedTools", &self.allowed_tools),
            ("deniedTools", &self.denied_tools),
        ] {
            let mut seen = HashSet::new();
            for rule in rules {
                if rule.name.trim().is_empty() {
                    return Err(self.invalid(format!("{list} contains an empty tool name")));
                }
                if !seen.insert(rule.name.as_str()) {
                    return Err(
                        self.invalid(format!("{list} lists '{}' more than once", rule.name))
                    );
                }
            }
        }

        let fs = &self.filesystem;
        for pattern in fs.readable.iter().chain(&fs.writable).chain(&fs.denied) {
            if let Err(e) = glob::Pattern::new(pattern) {
                return Err(self.invalid(format!("invalid glob pattern '{pattern}': {e}")));
            }
        }

        let net = &self.network;
        if net
            .allowed_hosts
            .iter()
            .chain(&net.denied_hosts)
            .any(|h| h.trim().is_empty())
        {
            return Err(self.invalid("host patterns cannot be empty"));
        }

        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> ContractError {
        ContractError::InvalidContract {
            skill_id: if self.skill_id.is_empty() {
                "(empty)".into()
            } else {
                self.skill_id.clone()
            },
            reason: reason.into(),
        }
    }
}
