//! Built-in keyword classifier.
//!
//! A deterministic stand-in for an LLM classifier. Capability descriptions
//! and tool names are both mapped onto a small set of behavior families
//! (shell, filesystem, network, ...); a tool falls under a capability when
//! they share a family. Denied capabilities are checked first.

use async_trait::async_trait;
use skillbox_core::{CapabilityClassification, CapabilityClassifier, ClassifierError};

struct Family {
    name: &'static str,
    /// Word prefixes that place a capability description in this family.
    capability_words: &'static [&'static str],
    /// Tool-name tokens that place a tool in this family.
    tool_tokens: &'static [&'static str],
}

const FAMILIES: &[Family] = &[
    Family {
        name: "shell",
        capability_words: &["shell", "command", "exec", "terminal", "process", "subprocess"],
        tool_tokens: &[
            "bash", "sh", "shell", "exec", "cmd", "command", "run", "spawn", "terminal",
            "process",
        ],
    },
    Family {
        name: "filesystem",
        capability_words: &["file", "filesystem", "disk", "director", "folder", "read", "writ"],
        tool_tokens: &[
            "file", "files", "read", "write", "dir", "fs", "path", "save", "cat", "ls", "glob",
            "grep", "edit", "mkdir",
        ],
    },
    Family {
        name: "network",
        capability_words: &[
            "network", "http", "web", "internet", "api", "url", "fetch", "request", "download",
        ],
        tool_tokens: &[
            "http", "https", "fetch", "url", "web", "request", "curl", "wget", "download",
            "upload", "api", "browse", "get", "post",
        ],
    },
    Family {
        name: "messaging",
        capability_words: &["email", "mail", "messag", "notif", "chat", "sms"],
        tool_tokens: &["email", "mail", "send", "message", "notify", "slack", "sms", "chat"],
    },
    Family {
        name: "database",
        capability_words: &["database", "sql", "query", "table"],
        tool_tokens: &["sql", "db", "query", "database", "table"],
    },
    Family {
        name: "credentials",
        capability_words: &["credential", "secret", "password", "token", "key"],
        tool_tokens: &["secret", "secrets", "credential", "password", "token", "vault", "keychain"],
    },
];

/// Matches tool names to capability descriptions through keyword families.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify synchronously; the async trait method delegates here.
    pub fn classify_name(
        &self,
        tool_name: &str,
        allowed_capabilities: &[String],
        denied_capabilities: &[String],
    ) -> CapabilityClassification {
        let tokens = tool_tokens(tool_name);
        let tool_families: Vec<&str> = FAMILIES
            .iter()
            .filter(|f| tokens.iter().any(|t| f.tool_tokens.contains(&t.as_str())))
            .map(|f| f.name)
            .collect();

        let shares_family = |capability: &str| {
            capability_families(capability)
                .iter()
                .find(|family| tool_families.contains(family))
                .copied()
        };

        for capability in denied_capabilities {
            if let Some(family) = shares_family(capability) {
                return CapabilityClassification::denied(
                    capability.clone(),
                    format!("'{tool_name}' looks like a {family} tool"),
                );
            }
        }

        for capability in allowed_capabilities {
            if let Some(family) = shares_family(capability) {
                return CapabilityClassification::allowed(
                    capability.clone(),
                    format!("'{tool_name}' looks like a {family} tool"),
                );
            }
        }

        CapabilityClassification::unmatched(if tool_families.is_empty() {
            format!("'{tool_name}' does not resemble any known kind of tool")
        } else {
            format!(
                "'{tool_name}' looks like a {} tool, which no capability covers",
                tool_families.join("/")
            )
        })
    }
}

#[async_trait]
impl CapabilityClassifier for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn classify(
        &self,
        tool_name: &str,
        _params: &serde_json::Value,
        allowed_capabilities: &[String],
        denied_capabilities: &[String],
    ) -> Result<CapabilityClassification, ClassifierError> {
        Ok(self.classify_name(tool_name, allowed_capabilities, denied_capabilities))
    }
}

/// Split `readFile`, `read_file`, `read-file` and `mcp__fs__read` into
/// lowercase tokens.
fn tool_tokens(tool_name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in tool_name.chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_numeric();
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn capability_families(capability: &str) -> Vec<&'static str> {
    let lower = capability.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    FAMILIES
        .iter()
        .filter(|f| {
            words
                .iter()
                .any(|w| f.capability_words.iter().any(|k| w.starts_with(k)))
        })
        .map(|f| f.name)
        .collect()
}
