//! Parameter extraction: guessing paths and hosts from untyped arguments.
//!
//! The host hands us a tool name and a JSON argument bag with no schema, so
//! the default [`HeuristicExtractor`] looks at well-known key names. A
//! stricter extractor (driven by real tool schemas, say) can be swapped in
//! through the [`ParameterExtractor`] trait without touching the evaluator.

use regex_lite::Regex;
use serde_json::Value;

use crate::rules::FsOperation;

/// Keys whose string values are treated as filesystem paths.
const PATH_KEYS: &[&str] = &[
    "path",
    "file_path",
    "filePath",
    "file",
    "filename",
    "directory",
    "dir",
];

/// Keys whose string values are parsed as URLs.
const URL_KEYS: &[&str] = &["url", "uri", "endpoint", "href"];

/// Keys whose string values are taken as bare hostnames.
const HOST_KEYS: &[&str] = &["host", "hostname", "server", "domain"];

/// Keys holding a shell command line.
const COMMAND_KEYS: &[&str] = &["command", "cmd"];

/// Tool-name fragments that mark a tool as writing.
const WRITE_HINTS: &[&str] = &[
    "write", "create", "edit", "patch", "delete", "move", "copy", "mkdir", "rm", "save",
];

/// A quoted absolute path inside a command line, e.g. `cat "/etc/hosts"`.
const QUOTED_ABSOLUTE_PATH: &str = r#"["'](/[^"']+)["']"#;

/// Candidate targets recovered from one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTargets {
    /// Deduplicated filesystem paths.
    pub paths: Vec<String>,
    /// Deduplicated hostnames.
    pub hosts: Vec<String>,
    /// The access the call is assumed to perform on `paths`.
    pub operation: FsOperation,
}

/// Strategy for turning `(tool_name, params)` into checkable targets.
pub trait ParameterExtractor: Send + Sync {
    fn extract(&self, tool_name: &str, params: &Value) -> ExtractedTargets;
}

/// Classify a tool as reading or writing from its name alone.
///
/// Best effort: a writing tool with an innocuous name is classified as a
/// read.
pub fn infer_operation(tool_name: &str) -> FsOperation {
    let lower = tool_name.to_lowercase();
    if WRITE_HINTS.iter().any(|hint| lower.contains(hint)) {
        FsOperation::Write
    } else {
        FsOperation::Read
    }
}

/// Key-name based extractor used when no tool schema is available.
#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    quoted_path: Option<Regex>,
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self {
            quoted_path: Regex::new(QUOTED_ABSOLUTE_PATH).ok(),
        }
    }
}

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn extract_paths(&self, tool_name: &str, params: &Value) -> Vec<String> {
        let mut paths = Vec::new();

        for key in PATH_KEYS {
            if let Some(s) = string_param(params, key) {
                push_unique(&mut paths, s);
            }
        }

        // Search tools pair a `pattern` with the root they search under.
        if params.get("pattern").is_some()
            && let Some(root) = string_param(params, "path")
        {
            push_unique(&mut paths, root);
        }

        let lower = tool_name.to_lowercase();
        if (lower.contains("bash") || lower.contains("shell"))
            && let Some(re) = &self.quoted_path
        {
            for key in COMMAND_KEYS {
                if let Some(command) = string_param(params, key) {
                    for cap in re.captures_iter(command) {
                        if let Some(m) = cap.get(1) {
                            push_unique(&mut paths, m.as_str());
                        }
                    }
                }
            }
        }

        paths
    }

    fn extract_hosts(&self, params: &Value) -> Vec<String> {
        let mut hosts = Vec::new();

        for key in URL_KEYS {
            if let Some(raw) = string_param(params, key)
                && let Ok(parsed) = url::Url::parse(raw)
                && let Some(host) = parsed.host_str()
            {
                push_unique(&mut hosts, host);
            }
        }

        for key in HOST_KEYS {
            if let Some(host) = string_param(params, key) {
                push_unique(&mut hosts, host);
            }
        }

        hosts
    }
}

impl ParameterExtractor for HeuristicExtractor {
    fn extract(&self, tool_name: &str, params: &Value) -> ExtractedTargets {
        ExtractedTargets {
            paths: self.extract_paths(tool_name, params),
            hosts: self.extract_hosts(params),
            operation: infer_operation(tool_name),
        }
    }
}

/// A non-empty string value at `key`; anything else is ignored.
fn string_param<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn push_unique(items: &mut Vec<String>, value: &str) {
    if !items.iter().any(|existing| existing == value) {
        items.push(value.to_string());
    }
}
