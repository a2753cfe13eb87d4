//! Rule matching: filesystem globs and network host patterns.
//!
//! Precedence is the same for both: a deny hit always wins, an empty allow
//! list means "unrestricted", and a non-empty allow list must be matched.
//! These functions are usable on their own for ad hoc audit queries.

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use skillbox_contracts::{FilesystemRules, NetworkRules};
use tracing::debug;

/// The kind of filesystem access a tool call is assumed to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsOperation {
    Read,
    Write,
}

impl std::fmt::Display for FsOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FsOperation::Read => f.write_str("read"),
            FsOperation::Write => f.write_str("write"),
        }
    }
}

/// `*` stays inside one segment, `**` spans segments, dotfiles are not special.
const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Return the first pattern in `patterns` that matches `path`.
///
/// Unparseable patterns match nothing.
pub fn first_matching_path<'a>(path: &str, patterns: &'a [String]) -> Option<&'a str> {
    patterns
        .iter()
        .find(|pattern| match Pattern::new(pattern) {
            Ok(p) => p.matches_with(path, GLOB_OPTIONS),
            Err(e) => {
                debug!(pattern = %pattern, "Skipping invalid glob pattern: {e}");
                false
            }
        })
        .map(String::as_str)
}

/// Does `path` match any of the glob `patterns`? Always false for an empty list.
pub fn path_matches_any(path: &str, patterns: &[String]) -> bool {
    first_matching_path(path, patterns).is_some()
}

/// Check a single path against one box's filesystem rules.
///
/// Returns `None` when access is permitted, or a message describing why not.
pub fn check_filesystem_access(
    path: &str,
    operation: FsOperation,
    rules: &FilesystemRules,
) -> Option<String> {
    if let Some(pattern) = first_matching_path(path, &rules.denied) {
        return Some(format!("Path '{path}' matches denied pattern '{pattern}'"));
    }

    let (allowed, label) = match operation {
        FsOperation::Read => (&rules.readable, "readable"),
        FsOperation::Write => (&rules.writable, "writable"),
    };

    if !allowed.is_empty() && !path_matches_any(path, allowed) {
        return Some(format!(
            "Path '{path}' is not covered by any {label} pattern ({} configured)",
            allowed.len()
        ));
    }

    None
}

/// Does `host` match a single host pattern?
///
/// - `*` matches any host
/// - `*.example.com` matches any subdomain of `example.com`, but not
///   `example.com` itself
/// - anything else must match exactly (ASCII case-insensitive)
pub fn host_matches(host: &str, pattern: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let pattern = pattern.trim().to_ascii_lowercase();

    if pattern == "*" {
        return true;
    }
    if let Some(suffix) = pattern.strip_prefix('*') {
        return suffix.starts_with('.') && host.ends_with(suffix) && host.len() > suffix.len();
    }
    host == pattern
}

/// Return the first pattern in `patterns` that matches `host`.
pub fn first_matching_host<'a>(host: &str, patterns: &'a [String]) -> Option<&'a str> {
    patterns
        .iter()
        .find(|p| host_matches(host, p))
        .map(String::as_str)
}

/// Check a single hostname against one box's network rules.
///
/// Returns `None` when access is permitted, or a message describing why not.
pub fn check_network_access(host: &str, rules: &NetworkRules) -> Option<String> {
    if let Some(pattern) = first_matching_host(host, &rules.denied_hosts) {
        return Some(format!("Host '{host}' matches denied host '{pattern}'"));
    }

    if !rules.allowed_hosts.is_empty() && first_matching_host(host, &rules.allowed_hosts).is_none()
    {
        return Some(format!(
            "Host '{host}' is not in allowed hosts ({} configured)",
            rules.allowed_hosts.len()
        ));
    }

    None
}
