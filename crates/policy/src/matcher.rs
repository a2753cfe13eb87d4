//! Tool call evaluation.
//!
//! Given a tool name, its argument bag and a [`GlobalPolicy`], produce every
//! violation the call commits. Checks run in a fixed order:
//!
//! 1. global tool denial (short-circuits)
//! 2. attribution to the boxes that claim the tool
//! 3. unlisted tool, or the cached capability classification for it
//! 4. extraction of paths and hosts from the arguments
//! 5. globally denied paths, then globally denied hosts
//! 6. per-claimant filesystem and network rules, where any one claimant
//!    permitting a target is enough

use serde_json::{Value, json};
use skillbox_core::CapabilityClassification;
use tracing::debug;

use crate::cache::CapabilityCache;
use crate::extract::{ExtractedTargets, HeuristicExtractor, ParameterExtractor};
use crate::global::GlobalPolicy;
use crate::rules::{
    FsOperation, check_filesystem_access, check_network_access, first_matching_host,
    first_matching_path,
};
use crate::violation::{Severity, Violation, ViolationType};

/// Attribution used when no box claims a tool.
pub const UNKNOWN_SKILL: &str = "unknown";

/// Evaluate one tool call with the default heuristic extractor.
pub fn match_tool_call(
    tool_name: &str,
    params: &Value,
    policy: &GlobalPolicy,
    capability_cache: Option<&CapabilityCache>,
) -> Vec<Violation> {
    ToolCallMatcher::new().match_tool_call(tool_name, params, policy, capability_cache)
}

/// A stateless evaluator parameterised by its extraction strategy.
///
/// Safe to share across threads; all state lives in the policy snapshot
/// and cache passed to each call.
#[derive(Debug, Clone, Default)]
pub struct ToolCallMatcher<E = HeuristicExtractor> {
    extractor: E,
}

impl ToolCallMatcher<HeuristicExtractor> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: ParameterExtractor> ToolCallMatcher<E> {
    pub fn with_extractor(extractor: E) -> Self {
        Self { extractor }
    }

    pub fn match_tool_call(
        &self,
        tool_name: &str,
        params: &Value,
        policy: &GlobalPolicy,
        capability_cache: Option<&CapabilityCache>,
    ) -> Vec<Violation> {
        if let Some(denied) = policy.denied_tool(tool_name) {
            let skills = denied.denying_skill_ids.join(",");
            debug!(tool = %tool_name, skills = %skills, "Tool globally denied");
            return vec![
                Violation::new(
                    ViolationType::DeniedTool,
                    Severity::Critical,
                    skills.clone(),
                    tool_name,
                    format!(
                        "Tool '{tool_name}' is denied by {}: {}",
                        skills,
                        if denied.reason.is_empty() {
                            "no reason given"
                        } else {
                            denied.reason.as_str()
                        }
                    ),
                    format!("deniedTools: {tool_name}"),
                )
                .with_details(json!({
                    "denyingSkills": denied.denying_skill_ids,
                    "reason": denied.reason,
                })),
            ];
        }

        let claiming = policy.claiming_skills(tool_name);
        let mut violations = Vec::new();

        if claiming.is_empty() && !policy.is_empty() {
            let cached = match capability_cache {
                Some(cache) if policy.has_capabilities() => cache.get(tool_name),
                _ => None,
            };
            match cached {
                Some(classification) => {
                    violations.extend(capability_violation(tool_name, classification, policy));
                }
                None => violations.push(unlisted_tool(tool_name, policy)),
            }
        }

        let targets = self.extractor.extract(tool_name, params);
        let attributed = claiming
            .first()
            .map(String::as_str)
            .unwrap_or(UNKNOWN_SKILL);

        let mut flagged_paths: Vec<&str> = Vec::new();
        for path in &targets.paths {
            if let Some(pattern) = first_matching_path(path, &policy.global_denied_paths) {
                flagged_paths.push(path);
                violations.push(
                    Violation::new(
                        ViolationType::FilesystemDenied,
                        Severity::Critical,
                        attributed,
                        tool_name,
                        format!("Path '{path}' matches globally denied pattern '{pattern}'"),
                        pattern,
                    )
                    .with_details(json!({ "path": path, "pattern": pattern })),
                );
            }
        }

        let mut flagged_hosts: Vec<&str> = Vec::new();
        for host in &targets.hosts {
            if let Some(pattern) = first_matching_host(host, &policy.global_denied_hosts) {
                flagged_hosts.push(host);
                violations.push(
                    Violation::new(
                        ViolationType::NetworkViolation,
                        Severity::Critical,
                        attributed,
                        tool_name,
                        format!("Host '{host}' matches globally denied host '{pattern}'"),
                        pattern,
                    )
                    .with_details(json!({ "host": host, "pattern": pattern })),
                );
            }
        }

        if !claiming.is_empty() {
            violations.extend(claimant_violations(
                tool_name,
                claiming,
                policy,
                &targets,
                &flagged_paths,
                &flagged_hosts,
            ));
        }

        debug!(
            tool = %tool_name,
            claimants = claiming.len(),
            paths = targets.paths.len(),
            hosts = targets.hosts.len(),
            violations = violations.len(),
            "Evaluated tool call"
        );

        violations
    }
}

fn unlisted_tool(tool_name: &str, policy: &GlobalPolicy) -> Violation {
    Violation::new(
        ViolationType::UnlistedTool,
        Severity::High,
        UNKNOWN_SKILL,
        tool_name,
        format!(
            "Tool '{tool_name}' is not listed in any of the {} loaded boxes",
            policy.box_count()
        ),
        "allowedTools",
    )
}

fn capability_violation(
    tool_name: &str,
    classification: &CapabilityClassification,
    policy: &GlobalPolicy,
) -> Option<Violation> {
    if classification.allowed {
        debug!(
            tool = %tool_name,
            capability = ?classification.matched_capability,
            "Unlisted tool allowed by capability"
        );
        return None;
    }

    let violation = match &classification.matched_capability {
        Some(capability) => {
            let denying = policy.skills_denying_capability(capability);
            let skill = if denying.is_empty() {
                UNKNOWN_SKILL.to_string()
            } else {
                denying.join(",")
            };
            Violation::new(
                ViolationType::DeniedCapability,
                Severity::Critical,
                skill,
                tool_name,
                format!(
                    "Tool '{tool_name}' falls under denied capability '{capability}': {}",
                    classification.reason
                ),
                format!("deniedCapabilities: {capability}"),
            )
            .with_details(json!({
                "capability": capability,
                "reason": classification.reason,
            }))
        }
        None => Violation::new(
            ViolationType::UnlistedCapability,
            Severity::High,
            UNKNOWN_SKILL,
            tool_name,
            format!(
                "Tool '{tool_name}' matches no allowed capability: {}",
                classification.reason
            ),
            "allowedCapabilities",
        )
        .with_details(json!({ "reason": classification.reason })),
    };
    Some(violation)
}

fn claimant_violations(
    tool_name: &str,
    claiming: &[String],
    policy: &GlobalPolicy,
    targets: &ExtractedTargets,
    flagged_paths: &[&str],
    flagged_hosts: &[&str],
) -> Vec<Violation> {
    let claimants: Vec<_> = claiming
        .iter()
        .filter_map(|skill| policy.boxes.get(skill))
        .collect();
    let skills = claiming.join(",");
    let mut violations = Vec::new();

    let (violation_type, label) = match targets.operation {
        FsOperation::Read => (ViolationType::FilesystemReadViolation, "readable"),
        FsOperation::Write => (ViolationType::FilesystemWriteViolation, "writable"),
    };

    for path in &targets.paths {
        if flagged_paths.contains(&path.as_str()) {
            continue;
        }
        let rejections: Vec<String> = claimants
            .iter()
            .map(|c| check_filesystem_access(path, targets.operation, &c.filesystem))
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default();
        if rejections.is_empty() {
            continue;
        }
        violations.push(
            Violation::new(
                violation_type,
                Severity::High,
                skills.as_str(),
                tool_name,
                format!(
                    "Path '{path}' is not permitted for {} by any box claiming '{tool_name}' ({skills})",
                    targets.operation
                ),
                format!("filesystem.{label}"),
            )
            .with_details(json!({
                "path": path,
                "operation": targets.operation,
                "reasons": rejections,
            })),
        );
    }

    for host in &targets.hosts {
        if flagged_hosts.contains(&host.as_str()) {
            continue;
        }
        let rejections: Vec<String> = claimants
            .iter()
            .map(|c| check_network_access(host, &c.network))
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default();
        if rejections.is_empty() {
            continue;
        }
        violations.push(
            Violation::new(
                ViolationType::NetworkViolation,
                Severity::High,
                skills.as_str(),
                tool_name,
                format!(
                    "Host '{host}' is not permitted by any box claiming '{tool_name}' ({skills})"
                ),
                "network.allowedHosts",
            )
            .with_details(json!({ "host": host, "reasons": rejections })),
        );
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::global::build_global_policy;
    use serde_json::json;
    use skillbox_contracts::{Contract, ToolRule};

    fn reader_box() -> Contract {
        let mut c = Contract::new("reader", "Data reader");
        c.allowed_tools = vec![ToolRule::new("read_file", "reads data")];
        c.denied_tools = vec![ToolRule::new("shell_exec", "no shell")];
        c.filesystem.readable = vec!["./data/**".into()];
        c
    }

    fn types(violations: &[Violation]) -> Vec<ViolationType> {
        violations.iter().map(|v| v.violation_type).collect()
    }

    #[test]
    fn end_to_end_single_box() {
        let policy = build_global_policy(&[reader_box()]);

        let v = match_tool_call("shell_exec", &json!({}), &policy, None);
        assert_eq!(types(&v), vec![ViolationType::DeniedTool]);
        assert_eq!(v[0].severity, Severity::Critical);
        assert_eq!(v[0].skill_id, "reader");

        let v = match_tool_call("read_file", &json!({"path": "/etc/passwd"}), &policy, None);
        assert_eq!(types(&v), vec![ViolationType::FilesystemReadViolation]);
        assert_eq!(v[0].severity, Severity::High);
        assert_eq!(v[0].details.as_ref().unwrap()["path"], "/etc/passwd");

        let v = match_tool_call("read_file", &json!({"path": "./data/x.json"}), &policy, None);
        assert!(v.is_empty());
    }

    #[test]
    fn denied_tool_short_circuits_other_checks() {
        let mut c = reader_box();
        c.filesystem.denied = vec!["/etc/**".into()];
        let policy = build_global_policy(&[c]);

        let v = match_tool_call(
            "shell_exec",
            &json!({"command": "cat '/etc/shadow'", "url": "https://evil.com"}),
            &policy,
            None,
        );
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].violation_type, ViolationType::DeniedTool);
    }

    #[test]
    fn denied_tool_names_every_denying_skill() {
        let mut other = Contract::new("other", "");
        other.denied_tools = vec![ToolRule::new("shell_exec", "")];
        let policy = build_global_policy(&[reader_box(), other]);

        let v = match_tool_call("shell_exec", &json!({}), &policy, None);
        assert_eq!(v[0].skill_id, "reader,other");
        assert!(v[0].message.contains("no shell"));
    }

    #[test]
    fn no_boxes_means_no_violations() {
        let policy = build_global_policy(&[]);
        for tool in ["shell_exec", "read_file", "anything"] {
            let v = match_tool_call(tool, &json!({"path": "/etc/passwd"}), &policy, None);
            assert!(v.is_empty());
        }
    }

    #[test]
    fn unlisted_tool_is_high() {
        let policy = build_global_policy(&[reader_box()]);
        let v = match_tool_call("mystery_tool", &json!({}), &policy, None);
        assert_eq!(types(&v), vec![ViolationType::UnlistedTool]);
        assert_eq!(v[0].severity, Severity::High);
        assert_eq!(v[0].skill_id, UNKNOWN_SKILL);
    }

    #[test]
    fn unlisted_tool_still_checks_global_denials() {
        let mut c = reader_box();
        c.filesystem.denied = vec!["/etc/**".into()];
        c.network.denied_hosts = vec!["*.evil.com".into()];
        let policy = build_global_policy(&[c]);

        let v = match_tool_call(
            "fetch",
            &json!({"path": "/etc/hosts", "url": "https://cdn.evil.com/x"}),
            &policy,
            None,
        );
        assert_eq!(
            types(&v),
            vec![
                ViolationType::UnlistedTool,
                ViolationType::FilesystemDenied,
                ViolationType::NetworkViolation,
            ]
        );
        assert!(v[1..].iter().all(|x| x.severity == Severity::Critical));
        assert!(v.iter().all(|x| x.skill_id == UNKNOWN_SKILL));
    }

    #[test]
    fn globally_denied_path_not_reported_twice() {
        let mut c = reader_box();
        c.filesystem.denied = vec!["/etc/**".into()];
        let policy = build_global_policy(&[c]);

        let v = match_tool_call("read_file", &json!({"path": "/etc/passwd"}), &policy, None);
        assert_eq!(types(&v), vec![ViolationType::FilesystemDenied]);
        assert_eq!(v[0].skill_id, "reader");
        assert_eq!(v[0].rule, "/etc/**");
    }

    #[test]
    fn any_claimant_permitting_is_enough() {
        let a = reader_box();
        let mut b = Contract::new("notes", "");
        b.allowed_tools = vec![ToolRule::new("read_file", "")];
        b.filesystem.readable = vec!["./notes/**".into()];
        let policy = build_global_policy(&[a, b]);

        let v = match_tool_call("read_file", &json!({"path": "./notes/today.md"}), &policy, None);
        assert!(v.is_empty());

        let v = match_tool_call("read_file", &json!({"path": "/root/x"}), &policy, None);
        assert_eq!(types(&v), vec![ViolationType::FilesystemReadViolation]);
        assert_eq!(v[0].skill_id, "reader,notes");
        let reasons = v[0].details.as_ref().unwrap()["reasons"].as_array().unwrap();
        assert_eq!(reasons.len(), 2);
    }

    #[test]
    fn any_claimant_permitting_a_host_is_enough() {
        let mut a = Contract::new("a", "");
        a.allowed_tools = vec![ToolRule::new("http_get", "")];
        a.network.allowed_hosts = vec!["api.a.com".into()];
        let mut b = Contract::new("b", "");
        b.allowed_tools = vec![ToolRule::new("http_get", "")];
        b.network.allowed_hosts = vec!["*.b.io".into()];
        let policy = build_global_policy(&[a, b]);

        for url in ["https://api.a.com/v1", "https://x.b.io/feed"] {
            let v = match_tool_call("http_get", &json!({ "url": url }), &policy, None);
            assert!(v.is_empty(), "{url} is allowed by one claimant");
        }

        let v = match_tool_call("http_get", &json!({"url": "https://other.com/"}), &policy, None);
        assert_eq!(types(&v), vec![ViolationType::NetworkViolation]);
        assert_eq!(v[0].severity, Severity::High);
        assert_eq!(v[0].skill_id, "a,b");
        assert_eq!(v[0].rule, "network.allowedHosts");
    }

    #[test]
    fn later_box_for_same_skill_decides_the_call() {
        let mut first = Contract::new("a", "");
        first.allowed_tools = vec![ToolRule::new("write_file", "")];
        first.filesystem.writable = vec!["./out/**".into()];
        let mut second = Contract::new("a", "");
        second.denied_tools = vec![ToolRule::new("write_file", "no writes")];
        let policy = build_global_policy(&[first, second]);

        let v = match_tool_call("write_file", &json!({"path": "/etc/passwd"}), &policy, None);
        assert_eq!(types(&v), vec![ViolationType::DeniedTool]);
        assert_eq!(v[0].skill_id, "a");
    }

    #[test]
    fn write_tools_check_writable() {
        let mut c = Contract::new("writer", "");
        c.allowed_tools = vec![ToolRule::new("write_file", "")];
        c.filesystem.readable = vec!["./**".into()];
        c.filesystem.writable = vec!["./out/**".into()];
        let policy = build_global_policy(&[c]);

        let v = match_tool_call("write_file", &json!({"path": "./src/lib.rs"}), &policy, None);
        assert_eq!(types(&v), vec![ViolationType::FilesystemWriteViolation]);
        assert_eq!(v[0].rule, "filesystem.writable");

        let v = match_tool_call("write_file", &json!({"path": "./out/a.txt"}), &policy, None);
        assert!(v.is_empty());
    }

    #[test]
    fn claimed_tool_network_rules() {
        let mut c = Contract::new("fetcher", "");
        c.allowed_tools = vec![ToolRule::new("http_get", "")];
        c.network.allowed_hosts = vec!["*.slack.com".into()];
        let policy = build_global_policy(&[c]);

        let ok = match_tool_call(
            "http_get",
            &json!({"url": "https://api.slack.com/chat"}),
            &policy,
            None,
        );
        assert!(ok.is_empty());

        let v = match_tool_call("http_get", &json!({"url": "https://slack.com/"}), &policy, None);
        assert_eq!(types(&v), vec![ViolationType::NetworkViolation]);
        assert_eq!(v[0].severity, Severity::High);
    }

    #[test]
    fn global_host_deny_beats_star_allow() {
        let mut c = Contract::new("fetcher", "");
        c.allowed_tools = vec![ToolRule::new("http_get", "")];
        c.network.allowed_hosts = vec!["*".into()];
        c.network.denied_hosts = vec!["evil.com".into()];
        let policy = build_global_policy(&[c]);

        let v = match_tool_call("http_get", &json!({"host": "evil.com"}), &policy, None);
        assert_eq!(types(&v), vec![ViolationType::NetworkViolation]);
        assert_eq!(v[0].severity, Severity::Critical);
    }

    fn capability_policy() -> GlobalPolicy {
        let mut c = reader_box();
        c.allowed_capabilities = vec!["Reading local files".into()];
        c.denied_capabilities = vec!["Shell or command execution".into()];
        build_global_policy(&[c])
    }

    #[test]
    fn cached_denied_capability_is_critical() {
        let policy = capability_policy();
        let mut cache = CapabilityCache::new();
        cache.insert(
            "run_cmd",
            CapabilityClassification::denied("Shell or command execution", "runs commands"),
        );

        let v = match_tool_call("run_cmd", &json!({}), &policy, Some(&cache));
        assert_eq!(types(&v), vec![ViolationType::DeniedCapability]);
        assert_eq!(v[0].severity, Severity::Critical);
        assert!(v[0].message.contains("Shell or command execution"));
        assert_eq!(v[0].skill_id, "reader");
    }

    #[test]
    fn cached_unmatched_capability_is_high() {
        let policy = capability_policy();
        let mut cache = CapabilityCache::new();
        cache.insert("paint", CapabilityClassification::unmatched("nothing fits"));

        let v = match_tool_call("paint", &json!({}), &policy, Some(&cache));
        assert_eq!(types(&v), vec![ViolationType::UnlistedCapability]);
        assert_eq!(v[0].severity, Severity::High);
    }

    #[test]
    fn cached_allowed_capability_still_runs_global_checks() {
        let mut c = reader_box();
        c.allowed_capabilities = vec!["Reading local files".into()];
        c.filesystem.denied = vec!["~/.ssh/**".into()];
        let policy = build_global_policy(&[c]);
        let mut cache = CapabilityCache::new();
        cache.insert(
            "cat_file",
            CapabilityClassification::allowed("Reading local files", "reads"),
        );

        let v = match_tool_call("cat_file", &json!({"path": "./data/a"}), &policy, Some(&cache));
        assert!(v.is_empty());

        let v = match_tool_call("cat_file", &json!({"path": "~/.ssh/id_rsa"}), &policy, Some(&cache));
        assert_eq!(types(&v), vec![ViolationType::FilesystemDenied]);
    }

    #[test]
    fn cache_miss_falls_back_to_unlisted_tool() {
        let policy = capability_policy();
        let cache = CapabilityCache::new();
        let v = match_tool_call("run_cmd", &json!({}), &policy, Some(&cache));
        assert_eq!(types(&v), vec![ViolationType::UnlistedTool]);
    }

    #[test]
    fn cache_ignored_without_capability_lists() {
        let policy = build_global_policy(&[reader_box()]);
        let mut cache = CapabilityCache::new();
        cache.insert("run_cmd", CapabilityClassification::allowed("Anything", "ok"));
        let v = match_tool_call("run_cmd", &json!({}), &policy, Some(&cache));
        assert_eq!(types(&v), vec![ViolationType::UnlistedTool]);
    }

    #[test]
    fn no_cache_means_no_capability_fallback() {
        let policy = capability_policy();
        let v = match_tool_call("run_cmd", &json!({}), &policy, None);
        assert_eq!(types(&v), vec![ViolationType::UnlistedTool]);
    }

    #[test]
    fn repeated_evaluation_is_idempotent() {
        let policy = build_global_policy(&[reader_box()]);
        let params = json!({"path": "/etc/passwd", "url": "https://x.test"});
        let first = match_tool_call("read_file", &params, &policy, None);
        let second = match_tool_call("read_file", &params, &policy, None);
        assert_eq!(first.len(), second.len());
        assert!(first.iter().zip(&second).all(|(a, b)| a.same_finding(b)));
    }

    struct FixedExtractor;

    impl ParameterExtractor for FixedExtractor {
        fn extract(&self, _tool_name: &str, _params: &Value) -> ExtractedTargets {
            ExtractedTargets {
                paths: vec!["/srv/out.log".into()],
                hosts: vec![],
                operation: FsOperation::Write,
            }
        }
    }

    #[test]
    fn custom_extractor_is_used() {
        let mut c = reader_box();
        c.filesystem.writable = vec!["./out/**".into()];
        let policy = build_global_policy(&[c]);
        let matcher = ToolCallMatcher::with_extractor(FixedExtractor);

        let v = matcher.match_tool_call("read_file", &json!({}), &policy, None);
        assert_eq!(types(&v), vec![ViolationType::FilesystemWriteViolation]);
    }
}
