//! Global policy: all loaded boxes merged into one decision surface.
//!
//! Every loaded box is active at the same time, so the merge is generous on
//! allows: a tool that any box allows is never globally denied, even if
//! other boxes deny it. One skill's dangerous tool is another skill's
//! legitimate one.

use serde::Serialize;
use skillbox_contracts::Contract;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// A tool denied by at least one box and allowed by none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeniedTool {
    /// Reason given by the first box that denied the tool.
    pub reason: String,
    /// Every box that denies the tool, in load order.
    pub denying_skill_ids: Vec<String>,
}

/// The merged, read-only policy snapshot.
///
/// Built once per set of boxes and never mutated; rebuild and swap instead.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalPolicy {
    /// Tool name → skills whose box allows it, in load order.
    pub tool_index: BTreeMap<String, Vec<String>>,
    /// Tools denied somewhere and allowed nowhere.
    pub global_denied_tools: BTreeMap<String, DeniedTool>,
    /// Union of every box's denied filesystem patterns.
    pub global_denied_paths: Vec<String>,
    /// Union of every box's denied host patterns.
    pub global_denied_hosts: Vec<String>,
    pub all_allowed_capabilities: Vec<String>,
    pub all_denied_capabilities: Vec<String>,
    /// Skill ID → box, for per-claimant checks.
    pub boxes: BTreeMap<String, Contract>,
}

impl GlobalPolicy {
    /// Skills whose box allows `tool_name`. Empty when nobody claims it.
    pub fn claiming_skills(&self, tool_name: &str) -> &[String] {
        self.tool_index
            .get(tool_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn denied_tool(&self, tool_name: &str) -> Option<&DeniedTool> {
        self.global_denied_tools.get(tool_name)
    }

    /// Number of distinct boxes merged into this policy.
    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    /// A policy with no boxes enforces nothing.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Whether any box declares allowed or denied capabilities.
    pub fn has_capabilities(&self) -> bool {
        !self.all_allowed_capabilities.is_empty() || !self.all_denied_capabilities.is_empty()
    }

    /// Skills whose box lists `capability` under `deniedCapabilities`.
    pub fn skills_denying_capability(&self, capability: &str) -> Vec<&str> {
        self.boxes
            .values()
            .filter(|c| c.denied_capabilities.iter().any(|d| d == capability))
            .map(|c| c.skill_id.as_str())
            .collect()
    }
}

/// Merge `contracts` into a [`GlobalPolicy`].
///
/// A later box with the same skill ID as an earlier one replaces it, keeping
/// the earlier position; the replaced box contributes nothing. With zero
/// boxes the result is fully permissive.
pub fn build_global_policy(contracts: &[Contract]) -> GlobalPolicy {
    let mut policy = GlobalPolicy::default();
    let mut ever_allowed: HashSet<&str> = HashSet::new();
    let mut denied: BTreeMap<String, DeniedTool> = BTreeMap::new();

    for contract in latest_per_skill(contracts) {
        let skill_id = &contract.skill_id;

        for tool in &contract.allowed_tools {
            ever_allowed.insert(tool.name.as_str());
            let claimants = policy.tool_index.entry(tool.name.clone()).or_default();
            if !claimants.contains(skill_id) {
                claimants.push(skill_id.clone());
            }
        }

        for tool in &contract.denied_tools {
            let entry = denied.entry(tool.name.clone()).or_insert_with(|| DeniedTool {
                reason: String::new(),
                denying_skill_ids: Vec::new(),
            });
            if entry.reason.is_empty() {
                entry.reason = tool.reason.clone();
            }
            if !entry.denying_skill_ids.contains(skill_id) {
                entry.denying_skill_ids.push(skill_id.clone());
            }
        }

        extend_unique(&mut policy.global_denied_paths, &contract.filesystem.denied);
        extend_unique(&mut policy.global_denied_hosts, &contract.network.denied_hosts);
        extend_unique(
            &mut policy.all_allowed_capabilities,
            &contract.allowed_capabilities,
        );
        extend_unique(
            &mut policy.all_denied_capabilities,
            &contract.denied_capabilities,
        );

        policy.boxes.insert(skill_id.clone(), contract.clone());
    }

    policy.global_denied_tools = denied
        .into_iter()
        .filter(|(name, _)| !ever_allowed.contains(name.as_str()))
        .collect();

    debug!(
        boxes = policy.boxes.len(),
        claimed_tools = policy.tool_index.len(),
        denied_tools = policy.global_denied_tools.len(),
        "Built global policy"
    );

    policy
}

/// One box per skill ID: the last one seen, at the first one's position.
fn latest_per_skill(contracts: &[Contract]) -> Vec<&Contract> {
    let mut latest: Vec<&Contract> = Vec::with_capacity(contracts.len());
    for contract in contracts {
        match latest.iter_mut().find(|c| c.skill_id == contract.skill_id) {
            Some(slot) => *slot = contract,
            None => latest.push(contract),
        }
    }
    latest
}

fn extend_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillbox_contracts::ToolRule;

    fn contract(id: &str, allowed: &[&str], denied: &[&str]) -> Contract {
        let mut c = Contract::new(id, id);
        c.allowed_tools = allowed.iter().map(|t| ToolRule::new(*t, "")).collect();
        c.denied_tools = denied
            .iter()
            .map(|t| ToolRule::new(*t, format!("{id} says no")))
            .collect();
        c
    }

    #[test]
    fn empty_input_is_fully_permissive() {
        let policy = build_global_policy(&[]);
        assert!(policy.is_empty());
        assert!(policy.tool_index.is_empty());
        assert!(policy.global_denied_tools.is_empty());
        assert!(policy.global_denied_paths.is_empty());
        assert!(!policy.has_capabilities());
    }

    #[test]
    fn tool_index_preserves_load_order() {
        let policy = build_global_policy(&[
            contract("b", &["read_file"], &[]),
            contract("a", &["read_file", "write_file"], &[]),
        ]);
        assert_eq!(policy.claiming_skills("read_file"), ["b", "a"]);
        assert_eq!(policy.claiming_skills("write_file"), ["a"]);
        assert!(policy.claiming_skills("nope").is_empty());
    }

    #[test]
    fn denials_accumulate_across_boxes() {
        let policy = build_global_policy(&[
            contract("a", &[], &["shell_exec"]),
            contract("b", &[], &["shell_exec"]),
        ]);
        let denied = policy.denied_tool("shell_exec").unwrap();
        assert_eq!(denied.denying_skill_ids, vec!["a", "b"]);
        assert_eq!(denied.reason, "a says no");
    }

    #[test]
    fn any_allow_overrides_every_deny() {
        let policy = build_global_policy(&[
            contract("a", &[], &["shell_exec"]),
            contract("b", &["shell_exec"], &[]),
            contract("c", &[], &["shell_exec"]),
        ]);
        assert!(policy.denied_tool("shell_exec").is_none());
        assert_eq!(policy.claiming_skills("shell_exec"), ["b"]);
    }

    #[test]
    fn indexed_tools_never_globally_denied() {
        let policy = build_global_policy(&[
            contract("a", &["x", "y"], &["z"]),
            contract("b", &["z"], &["x", "w"]),
        ]);
        for tool in policy.tool_index.keys() {
            assert!(!policy.global_denied_tools.contains_key(tool));
        }
        assert!(policy.denied_tool("w").is_some());
    }

    #[test]
    fn denied_patterns_and_capabilities_are_unioned() {
        let mut a = Contract::new("a", "");
        a.filesystem.denied = vec!["~/.ssh/**".into(), "/etc/**".into()];
        a.network.denied_hosts = vec!["evil.com".into()];
        a.allowed_capabilities = vec!["Reading local files".into()];
        let mut b = Contract::new("b", "");
        b.filesystem.denied = vec!["/etc/**".into()];
        b.network.denied_hosts = vec!["*.tracker.io".into(), "evil.com".into()];
        b.denied_capabilities = vec!["Shell or command execution".into()];

        let policy = build_global_policy(&[a, b]);
        assert_eq!(policy.global_denied_paths, vec!["~/.ssh/**", "/etc/**"]);
        assert_eq!(policy.global_denied_hosts, vec!["evil.com", "*.tracker.io"]);
        assert!(policy.has_capabilities());
        assert_eq!(
            policy.skills_denying_capability("Shell or command execution"),
            vec!["b"]
        );
    }

    #[test]
    fn repeated_skill_id_keeps_only_the_last_box() {
        let mut first = contract("a", &["write_file"], &[]);
        first.filesystem.writable = vec!["./out/**".into()];
        first.network.denied_hosts = vec!["old.example".into()];
        let second = contract("a", &[], &["write_file"]);

        let policy = build_global_policy(&[first, contract("b", &["read_file"], &[]), second]);
        assert_eq!(policy.box_count(), 2);
        assert!(policy.claiming_skills("write_file").is_empty());
        assert_eq!(
            policy.denied_tool("write_file").unwrap().denying_skill_ids,
            vec!["a"]
        );
        assert!(policy.global_denied_hosts.is_empty());
        assert!(policy.boxes["a"].filesystem.writable.is_empty());
    }

    #[test]
    fn duplicate_skill_ids_are_not_double_counted() {
        let policy = build_global_policy(&[
            contract("a", &["read_file"], &["rm"]),
            contract("a", &["read_file"], &["rm"]),
        ]);
        assert_eq!(policy.box_count(), 1);
        assert_eq!(policy.claiming_skills("read_file"), ["a"]);
        assert_eq!(policy.denied_tool("rm").unwrap().denying_skill_ids, vec!["a"]);
    }
}
