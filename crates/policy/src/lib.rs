//! The skillbox policy engine.
//!
//! Merges any number of independently authored boxes into one read-only
//! [`GlobalPolicy`] and evaluates incoming tool calls against it, producing
//! a list of [`Violation`]s.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   build_global_policy   ┌──────────────┐
//! │  ContractSet  │───────────────────────▶│ GlobalPolicy  │
//! └──────────────┘                         └──────┬───────┘
//!                                                 │
//! ┌──────────────┐    ┌──────────────┐    ┌──────▼───────┐
//! │ (tool, args) │───▶│  Extractor   │───▶│  Evaluator    │──▶ Vec<Violation>
//! └──────────────┘    └──────────────┘    └──────┬───────┘
//!                                                 │
//!                                   ┌─────────────┴──────────┐
//!                                   │ Rule matcher │ Cache    │
//!                                   └────────────────────────┘
//! ```
//!
//! Everything here is pure: no I/O, no locking, no clocks beyond the
//! violation timestamp. The caller owns the policy snapshot and the
//! capability cache, and must clear the cache whenever it rebuilds the
//! policy.

mod cache;
mod extract;
mod global;
mod matcher;
mod rules;
mod violation;

pub use cache::CapabilityCache;
pub use extract::{ExtractedTargets, HeuristicExtractor, ParameterExtractor, infer_operation};
pub use global::{DeniedTool, GlobalPolicy, build_global_policy};
pub use matcher::{ToolCallMatcher, UNKNOWN_SKILL, match_tool_call};
pub use rules::{
    FsOperation, check_filesystem_access, check_network_access, first_matching_host,
    first_matching_path, host_matches, path_matches_any,
};
pub use violation::{Severity, Violation, ViolationType};
