//! # skillbox core
//!
//! Domain primitives shared by every skillbox crate: the shape of an
//! incoming tool call, the outcome of a semantic capability classification,
//! and the trait that classifiers implement.
//!
//! ## Design Philosophy
//!
//! The policy engine itself is pure and performs no I/O. Anything slow or
//! non-deterministic (an LLM classifier, a file loader) is an external
//! collaborator defined as a trait here and implemented elsewhere. This
//! keeps the dependency graph pointing inward and lets tests substitute
//! scripted implementations.

pub mod capability;
pub mod error;
pub mod tool;

pub use capability::{CapabilityClassification, CapabilityClassifier};
pub use error::{ClassifierError, Error, Result};
pub use tool::ToolCall;
