//! Tool calls as seen by the policy engine.
//!
//! The host only tells us a tool name and an untyped argument bag; there is
//! no schema describing which argument is a path or a URL.

use serde::{Deserialize, Serialize};

/// A request to execute a tool, submitted for a policy decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value (normally an object)
    #[serde(default)]
    pub params: serde_json::Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Build a call from a JSON argument string, as typed on a command line.
    pub fn from_json_params(name: impl Into<String>, params_json: &str) -> crate::Result<Self> {
        let params = serde_json::from_str(params_json)?;
        Ok(Self::new(name, params))
    }
}
