//! Skill boxes: declarative behavioral contracts for agent skills.
//!
//! A box bounds what one skill may do: which tools it may invoke, which
//! filesystem paths and network hosts it may touch, and how many actions it
//! may take. Boxes are authored elsewhere (usually generated from the
//! skill's own definition and then reviewed) and arrive here as TOML or
//! JSON documents.
//!
//! # Example Box
//!
//! ```toml
//! skillId = "weather"
//! skillName = "Weather lookup"
//! allowedCapabilities = ["Network access to weather APIs"]
//! deniedCapabilities = ["Shell or command execution"]
//!
//! [[allowedTools]]
//! name = "http_get"
//! reason = "Fetches forecasts"
//!
//! [[deniedTools]]
//! name = "shell_exec"
//! reason = "Never needs a shell"
//!
//! [filesystem]
//! readable = ["./cache/**"]
//! denied = ["~/.ssh/**"]
//!
//! [network]
//! allowedHosts = ["api.weather.gov", "*.openweathermap.org"]
//! ```
//!
//! This crate only models, validates and loads boxes. Merging them into an
//! enforceable decision surface lives in `skillbox-policy`.

mod loader;
mod model;

pub use loader::{load_dir, load_file};
pub use model::{
    BehaviorRules, Contract, ContractSet, DriftInfo, FilesystemRules, NetworkRules, ReviewStatus,
    ToolRule,
};

/// Re-export for convenience.
pub type ContractResult<T> = std::result::Result<T, ContractError>;

/// Errors from the contract subsystem.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("invalid box '{skill_id}': {reason}")]
    InvalidContract { skill_id: String, reason: String },

    #[error("box file error at {path}: {source}")]
    IoError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("unsupported box file extension: {0}")]
    UnsupportedFormat(String),
}
