//! Configuration loading, validation, and management for skillbox.
//!
//! Loads configuration from `~/.skillbox/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.skillbox/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Whether violations block tool calls or are only recorded
    #[serde(default)]
    pub mode: EnforcementMode,

    /// Lowest severity that blocks a call in enforce mode
    #[serde(default = "default_block_severity")]
    pub block_severity: String,

    /// Directory holding box files (`*.toml`, `*.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contracts_dir: Option<PathBuf>,

    /// How many recent violations to keep in memory
    #[serde(default = "default_violation_log_capacity")]
    pub violation_log_capacity: usize,

    /// Tool-call bound for boxes that do not set `behavior.maxToolCalls`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_tool_calls: Option<u32>,

    /// Capability fallback settings
    #[serde(default)]
    pub capabilities: CapabilityConfig,
}

/// What the host does with a call that has violations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementMode {
    /// Block calls whose violations reach the configured severity.
    Enforce,
    /// Never block; record violations only.
    #[default]
    Monitor,
}

impl std::str::FromStr for EnforcementMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enforce" => Ok(EnforcementMode::Enforce),
            "monitor" => Ok(EnforcementMode::Monitor),
            other => Err(ConfigError::ValidationError(format!(
                "mode must be 'enforce' or 'monitor', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityConfig {
    /// Whether unlisted tools are classified against capability lists
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Classifier backend: "keyword" or "none"
    #[serde(default = "default_classifier")]
    pub classifier: String,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            classifier: default_classifier(),
        }
    }
}

fn default_block_severity() -> String {
    "high".into()
}
fn default_violation_log_capacity() -> usize {
    1000
}
fn default_classifier() -> String {
    "keyword".into()
}
fn default_true() -> bool {
    true
}

const SEVERITIES: &[&str] = &["low", "medium", "high", "critical"];
const CLASSIFIERS: &[&str] = &["keyword", "none"];

impl AppConfig {
    /// Load configuration from the default path (~/.skillbox/config.toml).
    ///
    /// Environment variables take precedence over the file:
    /// - `SKILLBOX_MODE` (`enforce` | `monitor`)
    /// - `SKILLBOX_CONTRACTS_DIR`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(mode) = lookup("SKILLBOX_MODE") {
            self.mode = mode.parse()?;
        }
        if let Some(dir) = lookup("SKILLBOX_CONTRACTS_DIR")
            && !dir.is_empty()
        {
            self.contracts_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.violation_log_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "violation_log_capacity must be > 0".into(),
            ));
        }

        let severity = self.block_severity.trim().to_ascii_lowercase();
        if !SEVERITIES.contains(&severity.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "block_severity must be one of {SEVERITIES:?}, got '{}'",
                self.block_severity
            )));
        }

        if !CLASSIFIERS.contains(&self.capabilities.classifier.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "capabilities.classifier must be one of {CLASSIFIERS:?}, got '{}'",
                self.capabilities.classifier
            )));
        }

        if self.default_max_tool_calls == Some(0) {
            return Err(ConfigError::ValidationError(
                "default_max_tool_calls must be > 0 when set".into(),
            ));
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".skillbox")
    }

    /// The box directory: configured, or `~/.skillbox/boxes`.
    pub fn boxes_dir(&self) -> PathBuf {
        self.contracts_dir
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("boxes"))
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: EnforcementMode::default(),
            block_severity: default_block_severity(),
            contracts_dir: None,
            violation_log_capacity: default_violation_log_capacity(),
            default_max_tool_calls: None,
            capabilities: CapabilityConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.mode, EnforcementMode::Monitor);
        assert_eq!(config.block_severity, "high");
        assert_eq!(config.violation_log_capacity, 1000);
        assert!(config.capabilities.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig {
            mode: EnforcementMode::Enforce,
            contracts_dir: Some(PathBuf::from("/srv/boxes")),
            ..AppConfig::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.mode, EnforcementMode::Enforce);
        assert_eq!(parsed.boxes_dir(), PathBuf::from("/srv/boxes"));
    }

    #[test]
    fn zero_log_capacity_rejected() {
        let config = AppConfig {
            violation_log_capacity: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_severity_and_classifier_rejected() {
        let config = AppConfig {
            block_severity: "urgent".into(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.capabilities.classifier = "oracle".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn severity_is_validated_case_insensitively() {
        for value in ["HIGH", "Critical", " medium "] {
            let config = AppConfig {
                block_severity: value.into(),
                ..AppConfig::default()
            };
            assert!(config.validate().is_ok(), "{value} should validate");
        }
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.mode, EnforcementMode::Monitor);
        assert!(config.contracts_dir.is_none());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
mode = "enforce"
block_severity = "critical"
contracts_dir = "/opt/boxes"
default_max_tool_calls = 50

[capabilities]
classifier = "none"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.mode, EnforcementMode::Enforce);
        assert_eq!(config.block_severity, "critical");
        assert_eq!(config.default_max_tool_calls, Some(50));
        assert_eq!(config.capabilities.classifier, "none");
        assert!(config.capabilities.enabled);
    }

    #[test]
    fn invalid_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "mode = \"sometimes\"").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("SKILLBOX_MODE", "Enforce"),
            ("SKILLBOX_CONTRACTS_DIR", "/env/boxes"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.mode, EnforcementMode::Enforce);
        assert_eq!(config.boxes_dir(), PathBuf::from("/env/boxes"));
    }

    #[test]
    fn bad_env_mode_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides(|k| (k == "SKILLBOX_MODE").then(|| "loud".into()));
        assert!(result.is_err());
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("monitor"));
        assert!(toml_str.contains("keyword"));
    }
}
