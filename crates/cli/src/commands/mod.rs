pub mod boxes;
pub mod check;
pub mod policy;
pub mod status;

use skillbox_config::AppConfig;
use std::path::PathBuf;

/// Load the config, letting `--dir` win over the file and environment.
pub fn load_config(dir: Option<PathBuf>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(dir) = dir {
        config.contracts_dir = Some(dir);
    }
    Ok(config)
}
