//! `skillbox status`: show configuration and load state.

use skillbox_config::AppConfig;
use skillbox_contracts::load_dir;
use std::path::PathBuf;

pub fn run(dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(dir)?;
    let boxes_dir = config.boxes_dir();

    println!("skillbox status");
    println!("===============");
    println!("  Config dir:     {}", AppConfig::config_dir().display());
    println!("  Box dir:        {}", boxes_dir.display());
    println!("  Mode:           {:?}", config.mode);
    println!("  Blocks at:      {}", config.block_severity);
    println!(
        "  Capabilities:   {} (classifier: {})",
        if config.capabilities.enabled { "enabled" } else { "disabled" },
        config.capabilities.classifier
    );
    println!("  Log capacity:   {}", config.violation_log_capacity);
    match config.default_max_tool_calls {
        Some(max) => println!("  Default limit:  {max} tool calls per skill"),
        None => println!("  Default limit:  none"),
    }

    match load_dir(&boxes_dir) {
        Ok(set) => println!("\n  Boxes loaded:   {}", set.len()),
        Err(e) => println!("\n  Boxes failed to load: {e}"),
    }

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  No config file at {}, using defaults", config_path.display());
    }

    Ok(())
}
