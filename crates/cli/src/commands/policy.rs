//! `skillbox policy`: print the merged global policy.

use skillbox_contracts::load_dir;
use skillbox_policy::build_global_policy;
use std::path::PathBuf;

pub fn run(dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(dir)?;
    let set = load_dir(&config.boxes_dir())?;
    let policy = build_global_policy(&set.boxes);
    println!("{}", serde_json::to_string_pretty(&policy)?);
    Ok(())
}
