//! CLI commands for inspecting box files.

use skillbox_contracts::{load_dir, load_file};
use std::path::PathBuf;

/// List all loaded boxes.
pub fn list(dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(dir)?;
    let boxes_dir = config.boxes_dir();
    let set = load_dir(&boxes_dir)?;

    if set.is_empty() {
        println!("No boxes in {}.", boxes_dir.display());
        println!("\nA minimal box (reader.toml):");
        println!("  skillId = \"reader\"");
        println!("  allowedTools = [{{ name = \"read_file\" }}]");
        println!("  deniedTools = [{{ name = \"shell_exec\", reason = \"no shell\" }}]");
        println!("  [filesystem]");
        println!("  readable = [\"./data/**\"]");
        return Ok(());
    }

    println!("Boxes ({} loaded from {}):\n", set.len(), boxes_dir.display());
    for (i, b) in set.boxes.iter().enumerate() {
        let review = format!("{:?}", b.drift.review_status).to_lowercase();
        if b.skill_name.is_empty() {
            println!("  {}. {} [{review}]", i + 1, b.skill_id);
        } else {
            println!("  {}. {} ({}) [{review}]", i + 1, b.skill_id, b.skill_name);
        }
        println!(
            "     tools: {} allowed, {} denied; capabilities: {} allowed, {} denied",
            b.allowed_tools.len(),
            b.denied_tools.len(),
            b.allowed_capabilities.len(),
            b.denied_capabilities.len()
        );
        if let Some(max) = b.behavior.max_tool_calls {
            println!("     maxToolCalls: {max}");
        }
    }
    Ok(())
}

/// Validate every box file, reporting each failure.
pub fn validate(dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(dir)?;
    let boxes_dir = config.boxes_dir();

    if !boxes_dir.exists() {
        println!("No box directory at {}.", boxes_dir.display());
        return Ok(());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(&boxes_dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("toml") || e.eq_ignore_ascii_case("json"))
        })
        .collect();
    files.sort();

    let mut failed = 0;
    let mut boxes = 0;
    for file in &files {
        match load_file(file) {
            Ok(set) => boxes += set.len(),
            Err(e) => {
                failed += 1;
                eprintln!("  {}: {e}", file.display());
            }
        }
    }

    if failed > 0 {
        eprintln!("Box validation failed: {failed} of {} files invalid.", files.len());
        std::process::exit(1);
    }
    println!("All {} files are valid. {boxes} boxes.", files.len());
    Ok(())
}
