//! `skillbox check`: evaluate a simulated tool call.

use skillbox_config::EnforcementMode;
use skillbox_contracts::load_dir;
use skillbox_core::ToolCall;
use skillbox_enforcer::Enforcer;
use std::path::PathBuf;

pub async fn run(
    dir: Option<PathBuf>,
    tool: &str,
    params_json: &str,
    mode: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(dir)?;
    if let Some(mode) = mode {
        config.mode = mode.parse::<EnforcementMode>()?;
    }

    let set = load_dir(&config.boxes_dir())?;
    if set.is_empty() {
        println!("No boxes loaded from {}.", config.boxes_dir().display());
    }
    tracing::debug!(boxes = set.len(), mode = ?config.mode, "Checking {tool}");
    let enforcer = Enforcer::from_config(&config, &set)?;

    let call = ToolCall::from_json_params(tool, params_json)
        .unwrap_or_else(|_| ToolCall::new(tool, serde_json::json!({ "command": params_json })));

    let decision = enforcer.check_call(&call).await;

    let mode = format!("{:?}", decision.mode).to_lowercase();
    if decision.allowed {
        println!("ALLOWED (mode: {mode}, violations: {})", decision.violations.len());
    } else {
        println!("BLOCKED (mode: {mode}, violations: {})", decision.violations.len());
    }
    for v in &decision.violations {
        println!("  [{}] {} ({})", v.severity, v.violation_type, v.skill_id);
        println!("     {}", v.message);
        println!("     rule: {}", v.rule);
    }

    if !decision.allowed {
        std::process::exit(1);
    }
    Ok(())
}
