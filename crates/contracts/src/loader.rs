//! Box file loading.
//!
//! A box directory holds `*.toml` and `*.json` files. Each file contains
//! either a single box or a `boxes` array. Files are read in filename order
//! so the resulting load order is deterministic.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::model::{Contract, ContractSet};
use crate::ContractError;

#[derive(Deserialize)]
#[serde(untagged)]
enum BoxFile {
    Set { boxes: Vec<Contract> },
    Single(Box<Contract>),
}

impl BoxFile {
    fn into_boxes(self) -> Vec<Contract> {
        match self {
            BoxFile::Set { boxes } => boxes,
            BoxFile::Single(contract) => vec![*contract],
        }
    }
}

/// Load every box file in `dir`.
///
/// A missing directory yields an empty set: no boxes means nothing to
/// enforce. Later files replace earlier boxes with the same skill ID.
pub fn load_dir(dir: &Path) -> Result<ContractSet, ContractError> {
    if !dir.exists() {
        info!("No box directory at {}, starting with no boxes", dir.display());
        return Ok(ContractSet::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|source| ContractError::IoError {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && matches!(extension(p).as_deref(), Some("toml" | "json")))
        .collect();
    files.sort();

    let mut set = ContractSet::new();
    for file in &files {
        for contract in read_boxes(file)? {
            set.add(contract);
        }
    }
    set.validate()?;

    info!(
        boxes = set.len(),
        files = files.len(),
        "Loaded boxes from {}",
        dir.display()
    );
    Ok(set)
}

/// Load the boxes in a single file.
pub fn load_file(path: &Path) -> Result<ContractSet, ContractError> {
    let mut set = ContractSet::new();
    for contract in read_boxes(path)? {
        set.add(contract);
    }
    set.validate()?;
    Ok(set)
}

fn read_boxes(path: &Path) -> Result<Vec<Contract>, ContractError> {
    let content = std::fs::read_to_string(path).map_err(|source| ContractError::IoError {
        path: path.to_path_buf(),
        source,
    })?;

    let file: BoxFile = match extension(path).as_deref() {
        Some("toml") => toml::from_str(&content)?,
        Some("json") => serde_json::from_str(&content)?,
        other => {
            return Err(ContractError::UnsupportedFormat(
                other.unwrap_or("(none)").to_string(),
            ));
        }
    };

    let boxes = file.into_boxes();
    debug!(count = boxes.len(), "Read box file {}", path.display());
    Ok(boxes)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_is_empty() {
        let set = load_dir(Path::new("/nonexistent/skillbox/boxes")).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn loads_single_and_set_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b_single.json"),
            r#"{"skillId": "second", "allowedTools": [{"name": "read_file"}]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("a_set.toml"),
            r#"
[[boxes]]
skillId = "first"
[[boxes.allowedTools]]
name = "read_file"
"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let set = load_dir(dir.path()).unwrap();
        let ids: Vec<&str> = set.boxes.iter().map(|c| c.skill_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn invalid_box_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), r#"{"skillId": ""}"#).unwrap();
        assert!(matches!(
            load_dir(dir.path()),
            Err(ContractError::InvalidContract { .. })
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "skillId = ").unwrap();
        assert!(matches!(load_file(&path), Err(ContractError::TomlError(_))));
    }

    #[test]
    fn unsupported_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("box.yaml");
        std::fs::write(&path, "skillId: x").unwrap();
        assert!(matches!(
            load_file(&path),
            Err(ContractError::UnsupportedFormat(ext)) if ext == "yaml"
        ));
    }
}
