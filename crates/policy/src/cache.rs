//! Capability classification cache.
//!
//! Classifications are a function of the tool name only, so the cache is
//! keyed by name and params never invalidate an entry. The cache is a plain
//! map: whoever shares it across threads wraps it in a lock, and must clear
//! it whenever the global policy is rebuilt.

use skillbox_core::CapabilityClassification;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct CapabilityCache {
    entries: HashMap<String, CapabilityClassification>,
}

impl CapabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tool_name: &str) -> Option<&CapabilityClassification> {
        self.entries.get(tool_name)
    }

    pub fn contains(&self, tool_name: &str) -> bool {
        self.entries.contains_key(tool_name)
    }

    /// Store a classification. Last write wins; returns the previous entry.
    pub fn insert(
        &mut self,
        tool_name: impl Into<String>,
        classification: CapabilityClassification,
    ) -> Option<CapabilityClassification> {
        self.entries.insert(tool_name.into(), classification)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
