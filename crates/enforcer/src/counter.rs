//! Per-skill tool-call counting for `behavior.maxToolCalls`.

use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ToolCallCounter {
    counts: Mutex<HashMap<String, u32>>,
}

impl ToolCallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one call for `skill_id` and return the new total.
    pub fn record(&self, skill_id: &str) -> u32 {
        let mut counts = self.counts.lock();
        let count = counts.entry(skill_id.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn count(&self, skill_id: &str) -> u32 {
        self.counts.lock().get(skill_id).copied().unwrap_or(0)
    }

    pub fn reset(&self, skill_id: &str) {
        self.counts.lock().remove(skill_id);
    }

    pub fn reset_all(&self) {
        self.counts.lock().clear();
    }

    /// Snapshot of all counts.
    pub fn counts(&self) -> HashMap<String, u32> {
        self.counts.lock().clone()
    }
}
