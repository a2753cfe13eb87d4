//! Bounded in-memory log of recent violations, for status and audit tooling.

use parking_lot::Mutex;
use skillbox_policy::Violation;
use std::collections::VecDeque;

/// A ring buffer of the most recent violations. The oldest entry is evicted
/// once capacity is reached.
#[derive(Debug)]
pub struct ViolationLog {
    entries: Mutex<VecDeque<Violation>>,
    capacity: usize,
}

impl ViolationLog {
    /// Create a log holding at most `capacity` violations (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    pub fn record(&self, violation: Violation) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(violation);
    }

    pub fn record_all(&self, violations: impl IntoIterator<Item = Violation>) {
        for v in violations {
            self.record(v);
        }
    }

    /// The `n` most recent violations, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Violation> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    /// All retained violations attributed to `skill_id`, oldest first.
    pub fn by_skill(&self, skill_id: &str) -> Vec<Violation> {
        self.entries
            .lock()
            .iter()
            .filter(|v| v.skill_ids().any(|s| s == skill_id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
