use std::collections::HashMap;

use crate::registry::ToggleKey;

/// Token handed to an in-flight fetch. The fetch may only apply its result
/// while the token is still the current one for its toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Per-toggle generation counters used to discard stale fetch completions.
#[derive(Debug, Default)]
pub struct GenerationManager {
    next: u64,
    current: HashMap<ToggleKey, u64>,
}

impl GenerationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new transition for `key`, superseding any earlier one.
    pub fn begin(&mut self, key: &ToggleKey) -> Generation {
        self.next += 1;
        self.current.insert(key.clone(), self.next);
        Generation(self.next)
    }

    pub fn cancel(&mut self, key: &ToggleKey) {
        self.current.remove(key);
    }

    /// Cancel the master and every sub-toggle of a category.
    pub fn cancel_category(&mut self, category: &str) {
        self.current.retain(|k, _| !k.belongs_to(category));
    }

    pub fn is_current(&self, key: &ToggleKey, generation: Generation) -> bool {
        self.current.get(key) == Some(&generation.0)
    }
}
