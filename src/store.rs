//! In-memory key/value store owned by the broker task

use std::collections::HashMap;

use serde_json::Value;

/// String-keyed map of opaque JSON values.
///
/// Created empty when the broker starts and held for its entire lifetime.
/// All operations are synchronous, non-blocking, and infallible; a `set` on
/// an existing key replaces the previous value. The store is never shared:
/// the broker task is its sole owner, so no locking is needed.
#[derive(Debug, Default)]
pub struct DataStore {
    entries: HashMap<String, Value>,
}

impl DataStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `name`
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(name.into(), value);
    }

    /// Current value for `name`, or `None` if no entry exists
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Whether an entry exists for `name`
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Remove the entry for `name`. No-op when absent.
    pub fn delete(&mut self, name: &str) {
        self.entries.remove(name);
    }

    /// Number of entries currently stored
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
