//! Response cache - prompt text to final response

use std::collections::HashMap;
use std::sync::Mutex;

/// Response cache trait - exact-key store, advisory only
pub trait ResponseCache: Send + Sync {
    /// Look up a cached response
    fn get(&self, key: &str) -> Option<String>;

    /// Store a response
    fn set(&self, key: &str, value: &str);

    /// Drop all entries
    fn clear(&self);

    /// Number of entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory cache, no eviction
pub struct InMemoryCache {
    store: Mutex<HashMap<String, String>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

// Poisoning is ignored: every operation is a single map call.
impl ResponseCache for InMemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        store.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        store.insert(key.to_string(), value.to_string());
    }

    fn clear(&self) {
        self.store.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn len(&self) -> usize {
        self.store.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
