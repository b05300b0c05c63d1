//! Cache Store Module
//!
//! Key to entry storage with lazy TTL expiration.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::cache::CacheEntry;

// == Entry Store ==
/// Thread-safe key-value storage; the single source of truth for cached data.
///
/// Every method takes `&self`. Writes hold the lock only for the map mutation
/// itself, and readers see a write as soon as it returns.
#[derive(Debug)]
pub struct EntryStore<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
}

impl<T> Default for EntryStore<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Clone> EntryStore<T> {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Put ==
    /// Stores a value that expires `ttl` from now.
    ///
    /// Any prior entry for the key is replaced regardless of its expiry state.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Time-to-live; zero means the entry is expired on arrival
    pub fn put(&self, key: String, value: T, ttl: Duration) {
        let entry = CacheEntry::new(value, ttl);
        self.entries.write().insert(key, entry);
    }

    // == Lookup ==
    /// Returns the value if present and not expired.
    ///
    /// Absent and expired keys are indistinguishable to the caller. An expired
    /// entry found here is reclaimed.
    pub fn lookup(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired_at(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        // Re-check under the write lock: a concurrent put may have replaced it.
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|entry| entry.is_expired()) {
            entries.remove(key);
        }
        None
    }

    // == Remove ==
    /// Removes an entry by key. Absent keys are a no-op.
    ///
    /// Returns true if an entry was physically removed.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    // == Clear ==
    /// Removes every entry in a single critical section.
    ///
    /// Returns the number of entries dropped.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write();
        let count = entries.len();
        entries.clear();
        count
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread::sleep;

    const LONG_TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_store_new() {
        let store: EntryStore<String> = EntryStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_put_and_lookup() {
        let store = EntryStore::new();

        store.put("key1".to_string(), "value1".to_string(), LONG_TTL);

        assert_eq!(store.lookup("key1").as_deref(), Some("value1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_lookup_nonexistent() {
        let store: EntryStore<u32> = EntryStore::new();
        assert!(store.lookup("nonexistent").is_none());
    }

    #[test]
    fn test_store_remove() {
        let store = EntryStore::new();

        store.put("key1".to_string(), 1, LONG_TTL);
        assert!(store.remove("key1"));

        assert!(store.is_empty());
        assert!(store.lookup("key1").is_none());
    }

    #[test]
    fn test_store_remove_nonexistent_is_noop() {
        let store: EntryStore<u32> = EntryStore::new();
        assert!(!store.remove("nonexistent"));
    }

    #[test]
    fn test_store_overwrite() {
        let store = EntryStore::new();

        store.put("key1".to_string(), "value1", LONG_TTL);
        store.put("key1".to_string(), "value2", LONG_TTL);

        assert_eq!(store.lookup("key1"), Some("value2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_overwrite_revives_expired_key() {
        let store = EntryStore::new();

        store.put("key1".to_string(), 1, Duration::ZERO);
        store.put("key1".to_string(), 2, LONG_TTL);

        assert_eq!(store.lookup("key1"), Some(2));
    }

    #[test]
    fn test_store_zero_ttl_is_a_miss() {
        let store = EntryStore::new();

        store.put("key1".to_string(), 1, Duration::ZERO);

        assert!(store.lookup("key1").is_none());
    }

    #[test]
    fn test_store_ttl_expiration_reclaims_entry() {
        let store = EntryStore::new();

        store.put("key1".to_string(), "value1", Duration::from_millis(50));
        assert!(store.lookup("key1").is_some());

        sleep(Duration::from_millis(100));

        assert!(store.lookup("key1").is_none());
        assert!(store.is_empty(), "Expired entry should be reclaimed on read");
    }

    #[test]
    fn test_store_clear() {
        let store = EntryStore::new();

        for key in ["a", "b", "c"] {
            store.put(key.to_string(), key, LONG_TTL);
        }

        assert_eq!(store.clear(), 3);
        assert!(store.is_empty());
        for key in ["a", "b", "c"] {
            assert!(store.lookup(key).is_none());
        }
    }

    #[test]
    fn test_store_clear_is_atomic_for_readers() {
        let store = Arc::new(EntryStore::new());
        for i in 0..64 {
            store.put(format!("key{i}"), i, LONG_TTL);
        }

        let reader = {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..1_000 {
                    let len = store.len();
                    assert!(len == 64 || len == 0, "Observed partial clear: {len}");
                }
            })
        };

        store.clear();
        reader.join().unwrap();
    }
}
