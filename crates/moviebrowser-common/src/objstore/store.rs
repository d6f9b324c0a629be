use super::EntityId;
use crate::recover;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};
use tracing::trace;

/// Concurrent map from key to a weakly-held canonical instance.
///
/// The store never keeps an instance alive. While any caller still holds the
/// `Arc` returned for a key, every lookup of that key yields the same
/// allocation.
pub struct ObjectStore<T> {
    cache: RwLock<HashMap<EntityId, Weak<T>>>,
}

impl<T> ObjectStore<T> {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Look up the live instance for `key`.
    ///
    /// A slot whose target has been dropped is removed under the write lock
    /// and reported as a miss.
    pub fn find(&self, key: EntityId) -> Option<Arc<T>> {
        {
            let cache = recover(self.cache.read());
            match cache.get(&key) {
                None => return None,
                Some(weak) => {
                    if let Some(live) = weak.upgrade() {
                        return Some(live);
                    }
                }
            }
        }

        // The read guard is gone; another thread may have refilled the slot.
        let mut cache = recover(self.cache.write());
        if let Some(weak) = cache.get(&key) {
            if let Some(live) = weak.upgrade() {
                return Some(live);
            }
            cache.remove(&key);
            trace!("Purged dead object store entry {}", key);
        }
        None
    }

    /// Store `value` under `key` unless a live instance is already there.
    ///
    /// Returns whichever instance ends up canonical: the existing one if it
    /// is still alive, otherwise `value`.
    pub fn insert_if_absent(&self, key: EntityId, value: Arc<T>) -> Arc<T> {
        let mut cache = recover(self.cache.write());
        if let Some(existing) = cache.get(&key).and_then(Weak::upgrade) {
            return existing;
        }
        cache.insert(key, Arc::downgrade(&value));
        value
    }

    /// Remove every slot whose target has been dropped.
    pub fn purge(&self) -> usize {
        let mut cache = recover(self.cache.write());
        let before = cache.len();
        cache.retain(|_, weak| weak.strong_count() > 0);
        before - cache.len()
    }

    /// Number of slots, including dead ones not yet purged.
    pub fn len(&self) -> usize {
        recover(self.cache.read()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for ObjectStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ObjectStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStore")
            .field("slots", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_returns_live_instance() {
        let store = ObjectStore::new();
        let value = Arc::new("alpha".to_string());
        store.insert_if_absent(1, value.clone());

        let found = store.find(1).unwrap();
        assert!(Arc::ptr_eq(&found, &value));
        assert!(store.find(2).is_none());
    }

    #[test]
    fn test_dead_slot_is_purged_on_find() {
        let store = ObjectStore::new();
        store.insert_if_absent(1, Arc::new(10u32));
        assert_eq!(store.len(), 1);

        assert!(store.find(1).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_first_live_insert_wins() {
        let store = ObjectStore::new();
        let first = store.insert_if_absent(7, Arc::new(1u32));
        let second = store.insert_if_absent(7, Arc::new(2u32));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, 1);
    }

    #[test]
    fn test_insert_replaces_dead_slot() {
        let store = ObjectStore::new();
        drop(store.insert_if_absent(7, Arc::new(1u32)));

        let replacement = store.insert_if_absent(7, Arc::new(2u32));
        assert_eq!(*replacement, 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_purge_counts_dead_slots() {
        let store = ObjectStore::new();
        let kept = store.insert_if_absent(1, Arc::new(1u32));
        drop(store.insert_if_absent(2, Arc::new(2u32)));
        drop(store.insert_if_absent(3, Arc::new(3u32)));

        assert_eq!(store.purge(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.find(1).is_some());
        drop(kept);
    }
}
