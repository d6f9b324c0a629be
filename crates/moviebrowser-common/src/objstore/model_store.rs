use super::{Entity, EntityId, ObjectStore};
use std::fmt;
use std::sync::Arc;

type Creator<M, D> = Box<dyn Fn(&D) -> M + Send + Sync>;

/// Object store that builds its canonical instances from lower-layer records.
///
/// Lookups take the shared lock. On a miss the lock is released and the
/// model is constructed with no lock held, then inserted under the exclusive
/// lock. Two threads that miss on the same key at the same time may both
/// construct; the first insert wins and the other construction is dropped,
/// so callers still never observe two instances for one key.
pub struct ModelObjectStore<M, D: ?Sized> {
    store: ObjectStore<M>,
    creator: Creator<M, D>,
}

impl<M, D: Entity + ?Sized> ModelObjectStore<M, D> {
    pub fn new(creator: impl Fn(&D) -> M + Send + Sync + 'static) -> Self {
        Self {
            store: ObjectStore::new(),
            creator: Box::new(creator),
        }
    }

    pub fn find(&self, key: EntityId) -> Option<Arc<M>> {
        self.store.find(key)
    }

    /// Return the canonical model for `record`, creating it on first sight.
    pub fn get_or_create(&self, record: &D) -> Arc<M> {
        let key = record.id();
        if let Some(existing) = self.store.find(key) {
            return existing;
        }

        let created = Arc::new((self.creator)(record));
        self.store.insert_if_absent(key, created)
    }
}

impl<M, D: ?Sized> fmt::Debug for ModelObjectStore<M, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelObjectStore")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    struct Record {
        id: EntityId,
        name: &'static str,
    }

    impl Entity for Record {
        fn id(&self) -> EntityId {
            self.id
        }
    }

    struct Model {
        name: String,
    }

    fn counting_store() -> (Arc<AtomicUsize>, ModelObjectStore<Model, Record>) {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let store = ModelObjectStore::new(move |record: &Record| {
            counter.fetch_add(1, Ordering::SeqCst);
            Model {
                name: record.name.to_string(),
            }
        });
        (created, store)
    }

    #[test]
    fn test_same_key_yields_same_instance() {
        let (created, store) = counting_store();
        let first = store.get_or_create(&Record { id: 42, name: "a" });
        let second = store.get_or_create(&Record { id: 42, name: "b" });

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.name, "a");
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_instance_is_rebuilt() {
        let (created, store) = counting_store();
        drop(store.get_or_create(&Record { id: 42, name: "a" }));

        assert!(store.find(42).is_none());
        let rebuilt = store.get_or_create(&Record { id: 42, name: "b" });
        assert_eq!(rebuilt.name, "b");
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_first_sight_returns_one_instance() {
        let (_created, store) = counting_store();
        let barrier = Barrier::new(8);

        let results: Vec<Arc<Model>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        store.get_or_create(&Record { id: 5, name: "x" })
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for model in &results[1..] {
            assert!(Arc::ptr_eq(model, &results[0]));
        }
    }
}
