//! Observer plumbing for model objects and collections.
//!
//! Both flavours sit on top of [`WeakObservable`]: observers are held weakly,
//! compared by identity and only notified after the owner marks itself
//! changed.

mod weak;

pub use weak::WeakObservable;

use std::any::Any;
use std::ops::Deref;

/// Receives whole-object change notifications.
pub trait ObjectObserver<S: ?Sized>: Send + Sync {
    /// `data` is an optional payload whose meaning is defined by the source.
    fn on_update(&self, source: &S, data: Option<&(dyn Any + Send + Sync)>);
}

/// Kind of change applied to an observable collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionAction {
    Clear,
    AppendItem,
    AppendRange,
    AddItemToFront,
    RemoveItem,
    UpdateItem,
}

/// Receives fine-grained collection change notifications.
///
/// Single-item actions carry `item`; `AppendRange` carries `range` with
/// exactly the items that were appended; `Clear` carries neither.
pub trait CollectionObserver<S: ?Sized, T>: Send + Sync {
    fn on_update(
        &self,
        source: &S,
        action: CollectionAction,
        item: Option<&T>,
        range: Option<&[T]>,
    );
}

/// Observable for a single model object.
pub struct ObjectObservable<S: ?Sized> {
    observers: WeakObservable<dyn ObjectObserver<S>>,
}

impl<S: ?Sized> ObjectObservable<S> {
    pub fn new() -> Self {
        Self {
            observers: WeakObservable::new(),
        }
    }

    /// Deliver to observers if the changed flag is set.
    pub fn notify_observers(&self, source: &S, data: Option<&(dyn Any + Send + Sync)>) {
        self.observers
            .for_each_observer(|observer| observer.on_update(source, data));
    }

    /// Mark the object changed and notify.
    pub fn publish(&self, source: &S, data: Option<&(dyn Any + Send + Sync)>) {
        self.observers.set_changed();
        self.notify_observers(source, data);
    }
}

impl<S: ?Sized> Default for ObjectObservable<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized> Deref for ObjectObservable<S> {
    type Target = WeakObservable<dyn ObjectObserver<S>>;

    fn deref(&self) -> &Self::Target {
        &self.observers
    }
}

/// Observable for a collection of `T`.
pub struct CollectionObservable<S: ?Sized, T> {
    observers: WeakObservable<dyn CollectionObserver<S, T>>,
}

impl<S: ?Sized, T> CollectionObservable<S, T> {
    pub fn new() -> Self {
        Self {
            observers: WeakObservable::new(),
        }
    }

    /// Deliver to observers if the changed flag is set.
    pub fn notify_observers(
        &self,
        source: &S,
        action: CollectionAction,
        item: Option<&T>,
        range: Option<&[T]>,
    ) {
        self.observers
            .for_each_observer(|observer| observer.on_update(source, action, item, range));
    }

    /// Mark the collection changed and notify.
    pub fn publish(
        &self,
        source: &S,
        action: CollectionAction,
        item: Option<&T>,
        range: Option<&[T]>,
    ) {
        self.observers.set_changed();
        self.notify_observers(source, action, item, range);
    }
}

impl<S: ?Sized, T> Default for CollectionObservable<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized, T> Deref for CollectionObservable<S, T> {
    type Target = WeakObservable<dyn CollectionObserver<S, T>>;

    fn deref(&self) -> &Self::Target {
        &self.observers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Shelf {
        name: &'static str,
        observable: CollectionObservable<Shelf, u32>,
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(&'static str, CollectionAction, Option<u32>, Vec<u32>)>>,
    }

    impl CollectionObserver<Shelf, u32> for Recorder {
        fn on_update(
            &self,
            source: &Shelf,
            action: CollectionAction,
            item: Option<&u32>,
            range: Option<&[u32]>,
        ) {
            self.events.lock().unwrap().push((
                source.name,
                action,
                item.copied(),
                range.map(<[u32]>::to_vec).unwrap_or_default(),
            ));
        }
    }

    #[derive(Default)]
    struct Pinged(Mutex<Vec<Option<i32>>>);

    impl ObjectObserver<str> for Pinged {
        fn on_update(&self, _source: &str, data: Option<&(dyn Any + Send + Sync)>) {
            let value = data.and_then(|d| d.downcast_ref::<i32>()).copied();
            self.0.lock().unwrap().push(value);
        }
    }

    #[test]
    fn test_collection_publish_carries_action_and_payload() {
        let shelf = Shelf {
            name: "books",
            observable: CollectionObservable::new(),
        };
        let recorder = Arc::new(Recorder::default());
        let observer: Arc<dyn CollectionObserver<Shelf, u32>> = recorder.clone();
        shelf.observable.add_observer(&observer);

        shelf
            .observable
            .publish(&shelf, CollectionAction::AppendRange, None, Some(&[1u32, 2][..]));
        shelf
            .observable
            .publish(&shelf, CollectionAction::RemoveItem, Some(&2), None);

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ("books", CollectionAction::AppendRange, None, vec![1, 2]));
        assert_eq!(events[1], ("books", CollectionAction::RemoveItem, Some(2), vec![]));
    }

    #[test]
    fn test_object_notify_without_changed_is_silent() {
        let observable: ObjectObservable<str> = ObjectObservable::new();
        let pinged = Arc::new(Pinged::default());
        let observer: Arc<dyn ObjectObserver<str>> = pinged.clone();
        observable.add_observer(&observer);

        observable.notify_observers("movie", None);
        assert!(pinged.0.lock().unwrap().is_empty());

        observable.publish("movie", Some(&7i32 as &(dyn Any + Send + Sync)));
        assert_eq!(*pinged.0.lock().unwrap(), vec![Some(7)]);
    }
}
