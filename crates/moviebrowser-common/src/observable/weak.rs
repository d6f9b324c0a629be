//! Subscriber list that holds every observer through a `Weak` reference.

use crate::recover;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};
use tracing::error;

struct ObserverList<O: ?Sized> {
    observers: Vec<Weak<O>>,
    changed: bool,
}

/// Publish/subscribe primitive with weakly-held observers.
///
/// Subscribing never extends an observer's lifetime: once the last `Arc` to
/// an observer is dropped it silently disappears from the list on the next
/// delivery. Observers are compared by identity, not by value.
///
/// Delivery is gated by a dirty flag. Owners call [`set_changed`] and then
/// [`for_each_observer`]; a delivery without a preceding `set_changed` does
/// nothing.
///
/// [`set_changed`]: WeakObservable::set_changed
/// [`for_each_observer`]: WeakObservable::for_each_observer
pub struct WeakObservable<O: ?Sized> {
    state: Mutex<ObserverList<O>>,
}

impl<O: ?Sized> WeakObservable<O> {
    /// Create an empty observable with the changed flag cleared.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ObserverList {
                observers: Vec::new(),
                changed: false,
            }),
        }
    }

    /// Subscribe an observer. Adding the same observer twice is a no-op.
    pub fn add_observer(&self, observer: &Arc<O>) {
        let weak = Arc::downgrade(observer);
        let mut state = recover(self.state.lock());
        if !state.observers.iter().any(|o| Weak::ptr_eq(o, &weak)) {
            state.observers.push(weak);
        }
    }

    /// Unsubscribe an observer. Unknown observers are ignored.
    pub fn delete_observer(&self, observer: &Arc<O>) {
        let weak = Arc::downgrade(observer);
        let mut state = recover(self.state.lock());
        state.observers.retain(|o| !Weak::ptr_eq(o, &weak));
    }

    /// Drop every subscription.
    pub fn delete_observers(&self) {
        recover(self.state.lock()).observers.clear();
    }

    /// Number of observers that are still alive.
    pub fn observer_count(&self) -> usize {
        recover(self.state.lock())
            .observers
            .iter()
            .filter(|o| o.strong_count() > 0)
            .count()
    }

    pub fn has_changed(&self) -> bool {
        recover(self.state.lock()).changed
    }

    pub fn set_changed(&self) {
        recover(self.state.lock()).changed = true;
    }

    pub fn clear_changed(&self) {
        recover(self.state.lock()).changed = false;
    }

    /// Deliver to every live observer if the changed flag is set.
    ///
    /// The flag is cleared and a snapshot of live observers taken under the
    /// lock; dead entries are purged at the same time. Callbacks then run with
    /// the lock released, so an observer may subscribe, unsubscribe or trigger
    /// another delivery from inside `action`. A panicking observer is logged
    /// and skipped.
    pub fn for_each_observer(&self, mut action: impl FnMut(&O)) {
        let live: Vec<Arc<O>> = {
            let mut state = recover(self.state.lock());
            if !state.changed {
                return;
            }
            state.changed = false;

            let mut live = Vec::with_capacity(state.observers.len());
            state.observers.retain(|weak| match weak.upgrade() {
                Some(observer) => {
                    live.push(observer);
                    true
                }
                None => false,
            });
            live
        };

        for observer in &live {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| action(observer)));
            if let Err(payload) = delivered {
                error!("Observer panicked during notification: {}", panic_message(&payload));
            }
        }
    }
}

impl<O: ?Sized> Default for WeakObservable<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ?Sized> fmt::Debug for WeakObservable<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = recover(self.state.lock());
        f.debug_struct("WeakObservable")
            .field("observers", &state.observers.len())
            .field("changed", &state.changed)
            .finish()
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}
