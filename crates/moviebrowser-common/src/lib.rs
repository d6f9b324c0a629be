//! Shared building blocks for the movie browser model layer.
//!
//! - [`observable`]: publish/subscribe with weakly-held subscribers
//! - [`objstore`]: identity-keyed caches that hand out one canonical
//!   instance per key for as long as someone holds it

pub mod objstore;
pub mod observable;

pub use objstore::{Entity, EntityId, ModelObjectStore, ObjectStore};
pub use observable::{
    CollectionAction, CollectionObservable, CollectionObserver, ObjectObservable, ObjectObserver,
    WeakObservable,
};

use std::sync::{LockResult, PoisonError};

/// Recover the guard from a poisoned lock.
///
/// Observer callbacks run under `catch_unwind`, and every critical section
/// in this workspace leaves its data consistent before calling out, so a
/// poisoned lock still guards valid state.
pub fn recover<G>(result: LockResult<G>) -> G {
    result.unwrap_or_else(PoisonError::into_inner)
}
