//! Identity-keyed caches of canonical instances.
//!
//! [`ObjectStore`] maps an integer key to a weakly-held `Arc`; dead slots are
//! purged lazily whenever they are touched. [`ModelObjectStore`] adds a
//! factory so the canonical instance is built from a lower-layer record the
//! first time that record is seen.

mod model_store;
mod store;

pub use model_store::ModelObjectStore;
pub use store::ObjectStore;

/// Identity key of an entity. Valid keys are positive.
pub type EntityId = i64;

/// Anything that carries a stable identity key.
pub trait Entity {
    fn id(&self) -> EntityId;
}
