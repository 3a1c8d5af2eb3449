//! Dimensions: named projections of records to sortable keys.
//!
//! A dimension caches `key_of(record)` for every record once at registration
//! and keeps a per-record pass/fail bit for its own filter. Dimensions are
//! registered on and driven through [`crate::engine::Engine`].

pub mod filter;
pub mod key;

pub use filter::Filter;
pub use key::{Key, KeyKind};

use crate::store::RecordStore;

/// Internal per-dimension state owned by the engine.
///
/// The projection itself is not retained: the store is immutable, so the key
/// cache computed at registration is complete for the engine's lifetime.
pub(crate) struct DimensionState {
    name: String,
    /// Cached `key_of(record)` per record, computed once at registration.
    pub(crate) keys: Vec<Key>,
    /// Key kind common to all cached keys; `None` for an empty store.
    pub(crate) kind: Option<KeyKind>,
    pub(crate) filter: Filter,
    /// Per-record "passes own filter" bit.
    pub(crate) passes: Vec<bool>,
}

impl DimensionState {
    /// Caches keys for every record and starts with the identity filter.
    ///
    /// Panics if the projection yields keys of more than one kind across the
    /// store; a projection that changes shape per record is a caller bug.
    pub(crate) fn new<R>(
        name: String,
        key_of: impl Fn(&R) -> Key,
        store: &RecordStore<R>,
    ) -> Self {
        let keys: Vec<Key> = store.iter().map(key_of).collect();

        let mut kind = None;
        for key in &keys {
            match kind {
                None => kind = Some(key.kind()),
                Some(expected) => assert!(
                    expected == key.kind(),
                    "dimension '{name}' produced mixed key kinds: {expected:?} and {:?}",
                    key.kind(),
                ),
            }
        }

        let passes = vec![true; keys.len()];
        Self {
            name,
            keys,
            kind,
            filter: Filter::All,
            passes,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn key_at(&self, index: usize) -> &Key {
        &self.keys[index]
    }
}
