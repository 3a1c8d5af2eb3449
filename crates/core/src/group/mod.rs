//! Groups: incrementally-maintained aggregations.
//!
//! A group buckets a dimension's keys through a (possibly coarser) grouping
//! function and folds a [`Reducer`] over the records currently selected.
//! After the initial fold, maintenance is purely delta-driven: work per
//! filter change is proportional to the number of records whose selection
//! flag flipped, never to the store or table size.

pub mod reducer;

pub use reducer::{Count, FnReducer, Reducer, SumBy};

use std::any::Any;
use std::collections::BTreeMap;

use crate::dimension::{DimensionState, Key};
use crate::store::RecordStore;

/// Type-erased group registered on an engine.
///
/// Erasure keeps groups with different accumulator types in one registry;
/// typed access goes through `as_any` with the accumulator type carried by
/// the caller's `GroupHandle`.
pub(crate) trait GroupSlot<R> {
    /// Applies one selection delta: `add` for every record that became
    /// selected, `remove` for every record that dropped out.
    fn on_selection_delta(
        &mut self,
        added: &[usize],
        removed: &[usize],
        store: &RecordStore<R>,
        dimensions: &[DimensionState],
    );

    fn as_any(&self) -> &dyn Any;
}

/// Concrete group state: grouping function, reducer, and accumulator table.
///
/// The table is a `BTreeMap` so enumeration is always in ascending key
/// order. Entries are never evicted once created; a key whose records all
/// drop out of the selection stays present with a zeroed accumulator, which
/// is what chart consumers expect (a bar at zero, not a vanishing bar).
pub(crate) struct GroupState<R, A> {
    /// Index of the dimension whose keys feed `group_key_of`; `None` for a
    /// whole-set group keyed by [`Key::Unit`].
    dimension: Option<usize>,
    group_key_of: Box<dyn Fn(&Key) -> Key>,
    reducer: Box<dyn Reducer<R, Acc = A>>,
    pub(crate) table: BTreeMap<Key, A>,
}

impl<R, A: Clone + 'static> GroupState<R, A> {
    pub(crate) fn new(
        dimension: Option<usize>,
        group_key_of: Box<dyn Fn(&Key) -> Key>,
        reducer: Box<dyn Reducer<R, Acc = A>>,
    ) -> Self {
        Self {
            dimension,
            group_key_of,
            reducer,
            table: BTreeMap::new(),
        }
    }

    /// The accumulator of a whole-set group, or `initial()` if nothing was
    /// ever selected.
    pub(crate) fn total(&self) -> A {
        self.table
            .get(&Key::Unit)
            .cloned()
            .unwrap_or_else(|| self.reducer.initial())
    }

    fn group_key(&self, index: usize, dimensions: &[DimensionState]) -> Key {
        match self.dimension {
            None => Key::Unit,
            Some(dim) => (self.group_key_of)(dimensions[dim].key_at(index)),
        }
    }
}

impl<R: 'static, A: Clone + 'static> GroupSlot<R> for GroupState<R, A> {
    fn on_selection_delta(
        &mut self,
        added: &[usize],
        removed: &[usize],
        store: &RecordStore<R>,
        dimensions: &[DimensionState],
    ) {
        for &index in added {
            let key = self.group_key(index, dimensions);
            let acc = self
                .table
                .entry(key)
                .or_insert_with(|| self.reducer.initial());
            self.reducer.add(acc, store.at(index));
        }

        for &index in removed {
            let key = self.group_key(index, dimensions);
            let Some(acc) = self.table.get_mut(&key) else {
                panic!("group removal for key {key:?} that was never added");
            };
            self.reducer.remove(acc, store.at(index));
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
