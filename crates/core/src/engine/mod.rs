//! The filter coordinator: one engine instance owns the store, every
//! dimension and group, and the combined selection state.
//!
//! All mutation goes through `&mut self`, which is what makes a filter
//! change atomic: the delta computation and its dispatch to every group
//! finish before the next operation can start.

pub mod error;
mod selection;

#[cfg(test)]
mod tests;

pub use error::FilterError;

use std::collections::BTreeSet;
use std::marker::PhantomData;

use crate::dimension::{DimensionState, Filter, Key, KeyKind};
use crate::group::{GroupSlot, GroupState, Reducer};
use crate::store::RecordStore;

use selection::SelectionSet;

/// Identifies a dimension registered on an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionHandle(usize);

/// Identifies a group registered on an [`Engine`], carrying its accumulator
/// type so reads come back statically typed.
#[derive(Debug)]
pub struct GroupHandle<A> {
    index: usize,
    _acc: PhantomData<fn() -> A>,
}

impl<A> Clone for GroupHandle<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for GroupHandle<A> {}

/// Multi-dimensional filtering and aggregation engine over an immutable
/// record set.
///
/// Callers register dimensions (projections of records to sortable keys)
/// and groups (incremental aggregations), then apply range or value filters
/// on any subset of dimensions. Every group stays current as filters
/// change, at a cost proportional to the number of records whose combined
/// selection flag actually flipped.
pub struct Engine<R> {
    store: RecordStore<R>,
    dimensions: Vec<DimensionState>,
    groups: Vec<Box<dyn GroupSlot<R>>>,
    selection: SelectionSet,
}

impl<R: 'static> Engine<R> {
    /// Creates an engine over a record store. Until dimensions are filtered,
    /// every record is selected.
    #[must_use]
    pub fn new(store: RecordStore<R>) -> Self {
        let selection = SelectionSet::new(store.len());
        Self {
            store,
            dimensions: Vec::new(),
            groups: Vec::new(),
            selection,
        }
    }

    /// Creates an engine directly over a materialized record set.
    #[must_use]
    pub fn from_records(records: Vec<R>) -> Self {
        Self::new(RecordStore::new(records))
    }

    /// Registers a dimension: computes and caches `key_of(record)` for every
    /// record (the only O(n) cost a dimension ever pays) and installs the
    /// identity filter.
    ///
    /// # Panics
    ///
    /// Panics if `key_of` yields keys of more than one kind across the
    /// store; a projection that changes shape per record is a caller bug.
    pub fn add_dimension(
        &mut self,
        name: impl Into<String>,
        key_of: impl Fn(&R) -> Key,
    ) -> DimensionHandle {
        let state = DimensionState::new(name.into(), key_of, &self.store);
        self.dimensions.push(state);
        DimensionHandle(self.dimensions.len() - 1)
    }

    /// Replaces the dimension's filter with a closed range `[lo, hi]`.
    ///
    /// An inverted range (`lo > hi`) is accepted and matches nothing.
    ///
    /// # Errors
    ///
    /// [`FilterError::MixedRangeBounds`] if the bounds are of two kinds;
    /// [`FilterError::KindMismatch`] if they do not match the dimension's
    /// key kind. The prior filter is retained on error.
    pub fn filter_range(
        &mut self,
        dimension: DimensionHandle,
        lo: impl Into<Key>,
        hi: impl Into<Key>,
    ) -> Result<(), FilterError> {
        let (lo, hi) = (lo.into(), hi.into());
        if lo.kind() != hi.kind() {
            return Err(FilterError::MixedRangeBounds {
                lo: lo.kind(),
                hi: hi.kind(),
            });
        }
        self.check_kind(dimension, lo.kind())?;
        self.install_filter(dimension, Filter::Range { lo, hi });
        Ok(())
    }

    /// Replaces the dimension's filter with an explicit value set.
    ///
    /// An empty set is accepted and matches nothing.
    ///
    /// # Errors
    ///
    /// [`FilterError::KindMismatch`] if any value does not match the
    /// dimension's key kind. The prior filter is retained on error.
    pub fn filter_among(
        &mut self,
        dimension: DimensionHandle,
        values: impl IntoIterator<Item = Key>,
    ) -> Result<(), FilterError> {
        let values: BTreeSet<Key> = values.into_iter().collect();
        for value in &values {
            self.check_kind(dimension, value.kind())?;
        }
        self.install_filter(dimension, Filter::Among(values));
        Ok(())
    }

    /// Replaces the dimension's filter with a single accepted value — what a
    /// pie-slice or row click sends.
    ///
    /// # Errors
    ///
    /// [`FilterError::KindMismatch`] if the value does not match the
    /// dimension's key kind. The prior filter is retained on error.
    pub fn filter_one(
        &mut self,
        dimension: DimensionHandle,
        value: impl Into<Key>,
    ) -> Result<(), FilterError> {
        self.filter_among(dimension, [value.into()])
    }

    /// Resets the dimension to the identity filter.
    pub fn filter_all(&mut self, dimension: DimensionHandle) {
        self.install_filter(dimension, Filter::All);
    }

    /// The dimension's currently-active filter.
    #[must_use]
    pub fn current_filter(&self, dimension: DimensionHandle) -> &Filter {
        &self.dimensions[dimension.0].filter
    }

    /// The dimension's registered name.
    #[must_use]
    pub fn dimension_name(&self, dimension: DimensionHandle) -> &str {
        self.dimensions[dimension.0].name()
    }

    /// Registers a group over a dimension: `group_key_of` coarsens the
    /// dimension's key (identity is `Key::clone`), and `reducer` maintains
    /// one accumulator per group key. The initial fold over the currently
    /// selected records is the only full pass a group ever pays.
    pub fn add_group<A, D>(
        &mut self,
        dimension: DimensionHandle,
        group_key_of: impl Fn(&Key) -> Key + 'static,
        reducer: D,
    ) -> GroupHandle<A>
    where
        A: Clone + 'static,
        D: Reducer<R, Acc = A> + 'static,
    {
        self.register_group(GroupState::new(
            Some(dimension.0),
            Box::new(group_key_of),
            Box::new(reducer),
        ))
    }

    /// Registers a whole-set group: every record maps to the single
    /// [`Key::Unit`] key. Drives "N of M selected" style aggregates.
    pub fn add_group_all<A, D>(&mut self, reducer: D) -> GroupHandle<A>
    where
        A: Clone + 'static,
        D: Reducer<R, Acc = A> + 'static,
    {
        self.register_group(GroupState::new(None, Box::new(Key::clone), Box::new(reducer)))
    }

    /// The group's `(group key, accumulator)` pairs in ascending key order.
    ///
    /// Enumeration is deterministic; a key whose records all dropped out of
    /// the selection stays present with a zeroed accumulator.
    #[must_use]
    pub fn group_results<A: Clone + 'static>(&self, group: GroupHandle<A>) -> Vec<(Key, A)> {
        self.group_state(group)
            .table
            .iter()
            .map(|(key, acc)| (key.clone(), acc.clone()))
            .collect()
    }

    /// The single accumulator of a whole-set group registered with
    /// [`Engine::add_group_all`] (its `initial()` if nothing was ever
    /// selected).
    #[must_use]
    pub fn group_total<A: Clone + 'static>(&self, group: GroupHandle<A>) -> A {
        self.group_state(group).total()
    }

    /// Number of records passing every dimension's filter.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selection.selected_count()
    }

    /// Total number of records in the store.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.store.len()
    }

    /// Whether the record at `index` passes every dimension's filter.
    #[must_use]
    pub fn is_selected(&self, index: usize) -> bool {
        self.selection.is_selected(index)
    }

    /// Indices of records passing every dimension's filter, ascending.
    #[must_use]
    pub fn selected_indices(&self) -> Vec<usize> {
        self.selection.selected_indices().collect()
    }

    /// Indices of records passing every dimension's filter *except*
    /// `dimension`'s own — the view a chart uses to keep its own categories
    /// visible while it filters itself.
    #[must_use]
    pub fn selection_excluding(&self, dimension: DimensionHandle) -> Vec<usize> {
        let own = &self.dimensions[dimension.0];
        (0..self.store.len())
            .filter(|&index| {
                let fails = self.selection.failing_dimensions(index);
                fails == 0 || (fails == 1 && !own.passes[index])
            })
            .collect()
    }

    /// The `k` selected records with the greatest keys on `dimension`,
    /// descending, ties broken by ascending record index.
    #[must_use]
    pub fn top(&self, dimension: DimensionHandle, k: usize) -> Vec<&R> {
        let keys = &self.dimensions[dimension.0].keys;
        let mut indices = self.selected_indices();
        indices.sort_by(|&a, &b| keys[b].cmp(&keys[a]).then(a.cmp(&b)));
        indices.into_iter().take(k).map(|i| self.store.at(i)).collect()
    }

    /// The `k` selected records with the smallest keys on `dimension`,
    /// ascending, ties broken by ascending record index.
    #[must_use]
    pub fn bottom(&self, dimension: DimensionHandle, k: usize) -> Vec<&R> {
        let keys = &self.dimensions[dimension.0].keys;
        let mut indices = self.selected_indices();
        indices.sort_by(|&a, &b| keys[a].cmp(&keys[b]).then(a.cmp(&b)));
        indices.into_iter().take(k).map(|i| self.store.at(i)).collect()
    }

    /// The record store this engine aggregates over.
    #[must_use]
    pub fn store(&self) -> &RecordStore<R> {
        &self.store
    }

    fn check_kind(&self, dimension: DimensionHandle, got: KeyKind) -> Result<(), FilterError> {
        let state = &self.dimensions[dimension.0];
        match state.kind {
            Some(expected) if expected != got => Err(FilterError::KindMismatch {
                dimension: state.name().to_string(),
                expected,
                got,
            }),
            // No records, no key kind to disagree with.
            _ => Ok(()),
        }
    }

    /// Installs a validated filter and propagates the selection delta.
    ///
    /// Only the changed dimension's predicate is re-evaluated, against its
    /// cached keys; all other dimensions' pass/fail bits are reused. Records
    /// whose failing-dimension count crosses zero form the delta dispatched
    /// to every group. Reapplying an identical filter yields an empty delta.
    fn install_filter(&mut self, dimension: DimensionHandle, filter: Filter) {
        let mut added = Vec::new();
        let mut removed = Vec::new();

        let state = &mut self.dimensions[dimension.0];
        state.filter = filter;
        for index in 0..state.keys.len() {
            let passes = state.filter.accepts(&state.keys[index]);
            if passes == state.passes[index] {
                continue;
            }
            state.passes[index] = passes;
            if passes {
                if self.selection.unfail(index) {
                    added.push(index);
                }
            } else if self.selection.fail(index) {
                removed.push(index);
            }
        }

        for group in &mut self.groups {
            group.on_selection_delta(&added, &removed, &self.store, &self.dimensions);
        }
    }

    fn register_group<A: Clone + 'static>(&mut self, mut state: GroupState<R, A>) -> GroupHandle<A> {
        let selected: Vec<usize> = self.selection.selected_indices().collect();
        state.on_selection_delta(&selected, &[], &self.store, &self.dimensions);
        self.groups.push(Box::new(state));
        GroupHandle {
            index: self.groups.len() - 1,
            _acc: PhantomData,
        }
    }

    fn group_state<A: Clone + 'static>(&self, group: GroupHandle<A>) -> &GroupState<R, A> {
        self.groups[group.index]
            .as_any()
            .downcast_ref::<GroupState<R, A>>()
            .unwrap_or_else(|| panic!("group handle does not belong to this engine"))
    }
}
