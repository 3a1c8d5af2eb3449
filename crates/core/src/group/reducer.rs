//! Incremental aggregation reducers.

use rust_decimal::Decimal;

/// An incremental aggregation over records entering and leaving a selection.
///
/// `remove` must be the exact inverse of `add` for every field of the
/// accumulator. Groups apply reducers in arbitrary interleavings as filters
/// toggle, so any asymmetry silently corrupts aggregates. Keep accumulators
/// to associative, commutative running sums; derive ratios at read time.
pub trait Reducer<R> {
    /// Per-group-key aggregate state.
    type Acc: Clone + 'static;

    /// A fresh accumulator for a group key seen for the first time.
    fn initial(&self) -> Self::Acc;

    /// Folds a record entering the selection into the accumulator.
    fn add(&self, acc: &mut Self::Acc, record: &R);

    /// Undoes `add` for a record leaving the selection.
    fn remove(&self, acc: &mut Self::Acc, record: &R);
}

/// Counts selected records per group key.
#[derive(Debug, Clone, Copy, Default)]
pub struct Count;

impl<R> Reducer<R> for Count {
    type Acc = u64;

    fn initial(&self) -> u64 {
        0
    }

    fn add(&self, acc: &mut u64, _record: &R) {
        *acc += 1;
    }

    /// # Panics
    ///
    /// Panics on underflow: removing below zero means a record left the
    /// selection that never entered it, which is a bookkeeping defect.
    fn remove(&self, acc: &mut u64, _record: &R) {
        assert!(*acc > 0, "count reducer underflow: remove without a matching add");
        *acc -= 1;
    }
}

/// Sums a per-record amount per group key.
#[derive(Debug, Clone, Copy)]
pub struct SumBy<F> {
    amount_of: F,
}

impl<F> SumBy<F> {
    /// Sums `amount_of(record)` over the selected records of each group key.
    pub const fn new(amount_of: F) -> Self {
        Self { amount_of }
    }
}

impl<R, F> Reducer<R> for SumBy<F>
where
    F: Fn(&R) -> Decimal,
{
    type Acc = Decimal;

    fn initial(&self) -> Decimal {
        Decimal::ZERO
    }

    fn add(&self, acc: &mut Decimal, record: &R) {
        *acc += (self.amount_of)(record);
    }

    fn remove(&self, acc: &mut Decimal, record: &R) {
        *acc -= (self.amount_of)(record);
    }
}

/// A reducer assembled from three closures, for custom accumulators.
#[derive(Debug, Clone, Copy)]
pub struct FnReducer<I, F, G> {
    init: I,
    add: F,
    remove: G,
}

impl<I, F, G> FnReducer<I, F, G> {
    /// Builds a reducer from `init` / `add` / `remove` closures.
    ///
    /// The same symmetry contract applies: `remove` must exactly invert
    /// `add`.
    pub const fn new(init: I, add: F, remove: G) -> Self {
        Self { init, add, remove }
    }
}

impl<R, A, I, F, G> Reducer<R> for FnReducer<I, F, G>
where
    A: Clone + 'static,
    I: Fn() -> A,
    F: Fn(&mut A, &R),
    G: Fn(&mut A, &R),
{
    type Acc = A;

    fn initial(&self) -> A {
        (self.init)()
    }

    fn add(&self, acc: &mut A, record: &R) {
        (self.add)(acc, record);
    }

    fn remove(&self, acc: &mut A, record: &R) {
        (self.remove)(acc, record);
    }
}
