//! Engine tests: selection bookkeeping, incremental-vs-batch equivalence,
//! and filter-change algebra.

use std::collections::BTreeSet;

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::dimension::{Filter, Key};
use crate::group::{Count, SumBy};

use super::{Engine, FilterError};

#[derive(Debug, Clone, PartialEq, Eq)]
struct TestRow {
    label: &'static str,
    bucket: i64,
    amount: Decimal,
}

const LABELS: [&str; 3] = ["food", "sleep", "steps"];

fn row(label: &'static str, bucket: i64, amount: Decimal) -> TestRow {
    TestRow {
        label,
        bucket,
        amount,
    }
}

/// Engine with a label dimension, a bucket dimension, a per-label amount
/// sum, a per-bucket count, and a whole-set count.
struct Fixture {
    engine: Engine<TestRow>,
    labels: super::DimensionHandle,
    buckets: super::DimensionHandle,
    amount_by_label: super::GroupHandle<Decimal>,
    count_by_bucket: super::GroupHandle<u64>,
    all: super::GroupHandle<u64>,
}

fn fixture(rows: Vec<TestRow>) -> Fixture {
    let mut engine = Engine::from_records(rows);
    let labels = engine.add_dimension("label", |r: &TestRow| Key::from(r.label));
    let buckets = engine.add_dimension("bucket", |r: &TestRow| Key::Int(r.bucket));
    let amount_by_label = engine.add_group(labels, Key::clone, SumBy::new(|r: &TestRow| r.amount));
    let count_by_bucket = engine.add_group(buckets, Key::clone, Count);
    let all = engine.add_group_all(Count);
    Fixture {
        engine,
        labels,
        buckets,
        amount_by_label,
        count_by_bucket,
        all,
    }
}

// ========================================================================
// Concrete scenarios
// ========================================================================

#[test]
fn test_sum_is_exact_across_a_second_dimension_filter() {
    // Three records, all labelled "food", amounts [2, 0, 3].
    let mut fx = fixture(vec![
        row("food", 1, dec!(2)),
        row("food", 2, dec!(0)),
        row("food", 3, dec!(3)),
    ]);

    let before = fx.engine.group_results(fx.amount_by_label);
    assert_eq!(before, vec![(Key::from("food"), dec!(5))]);

    // Excluding the zero-amount record through the bucket dimension must
    // leave the label sum exactly 5, with no transient states.
    fx.engine.filter_among(fx.buckets, [Key::Int(1), Key::Int(3)]).unwrap();

    let after = fx.engine.group_results(fx.amount_by_label);
    assert_eq!(after, vec![(Key::from("food"), dec!(5))]);
    assert_eq!(fx.engine.selected_count(), 2);
}

#[test]
fn test_inverted_range_empties_the_selection() {
    let mut fx = fixture(vec![
        row("food", 10, dec!(1)),
        row("sleep", 5, dec!(2)),
    ]);

    fx.engine.filter_range(fx.buckets, 10_i64, 5_i64).unwrap();

    assert_eq!(fx.engine.selected_count(), 0);
    assert_eq!(fx.engine.group_total(fx.all), 0);
    // Group keys stay enumerable, with zeroed accumulators.
    assert_eq!(
        fx.engine.group_results(fx.count_by_bucket),
        vec![(Key::Int(5), 0), (Key::Int(10), 0)]
    );
}

#[test]
fn test_filter_all_everywhere_restores_the_full_count() {
    let rows = vec![
        row("food", 1, dec!(4)),
        row("sleep", 2, dec!(5)),
        row("steps", 3, dec!(6)),
    ];
    let mut fx = fixture(rows);

    fx.engine.filter_range(fx.buckets, 2_i64, 3_i64).unwrap();
    fx.engine.filter_one(fx.labels, "sleep").unwrap();
    assert_eq!(fx.engine.selected_count(), 1);

    fx.engine.filter_all(fx.buckets);
    fx.engine.filter_all(fx.labels);

    assert_eq!(fx.engine.group_total(fx.all), 3);
    assert_eq!(fx.engine.selected_count(), fx.engine.record_count());
}

#[test]
fn test_reapplying_a_filter_is_a_no_op() {
    let mut fx = fixture(vec![
        row("food", 1, dec!(2)),
        row("sleep", 2, dec!(3)),
        row("steps", 3, dec!(4)),
    ]);

    fx.engine.filter_range(fx.buckets, 1_i64, 2_i64).unwrap();
    let once = fx.engine.group_results(fx.amount_by_label);
    let count_once = fx.engine.selected_count();

    fx.engine.filter_range(fx.buckets, 1_i64, 2_i64).unwrap();

    assert_eq!(fx.engine.group_results(fx.amount_by_label), once);
    assert_eq!(fx.engine.selected_count(), count_once);
}

#[test]
fn test_rejected_filter_retains_prior_state() {
    let mut fx = fixture(vec![row("food", 1, dec!(2))]);
    fx.engine.filter_one(fx.labels, "food").unwrap();

    // Integer operands aimed at a text dimension.
    let err = fx.engine.filter_range(fx.labels, 1_i64, 5_i64).unwrap_err();
    assert!(matches!(err, FilterError::KindMismatch { .. }));

    assert_eq!(
        *fx.engine.current_filter(fx.labels),
        Filter::Among([Key::from("food")].into())
    );
    assert_eq!(fx.engine.selected_count(), 1);
}

#[test]
fn test_mixed_range_bounds_are_rejected() {
    let mut fx = fixture(vec![row("food", 1, dec!(2))]);

    let err = fx
        .engine
        .filter_range(fx.buckets, Key::Int(1), Key::from(dec!(5)))
        .unwrap_err();

    assert!(matches!(err, FilterError::MixedRangeBounds { .. }));
    assert!(fx.engine.current_filter(fx.buckets).is_all());
}

#[test]
fn test_empty_value_set_matches_nothing() {
    let mut fx = fixture(vec![row("food", 1, dec!(2))]);

    fx.engine.filter_among(fx.labels, []).unwrap();

    assert_eq!(fx.engine.selected_count(), 0);
}

#[test]
fn test_selection_excluding_ignores_own_filter_only() {
    let mut fx = fixture(vec![
        row("food", 1, dec!(2)),
        row("sleep", 2, dec!(3)),
        row("steps", 9, dec!(4)),
    ]);

    fx.engine.filter_one(fx.labels, "food").unwrap();
    fx.engine.filter_range(fx.buckets, 1_i64, 5_i64).unwrap();

    // Fully selected: record 0 only.
    assert_eq!(fx.engine.selected_indices(), vec![0]);
    // Ignoring the label filter readmits record 1, but not record 2,
    // which also fails the bucket filter.
    assert_eq!(fx.engine.selection_excluding(fx.labels), vec![0, 1]);
    // Ignoring the bucket filter readmits nothing extra.
    assert_eq!(fx.engine.selection_excluding(fx.buckets), vec![0]);
}

#[test]
fn test_top_and_bottom_respect_selection_and_order() {
    let mut fx = fixture(vec![
        row("food", 3, dec!(1)),
        row("sleep", 1, dec!(2)),
        row("steps", 2, dec!(3)),
        row("food", 8, dec!(4)),
    ]);

    fx.engine.filter_range(fx.buckets, 1_i64, 3_i64).unwrap();

    let top: Vec<i64> = fx.engine.top(fx.buckets, 2).iter().map(|r| r.bucket).collect();
    assert_eq!(top, vec![3, 2]);

    let bottom: Vec<i64> = fx.engine.bottom(fx.buckets, 2).iter().map(|r| r.bucket).collect();
    assert_eq!(bottom, vec![1, 2]);
}

#[test]
fn test_group_registered_after_filters_sees_current_selection() {
    let mut fx = fixture(vec![
        row("food", 1, dec!(2)),
        row("sleep", 2, dec!(3)),
    ]);
    fx.engine.filter_one(fx.labels, "sleep").unwrap();

    let late = fx.engine.add_group(fx.labels, Key::clone, Count);

    // Only the selected record was folded in; "food" has no entry yet.
    assert_eq!(fx.engine.group_results(late), vec![(Key::from("sleep"), 1)]);
}

#[test]
#[should_panic(expected = "mixed key kinds")]
fn test_mixed_kind_projection_panics() {
    let mut engine = Engine::from_records(vec![
        row("food", 1, dec!(2)),
        row("sleep", 2, dec!(3)),
    ]);
    engine.add_dimension("broken", |r: &TestRow| {
        if r.bucket == 1 {
            Key::Int(r.bucket)
        } else {
            Key::from(r.label)
        }
    });
}

// ========================================================================
// Properties: incremental maintenance ≡ batch recomputation
// ========================================================================

#[derive(Debug, Clone)]
enum Op {
    BucketRange(i64, i64),
    LabelAmong(Vec<usize>),
    BucketAll,
    LabelAll,
}

/// Applies one operation to an engine and mirrors it into the model.
fn apply(
    fx: &mut Fixture,
    op: &Op,
    bucket_range: &mut Option<(i64, i64)>,
    label_set: &mut Option<BTreeSet<usize>>,
) {
    match op {
        Op::BucketRange(lo, hi) => {
            fx.engine.filter_range(fx.buckets, *lo, *hi).unwrap();
            *bucket_range = Some((*lo, *hi));
        }
        Op::LabelAmong(indices) => {
            let set: BTreeSet<usize> = indices.iter().copied().collect();
            fx.engine
                .filter_among(fx.labels, set.iter().map(|&i| Key::from(LABELS[i])))
                .unwrap();
            *label_set = Some(set);
        }
        Op::BucketAll => {
            fx.engine.filter_all(fx.buckets);
            *bucket_range = None;
        }
        Op::LabelAll => {
            fx.engine.filter_all(fx.labels);
            *label_set = None;
        }
    }
}

fn model_selects(
    r: &TestRow,
    bucket_range: Option<(i64, i64)>,
    label_set: &Option<BTreeSet<usize>>,
) -> bool {
    let bucket_ok = bucket_range.is_none_or(|(lo, hi)| lo <= r.bucket && r.bucket <= hi);
    let label_ok = label_set
        .as_ref()
        .is_none_or(|set| set.iter().any(|&i| LABELS[i] == r.label));
    bucket_ok && label_ok
}

/// Expected per-label sums by brute-force refold over the full store.
fn expected_label_sums(
    rows: &[TestRow],
    bucket_range: Option<(i64, i64)>,
    label_set: &Option<BTreeSet<usize>>,
) -> Vec<(Key, Decimal)> {
    // Every label of the store has an entry: groups were registered before
    // any filter, so every record was folded in (and possibly back out).
    let mut table: std::collections::BTreeMap<Key, Decimal> = rows
        .iter()
        .map(|r| (Key::from(r.label), Decimal::ZERO))
        .collect();
    for r in rows {
        if model_selects(r, bucket_range, label_set) {
            *table.get_mut(&Key::from(r.label)).unwrap() += r.amount;
        }
    }
    table.into_iter().collect()
}

fn row_strategy() -> impl Strategy<Value = TestRow> {
    (0..LABELS.len(), 0..10_i64, 0..100_i64).prop_map(|(label, bucket, amount)| TestRow {
        label: LABELS[label],
        bucket,
        amount: Decimal::from(amount),
    })
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..10_i64, 0..10_i64).prop_map(|(lo, hi)| Op::BucketRange(lo, hi)),
        prop::collection::vec(0..LABELS.len(), 0..=LABELS.len()).prop_map(Op::LabelAmong),
        Just(Op::BucketAll),
        Just(Op::LabelAll),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// After any operation sequence, incrementally-maintained group results
    /// equal a from-scratch refold, and the selection invariant holds for
    /// every record.
    #[test]
    fn prop_incremental_equals_batch(
        rows in prop::collection::vec(row_strategy(), 1..32),
        ops in prop::collection::vec(op_strategy(), 0..12),
    ) {
        let mut fx = fixture(rows.clone());
        let mut bucket_range = None;
        let mut label_set = None;

        for op in &ops {
            apply(&mut fx, op, &mut bucket_range, &mut label_set);

            // Selection invariant: combined flag == AND of per-dimension
            // predicates, for every record, after every operation.
            for (index, r) in rows.iter().enumerate() {
                prop_assert_eq!(
                    fx.engine.is_selected(index),
                    model_selects(r, bucket_range, &label_set)
                );
            }
        }

        let expected = expected_label_sums(&rows, bucket_range, &label_set);
        prop_assert_eq!(fx.engine.group_results(fx.amount_by_label), expected);

        let expected_count = rows
            .iter()
            .filter(|r| model_selects(r, bucket_range, &label_set))
            .count() as u64;
        prop_assert_eq!(fx.engine.group_total(fx.all), expected_count);
    }

    /// Reverting every dimension to the identity filter restores the
    /// unfiltered aggregates, whatever happened in between.
    #[test]
    fn prop_filter_all_round_trip(
        rows in prop::collection::vec(row_strategy(), 1..32),
        ops in prop::collection::vec(op_strategy(), 0..12),
    ) {
        let mut fx = fixture(rows.clone());
        let mut bucket_range = None;
        let mut label_set = None;

        for op in &ops {
            apply(&mut fx, op, &mut bucket_range, &mut label_set);
        }
        fx.engine.filter_all(fx.buckets);
        fx.engine.filter_all(fx.labels);

        prop_assert_eq!(fx.engine.group_total(fx.all), rows.len() as u64);
        prop_assert_eq!(
            fx.engine.group_results(fx.amount_by_label),
            expected_label_sums(&rows, None, &None)
        );
    }

    /// Filters on different dimensions commute.
    #[test]
    fn prop_filters_on_different_dimensions_commute(
        rows in prop::collection::vec(row_strategy(), 1..32),
        range in (0..10_i64, 0..10_i64),
        labels in prop::collection::vec(0..LABELS.len(), 0..=LABELS.len()),
    ) {
        let ops = [
            Op::BucketRange(range.0, range.1),
            Op::LabelAmong(labels),
        ];

        let mut ab = fixture(rows.clone());
        let mut ba = fixture(rows);
        let (mut r1, mut s1) = (None, None);
        let (mut r2, mut s2) = (None, None);

        apply(&mut ab, &ops[0], &mut r1, &mut s1);
        apply(&mut ab, &ops[1], &mut r1, &mut s1);
        apply(&mut ba, &ops[1], &mut r2, &mut s2);
        apply(&mut ba, &ops[0], &mut r2, &mut s2);

        prop_assert_eq!(ab.engine.selected_indices(), ba.engine.selected_indices());
        prop_assert_eq!(
            ab.engine.group_results(ab.amount_by_label),
            ba.engine.group_results(ba.amount_by_label)
        );
        prop_assert_eq!(
            ab.engine.group_results(ab.count_by_bucket),
            ba.engine.group_results(ba.count_by_bucket)
        );
    }

    /// Applying a filter twice in a row is indistinguishable from once.
    #[test]
    fn prop_filter_application_is_idempotent(
        rows in prop::collection::vec(row_strategy(), 1..32),
        range in (0..10_i64, 0..10_i64),
    ) {
        let mut once = fixture(rows.clone());
        let mut twice = fixture(rows);

        once.engine.filter_range(once.buckets, range.0, range.1).unwrap();
        twice.engine.filter_range(twice.buckets, range.0, range.1).unwrap();
        twice.engine.filter_range(twice.buckets, range.0, range.1).unwrap();

        prop_assert_eq!(once.engine.selected_indices(), twice.engine.selected_indices());
        prop_assert_eq!(
            once.engine.group_results(once.count_by_bucket),
            twice.engine.group_results(twice.count_by_bucket)
        );
    }
}
