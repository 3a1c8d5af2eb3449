//! The incentive dashboard: one engine instance wired with the dimensions
//! and groups the charts read.
//!
//! Charts are stateless consumers: they read the typed query results here,
//! and route user interaction back through the filter methods. All chart
//! state that matters lives in the engine.

use chrono::{Datelike, Month, NaiveDate, Weekday};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::dimension::Key;
use crate::engine::{DimensionHandle, Engine, FilterError, GroupHandle};
use crate::group::{Count, FnReducer, SumBy};

use super::model::{Gender, IncentiveKind, IncentiveRecord, Quarter};
use super::types::{
    CategoryCount, DailyEarnings, DailyEarningsRow, DailyVolume, DataCount, FluctuationBucket,
    GenderCount, MonthlyPerformance, Performance, QuarterVolume, WeekdayCount,
};

/// Month names in calendar order, used as chart labels.
const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Short weekday names, Sunday first, matching the weekday dimension's
/// 0-based key.
const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// An [`Engine`] over incentive records, wired with the dashboard's
/// dimensions and groups.
pub struct IncentiveDashboard {
    engine: Engine<IncentiveRecord>,

    months_dim: DimensionHandle,
    dates_dim: DimensionHandle,
    weekdays_dim: DimensionHandle,
    quarters_dim: DimensionHandle,
    genders_dim: DimensionHandle,
    categories_dim: DimensionHandle,
    fluctuation_dim: DimensionHandle,

    monthly_group: GroupHandle<Performance>,
    daily_volume_group: GroupHandle<Decimal>,
    daily_earnings_group: GroupHandle<DailyEarnings>,
    category_group: GroupHandle<u64>,
    gender_group: GroupHandle<u64>,
    weekday_group: GroupHandle<u64>,
    quarter_group: GroupHandle<Decimal>,
    fluctuation_group: GroupHandle<u64>,
    all_group: GroupHandle<u64>,
}

impl IncentiveDashboard {
    /// Builds the dashboard over a materialized record set: seven
    /// dimensions, eight groups, everything initially unfiltered.
    #[must_use]
    pub fn new(records: Vec<IncentiveRecord>) -> Self {
        let mut engine = Engine::from_records(records);

        let months_dim =
            engine.add_dimension("month", |r: &IncentiveRecord| Key::Int(i64::from(r.date.month())));
        let dates_dim = engine.add_dimension("date", |r: &IncentiveRecord| Key::Date(r.date));
        let weekdays_dim = engine.add_dimension("weekday", |r: &IncentiveRecord| {
            Key::Int(i64::from(r.date.weekday().num_days_from_sunday()))
        });
        let quarters_dim = engine.add_dimension("quarter", |r: &IncentiveRecord| {
            Key::from(Quarter::from_month(r.date.month()).as_str())
        });
        let genders_dim =
            engine.add_dimension("gender", |r: &IncentiveRecord| Key::from(r.gender.as_str()));
        let categories_dim = engine
            .add_dimension("incentive", |r: &IncentiveRecord| Key::from(r.incentive.as_str()));
        let fluctuation_dim = engine
            .add_dimension("fluctuation", |r: &IncentiveRecord| Key::Int(fluctuation_bucket(r)));

        let monthly_group = engine.add_group(
            months_dim,
            Key::clone,
            FnReducer::new(
                Performance::default,
                |acc: &mut Performance, r: &IncentiveRecord| acc.absorb(r.amount, r.amount_possible),
                |acc: &mut Performance, r: &IncentiveRecord| acc.release(r.amount, r.amount_possible),
            ),
        );
        let daily_volume_group =
            engine.add_group(dates_dim, Key::clone, SumBy::new(|r: &IncentiveRecord| r.amount));
        let daily_earnings_group = engine.add_group(
            dates_dim,
            Key::clone,
            FnReducer::new(
                DailyEarnings::default,
                |acc: &mut DailyEarnings, r: &IncentiveRecord| acc.absorb(r.incentive, r.amount),
                |acc: &mut DailyEarnings, r: &IncentiveRecord| acc.release(r.incentive, r.amount),
            ),
        );
        let category_group = engine.add_group(categories_dim, Key::clone, Count);
        let gender_group = engine.add_group(genders_dim, Key::clone, Count);
        let weekday_group = engine.add_group(weekdays_dim, Key::clone, Count);
        let quarter_group =
            engine.add_group(quarters_dim, Key::clone, SumBy::new(|r: &IncentiveRecord| r.amount));
        let fluctuation_group = engine.add_group(fluctuation_dim, Key::clone, Count);
        let all_group = engine.add_group_all(Count);

        Self {
            engine,
            months_dim,
            dates_dim,
            weekdays_dim,
            quarters_dim,
            genders_dim,
            categories_dim,
            fluctuation_dim,
            monthly_group,
            daily_volume_group,
            daily_earnings_group,
            category_group,
            gender_group,
            weekday_group,
            quarter_group,
            fluctuation_group,
            all_group,
        }
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    /// Keeps only records in the given months.
    pub fn filter_months(
        &mut self,
        months: impl IntoIterator<Item = Month>,
    ) -> Result<(), FilterError> {
        let keys = months
            .into_iter()
            .map(|m| Key::Int(i64::from(m.number_from_month())));
        self.engine.filter_among(self.months_dim, keys)
    }

    /// Keeps only records dated within `[lo, hi]`.
    pub fn filter_date_range(&mut self, lo: NaiveDate, hi: NaiveDate) -> Result<(), FilterError> {
        self.engine.filter_range(self.dates_dim, lo, hi)
    }

    /// Keeps only records on the given weekdays.
    pub fn filter_weekdays(
        &mut self,
        weekdays: impl IntoIterator<Item = Weekday>,
    ) -> Result<(), FilterError> {
        let keys = weekdays
            .into_iter()
            .map(|d| Key::Int(i64::from(d.num_days_from_sunday())));
        self.engine.filter_among(self.weekdays_dim, keys)
    }

    /// Keeps only records in the given quarters.
    pub fn filter_quarters(
        &mut self,
        quarters: impl IntoIterator<Item = Quarter>,
    ) -> Result<(), FilterError> {
        let keys = quarters.into_iter().map(|q| Key::from(q.as_str()));
        self.engine.filter_among(self.quarters_dim, keys)
    }

    /// Keeps only records for the given genders.
    pub fn filter_genders(
        &mut self,
        genders: impl IntoIterator<Item = Gender>,
    ) -> Result<(), FilterError> {
        let keys = genders.into_iter().map(|g| Key::from(g.as_str()));
        self.engine.filter_among(self.genders_dim, keys)
    }

    /// Keeps only records for the given incentive programmes.
    pub fn filter_categories(
        &mut self,
        categories: impl IntoIterator<Item = IncentiveKind>,
    ) -> Result<(), FilterError> {
        let keys = categories.into_iter().map(|c| Key::from(c.as_str()));
        self.engine.filter_among(self.categories_dim, keys)
    }

    /// Keeps only records whose fluctuation bucket lies in `[lo, hi]` — the
    /// histogram's brush selection.
    pub fn filter_fluctuation_range(&mut self, lo: i64, hi: i64) -> Result<(), FilterError> {
        self.engine.filter_range(self.fluctuation_dim, lo, hi)
    }

    /// Resets every dimension to the identity filter.
    pub fn clear_all_filters(&mut self) {
        for dim in [
            self.months_dim,
            self.dates_dim,
            self.weekdays_dim,
            self.quarters_dim,
            self.genders_dim,
            self.categories_dim,
            self.fluctuation_dim,
        ] {
            self.engine.filter_all(dim);
        }
    }

    // ------------------------------------------------------------------
    // Query results
    // ------------------------------------------------------------------

    /// Monthly performance in calendar order, the bubble chart's input.
    #[must_use]
    pub fn monthly_performance(&self) -> Vec<MonthlyPerformance> {
        self.engine
            .group_results(self.monthly_group)
            .into_iter()
            .filter_map(|(key, perf)| {
                let Key::Int(month) = key else { return None };
                let name = usize::try_from(month)
                    .ok()
                    .and_then(|m| m.checked_sub(1))
                    .and_then(|m| MONTH_NAMES.get(m))?;
                Some(MonthlyPerformance {
                    month: (*name).to_string(),
                    count: perf.count,
                    amount: perf.amount,
                    amount_possible: perf.amount_possible,
                    claimed_percent: perf.claimed_percent(),
                })
            })
            .collect()
    }

    /// Per-day earnings volume in date order, the range chart's input.
    #[must_use]
    pub fn daily_volumes(&self) -> Vec<DailyVolume> {
        self.engine
            .group_results(self.daily_volume_group)
            .into_iter()
            .filter_map(|(key, amount)| {
                let Key::Date(date) = key else { return None };
                Some(DailyVolume { date, amount })
            })
            .collect()
    }

    /// Per-day, per-programme earnings in date order, the stacked area
    /// chart's input.
    #[must_use]
    pub fn daily_earnings(&self) -> Vec<DailyEarningsRow> {
        self.engine
            .group_results(self.daily_earnings_group)
            .into_iter()
            .filter_map(|(key, earnings)| {
                let Key::Date(date) = key else { return None };
                Some(DailyEarningsRow { date, earnings })
            })
            .collect()
    }

    /// Record counts per incentive programme with their share of the
    /// selection, a pie chart's input.
    #[must_use]
    pub fn category_counts(&self) -> Vec<CategoryCount> {
        self.engine
            .group_results(self.category_group)
            .into_iter()
            .filter_map(|(key, count)| {
                let Key::Text(label) = key else { return None };
                let incentive = label.parse::<IncentiveKind>().ok()?;
                Some(CategoryCount {
                    incentive,
                    count,
                    share_percent: self.share_of(count),
                })
            })
            .collect()
    }

    /// Record counts per gender with their share of the selection, a pie
    /// chart's input.
    #[must_use]
    pub fn gender_counts(&self) -> Vec<GenderCount> {
        self.engine
            .group_results(self.gender_group)
            .into_iter()
            .filter_map(|(key, count)| {
                let Key::Text(label) = key else { return None };
                let gender = label.parse::<Gender>().ok()?;
                Some(GenderCount {
                    gender,
                    count,
                    share_percent: self.share_of(count),
                })
            })
            .collect()
    }

    /// Record counts per weekday, Sunday first, the row chart's input.
    #[must_use]
    pub fn weekday_counts(&self) -> Vec<WeekdayCount> {
        self.engine
            .group_results(self.weekday_group)
            .into_iter()
            .filter_map(|(key, count)| {
                let Key::Int(day) = key else { return None };
                let name = usize::try_from(day).ok().and_then(|d| WEEKDAY_NAMES.get(d))?;
                Some(WeekdayCount {
                    weekday: (*name).to_string(),
                    count,
                })
            })
            .collect()
    }

    /// Earnings volume per quarter in calendar order, the donut chart's
    /// input.
    #[must_use]
    pub fn quarter_volumes(&self) -> Vec<QuarterVolume> {
        self.engine
            .group_results(self.quarter_group)
            .into_iter()
            .filter_map(|(key, amount)| {
                let Key::Text(label) = key else { return None };
                let quarter = Quarter::from_label(&label)?;
                Some(QuarterVolume { quarter, amount })
            })
            .collect()
    }

    /// The earnings-fluctuation histogram in ascending bucket order.
    #[must_use]
    pub fn fluctuation_histogram(&self) -> Vec<FluctuationBucket> {
        self.engine
            .group_results(self.fluctuation_group)
            .into_iter()
            .filter_map(|(key, count)| {
                let Key::Int(percent) = key else { return None };
                Some(FluctuationBucket { percent, count })
            })
            .collect()
    }

    /// "N of M records selected", the data-count widget's input.
    #[must_use]
    pub fn data_count(&self) -> DataCount {
        DataCount {
            selected: self.engine.selected_count(),
            total: self.engine.record_count(),
        }
    }

    /// The first `k` selected records in ascending date order, ties by load
    /// order — the data table's rows.
    #[must_use]
    pub fn table_rows(&self, k: usize) -> Vec<&IncentiveRecord> {
        self.engine.bottom(self.dates_dim, k)
    }

    /// The underlying engine, for ad-hoc dimensions or direct queries.
    #[must_use]
    pub fn engine(&self) -> &Engine<IncentiveRecord> {
        &self.engine
    }

    /// Mutable access to the underlying engine, for ad-hoc filters beyond
    /// the typed helpers.
    pub fn engine_mut(&mut self) -> &mut Engine<IncentiveRecord> {
        &mut self.engine
    }

    /// Share of the current selection, floored to whole percent like the
    /// pie labels render it; zero when nothing is selected.
    ///
    /// The denominator comes from the whole-set group, the same aggregate
    /// the data-count widget watches.
    fn share_of(&self, count: u64) -> Decimal {
        let selected = self.engine.group_total(self.all_group);
        if selected == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(count) / Decimal::from(selected) * Decimal::ONE_HUNDRED).floor()
        }
    }
}

/// Histogram bucket for a record: the rounded percentage left unclaimed
/// relative to what was earned. Records with nothing earned land in bucket
/// zero rather than dividing by zero.
fn fluctuation_bucket(record: &IncentiveRecord) -> i64 {
    if record.amount.is_zero() {
        return 0;
    }
    let percent =
        (record.amount_possible - record.amount) / record.amount * Decimal::ONE_HUNDRED;
    percent.round().to_i64().unwrap_or(i64::MAX)
}
