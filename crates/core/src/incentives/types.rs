//! Incentive dashboard accumulators and query result types.
//!
//! Accumulators hold running sums only. Ratio fields (claimed percentage,
//! share of selection) are recomputed from the sums at read time — an
//! incrementally-tracked average drifts under add/remove and is deliberately
//! not representable here.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::model::{Gender, IncentiveKind, Quarter};

/// Running performance sums for one group key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performance {
    /// Number of selected records.
    pub count: u64,
    /// Sum of earned amounts.
    pub amount: Decimal,
    /// Sum of claimable amounts.
    pub amount_possible: Decimal,
}

impl Performance {
    /// Folds a record into the running sums.
    pub fn absorb(&mut self, amount: Decimal, amount_possible: Decimal) {
        self.count += 1;
        self.amount += amount;
        self.amount_possible += amount_possible;
    }

    /// Undoes [`Performance::absorb`] for a record leaving the selection.
    ///
    /// # Panics
    ///
    /// Panics on count underflow, which means add/remove bookkeeping broke.
    pub fn release(&mut self, amount: Decimal, amount_possible: Decimal) {
        assert!(self.count > 0, "performance underflow: release without a matching absorb");
        self.count -= 1;
        self.amount -= amount;
        self.amount_possible -= amount_possible;
    }

    /// Percentage of the claimable amount actually earned, recomputed from
    /// the running sums; zero when nothing was claimable.
    #[must_use]
    pub fn claimed_percent(&self) -> Decimal {
        if self.amount_possible.is_zero() {
            Decimal::ZERO
        } else {
            (self.amount / self.amount_possible * Decimal::ONE_HUNDRED).round_dp(2)
        }
    }
}

/// Running per-programme earnings for one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEarnings {
    /// Number of selected records on the day.
    pub records: u64,
    /// Step-tracking earnings.
    pub steps: Decimal,
    /// Sleep-tracking earnings.
    pub sleep: Decimal,
    /// Food-tracking earnings.
    pub food: Decimal,
}

impl DailyEarnings {
    /// Folds a record's amount into its programme's running total.
    pub fn absorb(&mut self, incentive: IncentiveKind, amount: Decimal) {
        self.records += 1;
        *self.total_mut(incentive) += amount;
    }

    /// Undoes [`DailyEarnings::absorb`] for a record leaving the selection.
    ///
    /// # Panics
    ///
    /// Panics on record-count underflow.
    pub fn release(&mut self, incentive: IncentiveKind, amount: Decimal) {
        assert!(self.records > 0, "daily earnings underflow: release without a matching absorb");
        self.records -= 1;
        *self.total_mut(incentive) -= amount;
    }

    /// Combined earnings across all programmes.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.steps + self.sleep + self.food
    }

    fn total_mut(&mut self, incentive: IncentiveKind) -> &mut Decimal {
        match incentive {
            IncentiveKind::Steps => &mut self.steps,
            IncentiveKind::Sleep => &mut self.sleep,
            IncentiveKind::Food => &mut self.food,
        }
    }
}

/// Monthly performance, the bubble chart's input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPerformance {
    /// Month name, January through December.
    pub month: String,
    /// Number of selected records in the month.
    pub count: u64,
    /// Sum of earned amounts.
    pub amount: Decimal,
    /// Sum of claimable amounts.
    pub amount_possible: Decimal,
    /// Earned share of claimable, derived at read time.
    pub claimed_percent: Decimal,
}

/// Earnings volume for one day, the range chart's input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyVolume {
    /// Day.
    pub date: NaiveDate,
    /// Sum of earned amounts on the day.
    pub amount: Decimal,
}

/// Per-programme earnings for one day, the stacked area chart's input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEarningsRow {
    /// Day.
    pub date: NaiveDate,
    /// Per-programme running totals for the day.
    pub earnings: DailyEarnings,
}

/// Record count for one incentive programme, a pie chart's input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// Programme.
    pub incentive: IncentiveKind,
    /// Number of selected records.
    pub count: u64,
    /// Share of the overall selection, derived at read time.
    pub share_percent: Decimal,
}

/// Record count for one gender, a pie chart's input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderCount {
    /// Gender.
    pub gender: Gender,
    /// Number of selected records.
    pub count: u64,
    /// Share of the overall selection, derived at read time.
    pub share_percent: Decimal,
}

/// Record count for one weekday, the row chart's input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayCount {
    /// Short weekday name, `"Sun"` through `"Sat"`.
    pub weekday: String,
    /// Number of selected records.
    pub count: u64,
}

/// Earnings volume for one quarter, the donut chart's input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterVolume {
    /// Quarter.
    pub quarter: Quarter,
    /// Sum of earned amounts.
    pub amount: Decimal,
}

/// One bin of the earnings-fluctuation histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluctuationBucket {
    /// Rounded percentage left unclaimed relative to the earned amount.
    pub percent: i64,
    /// Number of selected records in the bin.
    pub count: u64,
}

/// "N of M records selected", the data-count widget's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataCount {
    /// Records passing every active filter.
    pub selected: usize,
    /// Records in the store.
    pub total: usize,
}
