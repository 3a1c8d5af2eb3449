//! Incentive-tracking analytics built on the engine.

pub mod dashboard;
pub mod model;
pub mod types;


pub use dashboard::IncentiveDashboard;
pub use model::{
    Gender, IncentiveKind, IncentiveRecord, Quarter, UnknownGender, UnknownIncentive,
};
pub use types::{
    CategoryCount, DailyEarnings, DailyEarningsRow, DailyVolume, DataCount, FluctuationBucket,
    GenderCount, MonthlyPerformance, Performance, QuarterVolume, WeekdayCount,
};
