//! Rule for annual observances of full-day significance.

use super::{WindowingContext, WindowingRule};
use crate::scheduling::domain::ObservancePeriod;
use chrono::{DateTime, Utc};

/// Moves sends to another day at the same local time.
///
/// Alternatives are the next day, the day after, then the preceding day.
/// The preceding day is dropped later when it falls before the earliest
/// allowed send time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FullDayRule;

impl FullDayRule {
    const DAY_OFFSETS: [i64; 3] = [1, 2, -1];
}

impl WindowingRule for FullDayRule {
    fn alternatives(&self, context: &WindowingContext<'_>) -> Vec<DateTime<Utc>> {
        Self::DAY_OFFSETS
            .iter()
            .filter_map(|offset| context.same_time_on_day(*offset))
            .collect()
    }

    fn reason(&self, period: &ObservancePeriod) -> String {
        format!(
            "{} is a day of full significance for the {} community",
            period.name(),
            period.community(),
        )
    }

    fn guidance(&self, period: &ObservancePeriod) -> String {
        format!(
            "Avoid outreach on {}; the day after is usually well received.",
            period.name()
        )
    }
}
