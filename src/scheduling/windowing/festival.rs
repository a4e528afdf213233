//! Rule for festivals celebrated in the evening.

use super::{WindowingContext, WindowingRule, on_the_hour};
use crate::scheduling::domain::ObservancePeriod;
use chrono::{DateTime, NaiveTime, Utc};

/// Moves sends away from festival evenings.
///
/// Alternatives are the next two days at the requested hour, then the
/// festival morning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FestivalEveningRule {
    morning_slot: NaiveTime,
}

impl FestivalEveningRule {
    /// Creates the rule with a 10:00 festival-morning slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            morning_slot: on_the_hour(10),
        }
    }
}

impl Default for FestivalEveningRule {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowingRule for FestivalEveningRule {
    fn alternatives(&self, context: &WindowingContext<'_>) -> Vec<DateTime<Utc>> {
        [
            context.same_time_on_day(1),
            context.same_time_on_day(2),
            context.on_day(0, self.morning_slot),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn reason(&self, period: &ObservancePeriod) -> String {
        format!(
            "{} celebrations fill the evening for the {} community",
            period.name(),
            period.community(),
        )
    }

    fn guidance(&self, _period: &ObservancePeriod) -> String {
        "Send on the festival morning or after the celebrations.".to_owned()
    }
}
