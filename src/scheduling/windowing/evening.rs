//! Rule for lunar-dated observances with devotional evenings.

use super::{WindowingContext, WindowingRule, on_the_hour};
use crate::scheduling::domain::ObservancePeriod;
use chrono::{DateTime, NaiveTime, Utc};

/// Moves sends out of the 18:00-22:00 devotional window.
///
/// Alternatives are the same day's morning and early afternoon, then the
/// next day at the requested hour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EveningDevotionRule {
    daytime_slots: Vec<NaiveTime>,
}

impl EveningDevotionRule {
    /// Creates the rule with 10:00 and 14:00 daytime slots.
    #[must_use]
    pub fn new() -> Self {
        Self {
            daytime_slots: vec![on_the_hour(10), on_the_hour(14)],
        }
    }
}

impl Default for EveningDevotionRule {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowingRule for EveningDevotionRule {
    fn alternatives(&self, context: &WindowingContext<'_>) -> Vec<DateTime<Utc>> {
        self.daytime_slots
            .iter()
            .filter_map(|slot| context.on_day(0, *slot))
            .chain(context.same_time_on_day(1))
            .collect()
    }

    fn reason(&self, period: &ObservancePeriod) -> String {
        format!(
            "{} evenings (18:00-22:00) are devotional for the {} community",
            period.name(),
            period.community(),
        )
    }

    fn guidance(&self, _period: &ObservancePeriod) -> String {
        "Send during the day or move the message to the next day.".to_owned()
    }
}
