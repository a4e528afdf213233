//! Rule for observances whose mornings are reserved for contemplation.

use super::{WindowingContext, WindowingRule, on_the_hour};
use crate::scheduling::domain::ObservancePeriod;
use chrono::{DateTime, NaiveTime, Utc};

/// Moves sends out of the morning contemplation window.
///
/// Alternatives are the same day's afternoon slots, then the following
/// morning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorningContemplationRule {
    window_start: NaiveTime,
    window_end: NaiveTime,
    afternoon_slots: Vec<NaiveTime>,
    next_morning: NaiveTime,
}

impl MorningContemplationRule {
    /// Creates the rule with the 06:00-12:00 window, 14:00 and 16:00
    /// afternoon slots, and a 09:00 next-morning slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            window_start: on_the_hour(6),
            window_end: on_the_hour(12),
            afternoon_slots: vec![on_the_hour(14), on_the_hour(16)],
            next_morning: on_the_hour(9),
        }
    }

    /// Replaces the same-day afternoon slots.
    #[must_use]
    pub fn with_afternoon_slots(mut self, slots: impl IntoIterator<Item = NaiveTime>) -> Self {
        self.afternoon_slots = slots.into_iter().collect();
        self
    }
}

impl Default for MorningContemplationRule {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowingRule for MorningContemplationRule {
    fn alternatives(&self, context: &WindowingContext<'_>) -> Vec<DateTime<Utc>> {
        self.afternoon_slots
            .iter()
            .filter_map(|slot| context.on_day(0, *slot))
            .chain(context.on_day(1, self.next_morning))
            .collect()
    }

    fn reason(&self, period: &ObservancePeriod) -> String {
        format!(
            "{} is observed by the {} community; mornings ({}-{}) are reserved for contemplation",
            period.name(),
            period.community(),
            self.window_start.format("%H:%M"),
            self.window_end.format("%H:%M"),
        )
    }

    fn guidance(&self, _period: &ObservancePeriod) -> String {
        "Send in the afternoon of the same day or on the following morning.".to_owned()
    }
}
