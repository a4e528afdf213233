//! Fallback rule for observances without a specific windowing rule.

use super::{WindowingContext, WindowingRule};
use crate::scheduling::domain::ObservancePeriod;
use chrono::{DateTime, TimeDelta, Utc};

/// Proposes fixed offsets from the requested time: two hours later, one day
/// later, two hours earlier, then one day and two hours later.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenericRule;

impl GenericRule {
    const OFFSETS_HOURS: [i64; 4] = [2, 24, -2, 26];
}

impl WindowingRule for GenericRule {
    fn alternatives(&self, context: &WindowingContext<'_>) -> Vec<DateTime<Utc>> {
        Self::OFFSETS_HOURS
            .iter()
            .filter_map(|hours| {
                context
                    .proposed
                    .checked_add_signed(TimeDelta::hours(*hours))
            })
            .collect()
    }

    fn reason(&self, period: &ObservancePeriod) -> String {
        format!(
            "The send overlaps {}, observed by the {} community",
            period.name(),
            period.community(),
        )
    }

    fn guidance(&self, _period: &ObservancePeriod) -> String {
        "Pick a time outside the observance.".to_owned()
    }
}
