//! In-memory observance calendar.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

use crate::scheduling::{
    domain::{CommunityId, ObservancePeriod},
    ports::{CalendarError, CalendarResult, ObservanceCalendar},
};

/// Thread-safe calendar backed by a list of periods.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObservanceCalendar {
    periods: Arc<RwLock<Vec<ObservancePeriod>>>,
}

impl InMemoryObservanceCalendar {
    /// Creates an empty calendar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a calendar seeded with `periods`.
    #[must_use]
    pub fn with_periods(periods: impl IntoIterator<Item = ObservancePeriod>) -> Self {
        Self {
            periods: Arc::new(RwLock::new(periods.into_iter().collect())),
        }
    }

    /// Adds a period.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Unavailable`] when the lock is poisoned.
    pub fn insert(&self, period: ObservancePeriod) -> CalendarResult<()> {
        let mut periods = self.periods.write().map_err(|err| {
            CalendarError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        periods.push(period);
        Ok(())
    }
}

#[async_trait]
impl ObservanceCalendar for InMemoryObservanceCalendar {
    async fn query(
        &self,
        communities: &[CommunityId],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CalendarResult<Vec<ObservancePeriod>> {
        if to < from {
            return Err(CalendarError::InvalidWindow { from, to });
        }
        let periods = self.periods.read().map_err(|err| {
            CalendarError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        let mut matching: Vec<ObservancePeriod> = periods
            .iter()
            .filter(|period| communities.contains(period.community()))
            .filter(|period| period.overlaps(from, to))
            .cloned()
            .collect();
        matching.sort_by_key(ObservancePeriod::start);
        Ok(matching)
    }
}
