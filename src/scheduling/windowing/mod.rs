//! Windowing rules that propose alternative send times for each kind of
//! observance.
//!
//! Each [`WindowingRule`] knows the shape of one observance kind (morning
//! contemplation, full-day significance, evening devotion, evening
//! festivities) and proposes candidate times around it. Rules are looked up
//! through a [`WindowingRegistry`] keyed by
//! [`ObservanceType`](crate::scheduling::domain::ObservanceType), so adding a
//! kind means registering a rule.
//!
//! Wall-clock hours are interpreted in the recipient group's zone.

mod evening;
mod festival;
mod full_day;
mod generic;
mod morning;
mod registry;

pub use evening::EveningDevotionRule;
pub use festival::FestivalEveningRule;
pub use full_day::FullDayRule;
pub use generic::GenericRule;
pub use morning::MorningContemplationRule;
pub use registry::WindowingRegistry;

use crate::scheduling::domain::{ObservancePeriod, ZoneSpec};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, Utc};
use std::fmt;

/// Inputs available to a windowing rule.
#[derive(Debug, Clone, Copy)]
pub struct WindowingContext<'a> {
    /// Requested send instant.
    pub proposed: DateTime<Utc>,
    /// Expected duration of the send.
    pub duration: TimeDelta,
    /// Primary conflicting observance.
    pub period: &'a ObservancePeriod,
    /// Zone used to interpret wall-clock hours.
    pub zone: ZoneSpec,
}

impl WindowingContext<'_> {
    /// Returns the local date of the proposed send.
    #[must_use]
    pub fn local_date(&self) -> NaiveDate {
        self.zone.local_date(self.proposed)
    }

    /// Returns the local wall-clock time of the proposed send.
    #[must_use]
    pub fn local_time(&self) -> NaiveTime {
        self.zone.to_local(self.proposed).time()
    }

    /// Returns `time` on the local date `offset_days` after the proposed
    /// date, or `None` when the date is out of range.
    #[must_use]
    pub fn on_day(&self, offset_days: i64, time: NaiveTime) -> Option<DateTime<Utc>> {
        let date = self.local_date();
        let magnitude = Days::new(offset_days.unsigned_abs());
        let shifted = if offset_days >= 0 {
            date.checked_add_days(magnitude)
        } else {
            date.checked_sub_days(magnitude)
        }?;
        Some(self.zone.at(shifted, time))
    }

    /// Returns the proposed wall-clock time shifted by whole local days.
    #[must_use]
    pub fn same_time_on_day(&self, offset_days: i64) -> Option<DateTime<Utc>> {
        self.on_day(offset_days, self.local_time())
    }
}

/// Proposes alternatives and explanatory text for one kind of observance.
pub trait WindowingRule: Send + Sync + fmt::Debug {
    /// Returns candidate send times in preference order.
    ///
    /// Candidates are not yet checked against other observances; the
    /// detector filters and orders them.
    fn alternatives(&self, context: &WindowingContext<'_>) -> Vec<DateTime<Utc>>;

    /// Explains why the period conflicts with outreach.
    fn reason(&self, period: &ObservancePeriod) -> String;

    /// Advises the person scheduling the send.
    fn guidance(&self, period: &ObservancePeriod) -> String;
}

/// Builds a wall-clock time on the hour.
pub(crate) const fn on_the_hour(hour: u32) -> NaiveTime {
    match NaiveTime::from_hms_opt(hour, 0, 0) {
        Some(time) => time,
        None => NaiveTime::MIN,
    }
}
