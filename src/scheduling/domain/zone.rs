//! Resolved time zones and wall-clock conversion.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;

/// A time zone that has been resolved from an IANA identifier.
///
/// Unresolvable identifiers collapse to [`ZoneSpec::Utc`], which makes every
/// conversion the identity on UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneSpec {
    /// A named IANA zone.
    Named(Tz),
    /// Coordinated Universal Time.
    Utc,
}

impl ZoneSpec {
    /// Parses an IANA identifier, returning `None` when it is unknown.
    #[must_use]
    pub fn parse(identifier: &str) -> Option<Self> {
        let trimmed = identifier.trim();
        if trimmed.eq_ignore_ascii_case("utc") {
            return Some(Self::Utc);
        }
        trimmed.parse::<Tz>().ok().map(Self::Named)
    }

    /// Returns the IANA identifier of the zone.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Named(tz) => tz.name(),
            Self::Utc => "UTC",
        }
    }

    /// Expresses a UTC instant as local time carrying its offset.
    #[must_use]
    pub fn to_local(self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Self::Named(tz) => instant.with_timezone(&tz).fixed_offset(),
            Self::Utc => instant.fixed_offset(),
        }
    }

    /// Returns the local calendar date of a UTC instant.
    #[must_use]
    pub fn local_date(self, instant: DateTime<Utc>) -> NaiveDate {
        self.to_local(instant).date_naive()
    }

    /// Converts a local wall-clock reading to a UTC instant.
    ///
    /// Ambiguous readings (clocks falling back) resolve to the earlier
    /// instant. Readings inside a gap (clocks springing forward) are moved
    /// forward by one hour. A reading with no representable local instant
    /// is taken as UTC.
    #[must_use]
    pub fn wall_clock_to_utc(self, wall_clock: NaiveDateTime) -> DateTime<Utc> {
        let Self::Named(tz) = self else {
            return Utc.from_utc_datetime(&wall_clock);
        };
        tz.from_local_datetime(&wall_clock)
            .earliest()
            .or_else(|| {
                wall_clock
                    .checked_add_signed(TimeDelta::hours(1))
                    .and_then(|shifted| tz.from_local_datetime(&shifted).earliest())
            })
            .map_or_else(
                || Utc.from_utc_datetime(&wall_clock),
                |local| local.with_timezone(&Utc),
            )
    }

    /// Returns the UTC instant for `time` on the local `date`.
    #[must_use]
    pub fn at(self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        self.wall_clock_to_utc(date.and_time(time))
    }
}

impl fmt::Display for ZoneSpec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}
