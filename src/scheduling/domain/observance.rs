//! Observance communities, types, and calendar periods.

use super::{ScopeDescriptor, SchedulingDomainError, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_')
}

/// Identifier of a diaspora community whose calendar is consulted, such as
/// `sri-lankan-buddhist` or `tamil-hindu`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommunityId(String);

impl CommunityId {
    /// Creates a validated community identifier.
    ///
    /// Input is trimmed and lowercased before validation.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingDomainError::InvalidCommunity`] when the value is
    /// empty or contains characters other than ASCII letters, digits, `-`
    /// and `_`.
    pub fn new(value: impl Into<String>) -> Result<Self, SchedulingDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();
        if !is_slug(&normalized) {
            return Err(SchedulingDomainError::InvalidCommunity(raw));
        }
        Ok(Self(normalized))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CommunityId {
    type Error = SchedulingDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CommunityId> for String {
    fn from(value: CommunityId) -> Self {
        value.0
    }
}

impl fmt::Display for CommunityId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Kind of observance, used to select a windowing rule.
///
/// The well-known kinds are exposed as associated constants. Any other slug
/// is accepted so new kinds can be introduced by registering a windowing
/// rule for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObservanceType(Cow<'static, str>);

impl ObservanceType {
    /// Monthly recurring observance whose mornings are reserved for
    /// contemplation (for example a full-moon poya day).
    pub const MONTHLY_RECURRING: Self = Self(Cow::Borrowed("monthly_recurring"));
    /// Annual observance of full-day significance.
    pub const ANNUAL: Self = Self(Cow::Borrowed("annual"));
    /// Observance on a lunar-reckoned date whose evenings are devotional.
    pub const VARIABLE_DATE: Self = Self(Cow::Borrowed("variable_date"));
    /// Festival with evening celebrations.
    pub const FESTIVAL: Self = Self(Cow::Borrowed("festival"));
    /// Observance with no specific windowing rule.
    pub const GENERAL: Self = Self(Cow::Borrowed("general"));

    /// Creates an observance type from a slug.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingDomainError::InvalidObservanceType`] when the
    /// normalized value is not a slug.
    pub fn new(value: impl Into<String>) -> Result<Self, SchedulingDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
        if !is_slug(&normalized) {
            return Err(SchedulingDomainError::InvalidObservanceType(raw));
        }
        Ok(Self(Cow::Owned(normalized)))
    }

    /// Returns the type key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObservanceType {
    type Error = SchedulingDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ObservanceType> for String {
    fn from(value: ObservanceType) -> Self {
        value.0.into_owned()
    }
}

impl fmt::Display for ObservanceType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// A half-open interval `[start, end)` during which a community observes
/// something that restricts outreach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservancePeriod {
    name: String,
    community: CommunityId,
    observance_type: ObservanceType,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    severity: Severity,
    #[serde(default)]
    scope: ScopeDescriptor,
}

impl ObservancePeriod {
    /// Creates a globally scoped observance period.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingDomainError::EmptyObservanceName`] when the name is
    /// blank, or [`SchedulingDomainError::InvalidObservanceWindow`] when
    /// `end` is not after `start`.
    pub fn new(
        name: impl Into<String>,
        community: CommunityId,
        observance_type: ObservanceType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        severity: Severity,
    ) -> Result<Self, SchedulingDomainError> {
        let raw_name = name.into();
        let trimmed = raw_name.trim();
        if trimmed.is_empty() {
            return Err(SchedulingDomainError::EmptyObservanceName);
        }
        if end <= start {
            return Err(SchedulingDomainError::InvalidObservanceWindow { start, end });
        }
        Ok(Self {
            name: trimmed.to_owned(),
            community,
            observance_type,
            start,
            end,
            severity,
            scope: ScopeDescriptor::global(),
        })
    }

    /// Restricts the period to the given geographic scope.
    #[must_use]
    pub fn with_scope(mut self, scope: ScopeDescriptor) -> Self {
        self.scope = scope;
        self
    }

    /// Returns the observance name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the observing community.
    #[must_use]
    pub const fn community(&self) -> &CommunityId {
        &self.community
    }

    /// Returns the observance type.
    #[must_use]
    pub const fn observance_type(&self) -> &ObservanceType {
        &self.observance_type
    }

    /// Returns the inclusive start instant.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the exclusive end instant.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns the period severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the geographic scope of the period.
    #[must_use]
    pub const fn scope(&self) -> &ScopeDescriptor {
        &self.scope
    }

    /// Returns whether `instant` falls inside `[start, end)`.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Returns whether the interval `[from, to)` intersects this period.
    ///
    /// An empty interval (`from == to`) is treated as the single instant
    /// `from`.
    #[must_use]
    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        if to <= from {
            return self.contains(from);
        }
        self.start < to && from < self.end
    }
}
