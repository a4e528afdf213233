//! Recipient-side descriptors: location, language, and observance
//! preferences.

use super::{CommunityId, ParseObservanceLevelError, SchedulingDomainError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Free-form geographic description of where a recipient lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// City name, such as `Toronto`.
    #[serde(default)]
    pub city: Option<String>,
    /// State or province.
    #[serde(default)]
    pub state: Option<String>,
    /// Country name.
    #[serde(default)]
    pub country: Option<String>,
    /// Metropolitan region or diaspora cluster, such as `Bay Area`.
    #[serde(default)]
    pub region: Option<String>,
}

impl Location {
    /// Creates a location with only a city set.
    #[must_use]
    pub fn city(city: impl Into<String>) -> Self {
        Self {
            city: Some(city.into()),
            ..Self::default()
        }
    }

    /// Sets the country.
    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Sets the state or province.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Sets the region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

/// Geographic scope of an observance or campaign.
///
/// A global scope applies everywhere. Otherwise the scope applies to a
/// location when any field it sets matches the location's corresponding
/// field, ignoring ASCII case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDescriptor {
    /// Whether the scope covers every location.
    pub global: bool,
    /// Matching fields.
    #[serde(flatten)]
    pub location: Location,
}

impl ScopeDescriptor {
    /// Returns a scope covering every location.
    #[must_use]
    pub fn global() -> Self {
        Self {
            global: true,
            location: Location::default(),
        }
    }

    /// Returns a scope limited to the given location fields.
    #[must_use]
    pub const fn limited_to(location: Location) -> Self {
        Self {
            global: false,
            location,
        }
    }
}

impl Default for ScopeDescriptor {
    fn default() -> Self {
        Self::global()
    }
}

/// How strictly a recipient wants observances to be honoured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservanceLevel {
    /// Flag every restrictive observance.
    Devout,
    /// Flag observances at the configured floor.
    #[default]
    Moderate,
    /// Flag only observances of medium severity or above.
    Relaxed,
}

impl ObservanceLevel {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Devout => "devout",
            Self::Moderate => "moderate",
            Self::Relaxed => "relaxed",
        }
    }
}

impl fmt::Display for ObservanceLevel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ObservanceLevel {
    type Error = ParseObservanceLevelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "devout" => Ok(Self::Devout),
            "moderate" => Ok(Self::Moderate),
            "relaxed" => Ok(Self::Relaxed),
            _ => Err(ParseObservanceLevelError(value.to_owned())),
        }
    }
}

/// Lowercase ISO 639 language code such as `si`, `ta`, or `en`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Creates a validated language code.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingDomainError::InvalidLanguage`] unless the value is
    /// two or three ASCII letters.
    pub fn new(value: impl Into<String>) -> Result<Self, SchedulingDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();
        let valid = (2..=3).contains(&normalized.len())
            && normalized.chars().all(|ch| ch.is_ascii_lowercase());
        if !valid {
            return Err(SchedulingDomainError::InvalidLanguage(raw));
        }
        Ok(Self(normalized))
    }

    /// Returns the code as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = SchedulingDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LanguageCode> for String {
    fn from(value: LanguageCode) -> Self {
        value.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Where a recipient lives, which calendars they follow, and how strictly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiasporaProfile {
    /// Recipient location.
    #[serde(default)]
    pub location: Location,
    /// Explicit IANA zone identifier, when known.
    #[serde(default)]
    pub time_zone: Option<String>,
    /// Communities whose observances apply.
    #[serde(default)]
    pub communities: Vec<CommunityId>,
    /// Observance preference.
    #[serde(default)]
    pub observance_level: ObservanceLevel,
    /// Preferred language for notices.
    #[serde(default)]
    pub language: Option<LanguageCode>,
}

impl DiasporaProfile {
    /// Creates a profile for the given location and communities.
    #[must_use]
    pub fn new(location: Location, communities: impl IntoIterator<Item = CommunityId>) -> Self {
        Self {
            location,
            time_zone: None,
            communities: communities.into_iter().collect(),
            observance_level: ObservanceLevel::default(),
            language: None,
        }
    }

    /// Sets an explicit IANA zone identifier.
    #[must_use]
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    /// Sets the observance preference.
    #[must_use]
    pub const fn with_observance_level(mut self, level: ObservanceLevel) -> Self {
        self.observance_level = level;
        self
    }

    /// Sets the preferred language.
    #[must_use]
    pub fn with_language(mut self, language: LanguageCode) -> Self {
        self.language = Some(language);
        self
    }
}
