//! Ordered severity scale for observance periods.

use super::ParseSeverityError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How strongly an observance restricts outreach.
///
/// Variants are declared in ascending order so that comparisons follow
/// `None < Low < Medium < High < Highest`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The period carries no restriction.
    #[default]
    None,
    /// Messaging is discouraged but harmless.
    Low,
    /// Messaging should move when a nearby slot exists.
    Medium,
    /// Messaging during the period is likely to offend.
    High,
    /// Messaging during the period must not happen.
    Highest,
}

impl Severity {
    /// Every severity, lowest first.
    pub const ALL: [Self; 5] = [
        Self::None,
        Self::Low,
        Self::Medium,
        Self::High,
        Self::Highest,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Highest => "highest",
        }
    }

    /// Returns the 0-100 sensitivity score reported alongside decisions.
    #[must_use]
    pub const fn sensitivity_score(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Low => 25,
            Self::Medium => 50,
            Self::High => 75,
            Self::Highest => 100,
        }
    }

    /// Returns whether the severity restricts anything at all.
    #[must_use]
    pub const fn is_restrictive(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Severity {
    type Error = ParseSeverityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "none" => Ok(Self::None),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "highest" => Ok(Self::Highest),
            _ => Err(ParseSeverityError(value.to_owned())),
        }
    }
}
