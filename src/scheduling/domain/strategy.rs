//! Resolution strategies recommended for detected conflicts.

use super::ParseResolutionStrategyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What should happen to a send that collides with an observance.
///
/// Variants are ordered from least to most restrictive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Send as requested.
    #[default]
    NoAction,
    /// Any of the alternatives is acceptable.
    FlexibleRescheduling,
    /// Moving the send is advised.
    RescheduleRecommended,
    /// The send must move.
    MustReschedule,
    /// A human must pick the time.
    ManualResolutionRequired,
}

impl ResolutionStrategy {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoAction => "no_action",
            Self::FlexibleRescheduling => "flexible_rescheduling",
            Self::RescheduleRecommended => "reschedule_recommended",
            Self::MustReschedule => "must_reschedule",
            Self::ManualResolutionRequired => "manual_resolution_required",
        }
    }

    /// Returns whether the strategy requires a human decision.
    #[must_use]
    pub const fn is_manual(self) -> bool {
        matches!(self, Self::ManualResolutionRequired)
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ResolutionStrategy {
    type Error = ParseResolutionStrategyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "no_action" => Ok(Self::NoAction),
            "flexible_rescheduling" => Ok(Self::FlexibleRescheduling),
            "reschedule_recommended" => Ok(Self::RescheduleRecommended),
            "must_reschedule" => Ok(Self::MustReschedule),
            "manual_resolution_required" => Ok(Self::ManualResolutionRequired),
            _ => Err(ParseResolutionStrategyError(value.to_owned())),
        }
    }
}
