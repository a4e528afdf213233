//! Outcome of checking a proposed send against observance periods.

use super::{CommunityId, ObservancePeriod, ObservanceType, ResolutionStrategy, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of conflict detection.
///
/// When `has_conflict` is set, `alternatives` is never empty; it may however
/// contain only times that still collide, in which case `strategy` is
/// [`ResolutionStrategy::ManualResolutionRequired`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictResult {
    /// Whether the proposed send overlaps a flagged observance.
    pub has_conflict: bool,
    /// Human-readable reason for the conflict.
    pub reason: String,
    /// Type of the primary conflicting observance.
    pub conflicting_type: Option<ObservanceType>,
    /// Name of the primary conflicting observance.
    pub conflicting_observance: Option<String>,
    /// Community observing the primary conflict.
    pub community: Option<CommunityId>,
    /// Highest severity among the overlapping observances.
    pub severity: Severity,
    /// Candidate send times, best first.
    pub alternatives: Vec<DateTime<Utc>>,
    /// Recommended resolution.
    pub strategy: ResolutionStrategy,
    /// Guidance for the person scheduling the send.
    pub guidance: String,
}

impl ConflictResult {
    /// Returns the result for a send that collides with nothing.
    #[must_use]
    pub fn clear() -> Self {
        Self {
            has_conflict: false,
            reason: String::new(),
            conflicting_type: None,
            conflicting_observance: None,
            community: None,
            severity: Severity::None,
            alternatives: Vec::new(),
            strategy: ResolutionStrategy::NoAction,
            guidance: String::new(),
        }
    }

    /// Returns a conflict against `primary` with the supplied alternatives.
    #[must_use]
    pub fn against(
        primary: &ObservancePeriod,
        alternatives: Vec<DateTime<Utc>>,
        strategy: ResolutionStrategy,
    ) -> Self {
        Self {
            has_conflict: true,
            reason: String::new(),
            conflicting_type: Some(primary.observance_type().clone()),
            conflicting_observance: Some(primary.name().to_owned()),
            community: Some(primary.community().clone()),
            severity: primary.severity(),
            alternatives,
            strategy,
            guidance: String::new(),
        }
    }

    /// Replaces the reason and guidance text.
    #[must_use]
    pub fn with_text(mut self, reason: impl Into<String>, guidance: impl Into<String>) -> Self {
        self.reason = reason.into();
        self.guidance = guidance.into();
        self
    }

    /// Returns the best alternative, if any.
    #[must_use]
    pub fn first_alternative(&self) -> Option<DateTime<Utc>> {
        self.alternatives.first().copied()
    }

    /// Returns the 0-100 sensitivity score of the conflict.
    #[must_use]
    pub const fn sensitivity_score(&self) -> u8 {
        self.severity.sensitivity_score()
    }
}

impl Default for ConflictResult {
    fn default() -> Self {
        Self::clear()
    }
}
