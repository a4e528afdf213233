//! Mapping from conflict severity to resolution strategy.

use crate::scheduling::domain::{ConflictResult, ResolutionStrategy, Severity};
use serde::{Deserialize, Serialize};

/// Lowest severity that counts as a conflict unless configured otherwise.
pub const DEFAULT_FLAG_FLOOR: Severity = Severity::Low;

/// Highest severity that may be resolved without a human unless configured
/// otherwise.
pub const DEFAULT_AUTO_RESOLVE_CEILING: Severity = Severity::Medium;

/// Severity thresholds governing detection and automatic resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingThresholds {
    /// Periods below this severity are ignored.
    pub flag_floor: Severity,
    /// Conflicts above this severity always need confirmation.
    pub auto_resolve_ceiling: Severity,
}

impl Default for SchedulingThresholds {
    fn default() -> Self {
        Self {
            flag_floor: DEFAULT_FLAG_FLOOR,
            auto_resolve_ceiling: DEFAULT_AUTO_RESOLVE_CEILING,
        }
    }
}

/// Decides how a detected conflict should be handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionPolicy {
    thresholds: SchedulingThresholds,
}

impl ResolutionPolicy {
    /// Creates a policy with the given thresholds.
    #[must_use]
    pub const fn new(thresholds: SchedulingThresholds) -> Self {
        Self { thresholds }
    }

    /// Returns the configured thresholds.
    #[must_use]
    pub const fn thresholds(&self) -> SchedulingThresholds {
        self.thresholds
    }

    /// Maps a severity to its default strategy.
    #[must_use]
    pub const fn resolve(&self, severity: Severity) -> ResolutionStrategy {
        match severity {
            Severity::Highest => ResolutionStrategy::MustReschedule,
            Severity::High => ResolutionStrategy::RescheduleRecommended,
            Severity::Medium | Severity::Low => ResolutionStrategy::FlexibleRescheduling,
            Severity::None => ResolutionStrategy::NoAction,
        }
    }

    /// Maps a severity to a strategy, escalating to manual resolution when
    /// none of the alternatives is clear of observances.
    #[must_use]
    pub const fn strategy_for(
        &self,
        severity: Severity,
        alternatives_exhausted: bool,
    ) -> ResolutionStrategy {
        if alternatives_exhausted {
            ResolutionStrategy::ManualResolutionRequired
        } else {
            self.resolve(severity)
        }
    }

    /// Returns whether the conflict may be resolved without confirmation.
    #[must_use]
    pub fn can_auto_resolve(&self, conflict: &ConflictResult) -> bool {
        conflict.severity <= self.thresholds.auto_resolve_ceiling && !conflict.strategy.is_manual()
    }

    /// Returns the 0-100 sensitivity score for `severity`.
    #[must_use]
    pub const fn sensitivity_score(severity: Severity) -> u8 {
        severity.sensitivity_score()
    }
}
