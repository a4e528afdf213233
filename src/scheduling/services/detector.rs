//! Conflict detection between a proposed send and observance periods.

use super::policy::{DEFAULT_FLAG_FLOOR, ResolutionPolicy};
use crate::scheduling::{
    domain::{ConflictResult, ObservancePeriod, Severity, ZoneSpec},
    windowing::{WindowingContext, WindowingRegistry},
};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use std::cmp::Ordering;
use std::sync::Arc;

/// Inputs to a single detection pass.
#[derive(Debug, Clone, Copy)]
pub struct DetectionRequest<'a> {
    /// Requested send instant.
    pub proposed: DateTime<Utc>,
    /// Expected duration of the send; zero means an instant.
    pub duration: TimeDelta,
    /// Candidate observance periods.
    pub periods: &'a [ObservancePeriod],
    /// Zone used for wall-clock windowing and same-day ordering.
    pub zone: ZoneSpec,
    /// Lowest severity treated as a conflict.
    pub flag_floor: Severity,
    /// Alternatives before this instant are discarded.
    pub earliest_allowed: Option<DateTime<Utc>>,
}

impl<'a> DetectionRequest<'a> {
    /// Creates a request evaluated in UTC with the default flag floor.
    #[must_use]
    pub const fn new(
        proposed: DateTime<Utc>,
        duration: TimeDelta,
        periods: &'a [ObservancePeriod],
    ) -> Self {
        Self {
            proposed,
            duration,
            periods,
            zone: ZoneSpec::Utc,
            flag_floor: DEFAULT_FLAG_FLOOR,
            earliest_allowed: None,
        }
    }

    /// Sets the zone used for windowing.
    #[must_use]
    pub const fn with_zone(mut self, zone: ZoneSpec) -> Self {
        self.zone = zone;
        self
    }

    /// Sets the flag floor.
    #[must_use]
    pub const fn with_flag_floor(mut self, flag_floor: Severity) -> Self {
        self.flag_floor = flag_floor;
        self
    }

    /// Sets the earliest instant an alternative may use.
    #[must_use]
    pub const fn with_earliest_allowed(mut self, earliest: DateTime<Utc>) -> Self {
        self.earliest_allowed = Some(earliest);
        self
    }

    fn end(&self) -> DateTime<Utc> {
        send_end(self.proposed, self.duration)
    }
}

/// Pure conflict detector.
///
/// Detection never reads the clock, so identical requests always produce
/// identical results.
#[derive(Debug, Clone, Default)]
pub struct ConflictDetector {
    registry: Arc<WindowingRegistry>,
    policy: ResolutionPolicy,
}

impl ConflictDetector {
    /// Creates a detector using `registry` for windowing and `policy` for
    /// strategies.
    #[must_use]
    pub const fn new(registry: Arc<WindowingRegistry>, policy: ResolutionPolicy) -> Self {
        Self { registry, policy }
    }

    /// Returns the resolution policy.
    #[must_use]
    pub const fn policy(&self) -> &ResolutionPolicy {
        &self.policy
    }

    /// Checks a send against `periods` in UTC using the policy's flag floor.
    #[must_use]
    pub fn detect(
        &self,
        proposed: DateTime<Utc>,
        duration: TimeDelta,
        periods: &[ObservancePeriod],
    ) -> ConflictResult {
        let request = DetectionRequest::new(proposed, duration, periods)
            .with_flag_floor(self.policy.thresholds().flag_floor);
        self.detect_with(&request)
    }

    /// Checks a send described by `request`.
    ///
    /// The primary conflict is the overlapping period with the highest
    /// severity; ties go to the earliest start. Alternatives come from the
    /// windowing rule for the primary period's type, are filtered against
    /// every flagged period, and are ordered same day first, then later days
    /// ascending, then earlier days. When every alternative still collides,
    /// the unfiltered list is returned with
    /// [`ResolutionStrategy::ManualResolutionRequired`](crate::scheduling::domain::ResolutionStrategy::ManualResolutionRequired).
    #[must_use]
    pub fn detect_with(&self, request: &DetectionRequest<'_>) -> ConflictResult {
        let flagged: Vec<&ObservancePeriod> = request
            .periods
            .iter()
            .filter(|period| is_flagged(period.severity(), request.flag_floor))
            .collect();

        let Some(primary) = flagged
            .iter()
            .copied()
            .filter(|period| period.overlaps(request.proposed, request.end()))
            .max_by(|left, right| primary_order(left, right))
        else {
            return ConflictResult::clear();
        };

        let context = WindowingContext {
            proposed: request.proposed,
            duration: request.duration,
            period: primary,
            zone: request.zone,
        };
        let rule = self.registry.rule_for(primary.observance_type());
        let mut proposals = rule.alternatives(&context);
        if proposals.is_empty() {
            proposals = self.registry.fallback().alternatives(&context);
        }

        let mut candidates = admissible(proposals, request);
        if candidates.is_empty() {
            candidates.push(last_resort(primary, request));
        }
        let clear: Vec<DateTime<Utc>> = candidates
            .iter()
            .copied()
            .filter(|candidate| is_clear_of(&flagged, *candidate, request.duration))
            .collect();

        let exhausted = clear.is_empty();
        let alternatives = if exhausted { candidates } else { clear };
        let strategy = self.policy.strategy_for(primary.severity(), exhausted);

        ConflictResult::against(primary, alternatives, strategy)
            .with_text(rule.reason(primary), rule.guidance(primary))
    }

    /// Returns whether a send at `candidate` avoids every period in
    /// `periods` at or above `flag_floor`.
    #[must_use]
    pub fn is_clear(
        &self,
        candidate: DateTime<Utc>,
        duration: TimeDelta,
        periods: &[ObservancePeriod],
        flag_floor: Severity,
    ) -> bool {
        let flagged: Vec<&ObservancePeriod> = periods
            .iter()
            .filter(|period| is_flagged(period.severity(), flag_floor))
            .collect();
        is_clear_of(&flagged, candidate, duration)
    }
}

fn send_end(start: DateTime<Utc>, duration: TimeDelta) -> DateTime<Utc> {
    start
        .checked_add_signed(duration.max(TimeDelta::zero()))
        .unwrap_or(start)
}

fn is_flagged(severity: Severity, floor: Severity) -> bool {
    severity.is_restrictive() && severity >= floor
}

fn is_clear_of(flagged: &[&ObservancePeriod], candidate: DateTime<Utc>, duration: TimeDelta) -> bool {
    let end = send_end(candidate, duration);
    !flagged.iter().any(|period| period.overlaps(candidate, end))
}

/// Orders periods so that `max_by` picks the highest severity and, among
/// equals, the earliest start.
fn primary_order(left: &ObservancePeriod, right: &ObservancePeriod) -> Ordering {
    left.severity()
        .cmp(&right.severity())
        .then_with(|| right.start().cmp(&left.start()))
}

/// Drops candidates before the earliest allowed instant, equal to the
/// proposed instant, or repeated, then orders the rest by local day.
fn admissible(
    proposals: Vec<DateTime<Utc>>,
    request: &DetectionRequest<'_>,
) -> Vec<DateTime<Utc>> {
    let mut kept: Vec<DateTime<Utc>> = Vec::with_capacity(proposals.len());
    for candidate in proposals {
        let too_early = request
            .earliest_allowed
            .is_some_and(|earliest| candidate < earliest);
        if too_early || candidate == request.proposed || kept.contains(&candidate) {
            continue;
        }
        kept.push(candidate);
    }
    let proposed_date = request.zone.local_date(request.proposed);
    kept.sort_by_key(|candidate| day_rank(request.zone, proposed_date, *candidate));
    kept
}

/// Same day ranks first, later days next in ascending order, earlier days
/// last.
fn day_rank(zone: ZoneSpec, proposed_date: NaiveDate, candidate: DateTime<Utc>) -> (u8, i64) {
    let offset = zone
        .local_date(candidate)
        .signed_duration_since(proposed_date)
        .num_days();
    match offset.cmp(&0) {
        Ordering::Equal => (0, 0),
        Ordering::Greater => (1, offset),
        Ordering::Less => (2, offset.saturating_neg()),
    }
}

fn last_resort(primary: &ObservancePeriod, request: &DetectionRequest<'_>) -> DateTime<Utc> {
    request
        .earliest_allowed
        .map_or(primary.end(), |earliest| earliest.max(primary.end()))
}
