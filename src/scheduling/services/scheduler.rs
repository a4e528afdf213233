//! Send-time approval across every recipient group of a message.

use super::{
    detector::{ConflictDetector, DetectionRequest},
    resolver::{DiasporaRelevanceResolver, ObservanceScope},
};
use crate::scheduling::{
    domain::{
        ConflictResult, DiasporaProfile, LanguageCode, ObservancePeriod, ResolutionStrategy,
        Severity,
    },
    ports::{CalendarError, ObservanceCalendar, Translator},
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Days before the requested time included in calendar queries, wide enough
/// for preceding-day alternatives.
const QUERY_LOOKBEHIND_DAYS: i64 = 2;

/// Days after the requested time included in calendar queries, wide enough
/// for the furthest windowing alternative.
const QUERY_LOOKAHEAD_DAYS: i64 = 3;

/// Request to approve a send time for a set of recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    /// Requested send instant.
    pub requested_time: DateTime<Utc>,
    /// Expected duration of the send.
    pub duration: TimeDelta,
    /// Recipient profiles.
    pub recipients: Vec<DiasporaProfile>,
    /// Alternatives before this instant are discarded.
    pub earliest_allowed: Option<DateTime<Utc>>,
    /// Language for reason and guidance text.
    pub language: Option<LanguageCode>,
}

impl ScheduleRequest {
    /// Creates an instantaneous send request.
    #[must_use]
    pub fn new(
        requested_time: DateTime<Utc>,
        recipients: impl IntoIterator<Item = DiasporaProfile>,
    ) -> Self {
        Self {
            requested_time,
            duration: TimeDelta::zero(),
            recipients: recipients.into_iter().collect(),
            earliest_allowed: None,
            language: None,
        }
    }

    /// Sets the expected duration.
    #[must_use]
    pub const fn with_duration(mut self, duration: TimeDelta) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the earliest instant an alternative may use.
    #[must_use]
    pub const fn with_earliest_allowed(mut self, earliest: DateTime<Utc>) -> Self {
        self.earliest_allowed = Some(earliest);
        self
    }

    /// Sets the language for explanatory text.
    #[must_use]
    pub fn with_language(mut self, language: LanguageCode) -> Self {
        self.language = Some(language);
        self
    }
}

/// Outcome of scheduling a send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleDecision {
    /// Time the caller asked for.
    pub requested_time: DateTime<Utc>,
    /// Time the send may go out at.
    pub approved_time: DateTime<Utc>,
    /// Whether `approved_time` differs from the request.
    pub was_adjusted: bool,
    /// Whether a human must confirm or pick the time.
    pub requires_confirmation: bool,
    /// Strictest conflict across recipient groups.
    pub conflict: ConflictResult,
}

/// Errors returned while scheduling.
#[derive(Debug, Clone, Error)]
pub enum SchedulingError {
    /// The request has no recipients.
    #[error("schedule request has no recipients")]
    NoRecipients,

    /// The observance calendar failed.
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

/// Result type for scheduling operations.
pub type SchedulingResult<T> = Result<T, SchedulingError>;

struct GroupEvaluation {
    scope: ObservanceScope,
    periods: Vec<ObservancePeriod>,
    result: ConflictResult,
}

/// Approves send times against the calendars of every recipient group.
///
/// Scheduling does not read the clock; repeating a request against the same
/// calendar yields the same decision.
#[derive(Clone)]
pub struct TimingScheduler<Cal, Tr>
where
    Cal: ObservanceCalendar,
    Tr: Translator,
{
    calendar: Arc<Cal>,
    translator: Arc<Tr>,
    detector: ConflictDetector,
    resolver: DiasporaRelevanceResolver,
}

impl<Cal, Tr> TimingScheduler<Cal, Tr>
where
    Cal: ObservanceCalendar,
    Tr: Translator,
{
    /// Creates a scheduler with the default detector and resolver.
    #[must_use]
    pub fn new(calendar: Arc<Cal>, translator: Arc<Tr>) -> Self {
        Self {
            calendar,
            translator,
            detector: ConflictDetector::default(),
            resolver: DiasporaRelevanceResolver::default(),
        }
    }

    /// Replaces the conflict detector.
    #[must_use]
    pub fn with_detector(mut self, detector: ConflictDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Replaces the relevance resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: DiasporaRelevanceResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Returns the conflict detector.
    #[must_use]
    pub const fn detector(&self) -> &ConflictDetector {
        &self.detector
    }

    /// Approves a send time for `request`.
    ///
    /// Each distinct recipient group (communities, zone, location, flag
    /// floor) is checked against its own calendar slice and the strictest
    /// result wins. Alternatives are kept only when they are clear for every
    /// group. A conflict that the policy may auto-resolve moves the send to
    /// the first alternative; any other conflict keeps the requested time
    /// and requires confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::NoRecipients`] for an empty recipient list
    /// or [`SchedulingError::Calendar`] when a calendar query fails.
    pub async fn schedule(&self, request: &ScheduleRequest) -> SchedulingResult<ScheduleDecision> {
        if request.recipients.is_empty() {
            return Err(SchedulingError::NoRecipients);
        }

        let evaluations = self.evaluate_groups(request).await?;
        let strictest = self.combine(&evaluations, request.duration);
        let conflict = self.localise(strictest, request.language.as_ref()).await;
        let decision = self.decide(request.requested_time, conflict);

        if decision.was_adjusted {
            info!(
                requested = %decision.requested_time,
                approved = %decision.approved_time,
                severity = %decision.conflict.severity,
                "send time adjusted around observance"
            );
        } else if decision.requires_confirmation {
            info!(
                requested = %decision.requested_time,
                severity = %decision.conflict.severity,
                strategy = %decision.conflict.strategy,
                "send time requires confirmation"
            );
        } else {
            debug!(requested = %decision.requested_time, "send time approved as requested");
        }
        Ok(decision)
    }

    async fn evaluate_groups(
        &self,
        request: &ScheduleRequest,
    ) -> SchedulingResult<Vec<GroupEvaluation>> {
        let default_floor = self.detector.policy().thresholds().flag_floor;
        let mut scopes: Vec<ObservanceScope> = Vec::new();
        for profile in &request.recipients {
            let scope = self.resolver.resolve_observance_scope(profile, default_floor);
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }

        let (from, to) = query_window(request);
        let mut evaluations = Vec::with_capacity(scopes.len());
        for scope in scopes {
            let fetched = if scope.communities.is_empty() {
                Vec::new()
            } else {
                self.calendar.query(&scope.communities, from, to).await?
            };
            let periods: Vec<ObservancePeriod> = fetched
                .into_iter()
                .filter(|period| scope.communities.contains(period.community()))
                .filter(|period| {
                    self.resolver
                        .is_relevant_for_location(period.scope(), &scope.location)
                })
                .collect();

            let mut detection =
                DetectionRequest::new(request.requested_time, request.duration, &periods)
                    .with_zone(scope.zone)
                    .with_flag_floor(scope.flag_floor);
            if let Some(earliest) = request.earliest_allowed {
                detection = detection.with_earliest_allowed(earliest);
            }
            let result = self.detector.detect_with(&detection);
            debug!(
                zone = %scope.zone,
                communities = scope.communities.len(),
                periods = periods.len(),
                has_conflict = result.has_conflict,
                "evaluated recipient group"
            );
            evaluations.push(GroupEvaluation {
                scope,
                periods,
                result,
            });
        }
        Ok(evaluations)
    }

    fn combine(&self, evaluations: &[GroupEvaluation], duration: TimeDelta) -> ConflictResult {
        let mut strictest: Option<&GroupEvaluation> = None;
        for evaluation in evaluations.iter().filter(|e| e.result.has_conflict) {
            let stricter = strictest.is_none_or(|current| {
                strictness(&evaluation.result) > strictness(&current.result)
            });
            if stricter {
                strictest = Some(evaluation);
            }
        }
        let Some(chosen) = strictest else {
            return ConflictResult::clear();
        };

        let mut combined = chosen.result.clone();
        if evaluations.len() == 1 {
            return combined;
        }

        let mut pool: Vec<DateTime<Utc>> = Vec::new();
        let candidates = chosen.result.alternatives.iter().chain(
            evaluations
                .iter()
                .filter(|e| e.result.has_conflict)
                .flat_map(|e| e.result.alternatives.iter()),
        );
        for candidate in candidates {
            if !pool.contains(candidate) {
                pool.push(*candidate);
            }
        }

        let clear_for_all: Vec<DateTime<Utc>> = pool
            .into_iter()
            .filter(|candidate| {
                evaluations.iter().all(|e| {
                    self.detector
                        .is_clear(*candidate, duration, &e.periods, e.scope.flag_floor)
                })
            })
            .collect();

        let exhausted = clear_for_all.is_empty();
        if !exhausted {
            combined.alternatives = clear_for_all;
        }
        combined.strategy = self
            .detector
            .policy()
            .strategy_for(combined.severity, exhausted);
        combined
    }

    async fn localise(
        &self,
        conflict: ConflictResult,
        language: Option<&LanguageCode>,
    ) -> ConflictResult {
        let Some(target) = language else {
            return conflict;
        };
        if !conflict.has_conflict {
            return conflict;
        }
        let reason = self.translator.translate(&conflict.reason, target).await;
        let guidance = self.translator.translate(&conflict.guidance, target).await;
        conflict.with_text(reason, guidance)
    }

    fn decide(&self, requested_time: DateTime<Utc>, conflict: ConflictResult) -> ScheduleDecision {
        let auto_time = if conflict.has_conflict && self.detector.policy().can_auto_resolve(&conflict)
        {
            conflict.first_alternative()
        } else {
            None
        };
        let approved_time = auto_time.unwrap_or(requested_time);
        ScheduleDecision {
            requested_time,
            approved_time,
            was_adjusted: auto_time.is_some(),
            requires_confirmation: conflict.has_conflict && auto_time.is_none(),
            conflict,
        }
    }
}

fn strictness(result: &ConflictResult) -> (Severity, ResolutionStrategy) {
    (result.severity, result.strategy)
}

fn query_window(request: &ScheduleRequest) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = request.requested_time;
    let from = start
        .checked_sub_signed(TimeDelta::days(QUERY_LOOKBEHIND_DAYS))
        .unwrap_or(start);
    let to = start
        .checked_add_signed(request.duration.max(TimeDelta::zero()))
        .and_then(|end| end.checked_add_signed(TimeDelta::days(QUERY_LOOKAHEAD_DAYS)))
        .unwrap_or(start);
    (from, to)
}
