//! Shared world state for cultural scheduling BDD scenarios.

use chrono::{DateTime, Utc};
use kalaya::scheduling::{
    domain::{DiasporaProfile, ObservancePeriod},
    services::{ScheduleDecision, SchedulingError},
};
use rstest::fixture;

/// Scenario world for cultural scheduling behaviour tests.
#[derive(Default)]
pub struct SchedulingWorld {
    pub periods: Vec<ObservancePeriod>,
    pub recipients: Vec<DiasporaProfile>,
    pub outcome: Option<Result<ScheduleDecision, SchedulingError>>,
}

impl SchedulingWorld {
    /// Returns the decision reached by the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error when nothing was scheduled or scheduling failed.
    pub fn decision(&self) -> Result<&ScheduleDecision, eyre::Report> {
        match self.outcome.as_ref() {
            Some(Ok(decision)) => Ok(decision),
            Some(Err(err)) => Err(eyre::eyre!("scheduling failed: {err}")),
            None => Err(eyre::eyre!("missing scheduling outcome in scenario world")),
        }
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> SchedulingWorld {
    SchedulingWorld::default()
}

/// Parses an RFC 3339 timestamp from a scenario.
///
/// # Errors
///
/// Returns an error for malformed timestamps.
pub fn parse_time(text: &str) -> Result<DateTime<Utc>, eyre::Report> {
    DateTime::parse_from_rfc3339(text)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| eyre::eyre!("invalid timestamp {text:?} in scenario: {err}"))
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
