//! Shared world state for message lifecycle BDD scenarios.

use chrono::{DateTime, Utc};
use kalaya::delivery::{
    adapters::memory::{
        InMemoryMessageRepository, InMemoryRecipientStatusStore, ManualClock, ScriptedTransport,
    },
    domain::Message,
    services::{Claim, MessageLifecycleError, MessageLifecycleService},
};
use rstest::fixture;
use std::sync::Arc;

/// Service type used by the BDD world.
pub type TestLifecycleService = MessageLifecycleService<
    InMemoryMessageRepository,
    InMemoryRecipientStatusStore,
    ScriptedTransport,
    ManualClock,
>;

/// Scenario world for message lifecycle behaviour tests.
pub struct LifecycleWorld {
    pub service: Arc<TestLifecycleService>,
    pub transport: ScriptedTransport,
    pub clock: ManualClock,
    pub message: Option<Message>,
    pub claim_results: Vec<Result<Claim, MessageLifecycleError>>,
}

impl LifecycleWorld {
    /// Creates a world over fresh in-memory adapters.
    #[must_use]
    pub fn new() -> Self {
        let transport = ScriptedTransport::new();
        let clock = ManualClock::new(start());
        let service = MessageLifecycleService::new(
            Arc::new(InMemoryMessageRepository::new()),
            Arc::new(InMemoryRecipientStatusStore::new()),
            Arc::new(transport.clone()),
            Arc::new(clock.clone()),
        );

        Self {
            service: Arc::new(service),
            transport,
            clock,
            message: None,
            claim_results: Vec::new(),
        }
    }

    /// Returns the scenario's message.
    ///
    /// # Errors
    ///
    /// Returns an error when no message has been created yet.
    pub fn message(&self) -> Result<&Message, eyre::Report> {
        self.message
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing message in scenario world"))
    }
}

impl Default for LifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn start() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-04-13T18:00:00Z")
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_default()
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> LifecycleWorld {
    LifecycleWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
