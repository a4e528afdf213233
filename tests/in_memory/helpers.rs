//! Shared fixtures for in-memory engine integration tests.

use chrono::{DateTime, Utc};
use kalaya::{
    config::EngineConfig,
    delivery::{
        adapters::memory::{
            InMemoryMessageRepository, InMemoryRecipientStatusStore, ManualClock,
            RecordingEventSink, ScriptedTransport,
        },
        domain::{EmailAddress, Message, WorkerId},
        services::{CreateMessageRequest, MessageLifecycleService, SendRequestService},
    },
    scheduling::{
        adapters::memory::{InMemoryObservanceCalendar, PhraseBookTranslator},
        domain::{CommunityId, ObservancePeriod, ObservanceType, Severity},
        services::{ConflictDetector, TimingScheduler},
    },
    telemetry,
};
use rstest::fixture;
use std::sync::Arc;

/// Lifecycle service wired to in-memory adapters.
pub type MemoryLifecycle = MessageLifecycleService<
    InMemoryMessageRepository,
    InMemoryRecipientStatusStore,
    ScriptedTransport,
    ManualClock,
>;

/// Scheduler wired to an in-memory calendar.
pub type MemoryScheduler = TimingScheduler<InMemoryObservanceCalendar, PhraseBookTranslator>;

/// Send-request front end over the in-memory scheduler and engine.
pub type MemorySendRequests = SendRequestService<
    InMemoryObservanceCalendar,
    PhraseBookTranslator,
    InMemoryMessageRepository,
    InMemoryRecipientStatusStore,
    ScriptedTransport,
    ManualClock,
>;

/// Parses an RFC 3339 timestamp.
pub fn at(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text)
        .expect("test timestamps are valid RFC 3339")
        .with_timezone(&Utc)
}

/// Start of every scenario: the Thai Pongal morning in UTC.
pub fn epoch() -> DateTime<Utc> {
    at("2025-01-14T08:00:00Z")
}

/// Parses a test address.
pub fn address(value: &str) -> EmailAddress {
    EmailAddress::new(value).expect("test addresses are valid")
}

/// Builds a worker identifier.
pub fn worker(name: &str) -> WorkerId {
    WorkerId::new(name).expect("test worker ids are valid")
}

/// Builds a community identifier.
pub fn community(slug: &str) -> CommunityId {
    CommunityId::new(slug).expect("test community slugs are valid")
}

/// Builds an observance for `slug` over `[start, end)`.
pub fn observance(
    name: &str,
    slug: &str,
    observance_type: ObservanceType,
    window: (&str, &str),
    severity: Severity,
) -> ObservancePeriod {
    ObservancePeriod::new(
        name,
        community(slug),
        observance_type,
        at(window.0),
        at(window.1),
        severity,
    )
    .expect("test observance windows are valid")
}

/// Builds a newsletter send request for `recipients`.
pub fn newsletter(recipients: &[&str]) -> CreateMessageRequest {
    CreateMessageRequest::new(
        "newsletter@kalaya.org",
        recipients.iter().copied(),
        "newsletters/2025-01",
    )
}

/// Delivery engine over in-memory adapters, with handles for inspection.
pub struct Engine {
    /// Configured lifecycle service.
    pub service: Arc<MemoryLifecycle>,
    /// Message storage.
    pub repository: InMemoryMessageRepository,
    /// Recipient storage.
    pub recipients: InMemoryRecipientStatusStore,
    /// Scripted provider.
    pub transport: ScriptedTransport,
    /// Published events.
    pub events: RecordingEventSink,
    /// Engine time.
    pub clock: ManualClock,
}

impl Engine {
    /// Builds an engine configured by `config`.
    pub fn with_config(config: &EngineConfig) -> Self {
        telemetry::init();
        let repository = InMemoryMessageRepository::new();
        let recipients = InMemoryRecipientStatusStore::new();
        let transport = ScriptedTransport::new();
        let events = RecordingEventSink::new();
        let clock = ManualClock::new(epoch());
        let service = config.shared_lifecycle(
            MessageLifecycleService::new(
                Arc::new(repository.clone()),
                Arc::new(recipients.clone()),
                Arc::new(transport.clone()),
                Arc::new(clock.clone()),
            )
            .with_events(Arc::new(events.clone())),
        );
        Self {
            service,
            repository,
            recipients,
            transport,
            events,
            clock,
        }
    }

    /// Creates and queues a message at its scheduled time.
    ///
    /// # Errors
    ///
    /// Returns an error if creation or queueing fails.
    pub async fn enqueue(&self, request: CreateMessageRequest) -> eyre::Result<Message> {
        let created = self.service.create(request).await?;
        Ok(self.service.queue(created.id(), None).await?)
    }
}

/// Provides an engine with default configuration.
#[fixture]
pub fn engine() -> Engine {
    Engine::with_config(&EngineConfig::default())
}

/// Builds a scheduler over `periods` using the policy in `config`.
pub fn scheduler(
    config: &EngineConfig,
    periods: impl IntoIterator<Item = ObservancePeriod>,
) -> MemoryScheduler {
    TimingScheduler::new(
        Arc::new(InMemoryObservanceCalendar::with_periods(periods)),
        Arc::new(PhraseBookTranslator::new()),
    )
    .with_detector(ConflictDetector::new(
        Arc::default(),
        config.resolution_policy(),
    ))
}
