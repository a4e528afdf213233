//! Unit tests for the delivery module.
//!
//! Domain tests exercise the message state machine and recipient records
//! directly; service tests drive them through the in-memory adapters with a
//! manually advanced clock.


use crate::delivery::{
    adapters::memory::{
        InMemoryMessageRepository, InMemoryRecipientStatusStore, ManualClock, RecordingEventSink,
        ScriptedTransport,
    },
    domain::{EmailAddress, LeaseConfig, Message, MessageDraft, PayloadRef, WorkerId},
    services::{CreateMessageRequest, MessageLifecycleService},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

type MemoryLifecycle = MessageLifecycleService<
    InMemoryMessageRepository,
    InMemoryRecipientStatusStore,
    ScriptedTransport,
    ManualClock,
>;

fn epoch() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-03-14T08:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

fn address(value: &str) -> EmailAddress {
    EmailAddress::new(value).expect("test addresses are valid")
}

fn worker(name: &str) -> WorkerId {
    WorkerId::new(name).expect("test worker ids are valid")
}

fn draft(recipients: &[&str]) -> MessageDraft {
    MessageDraft::new(
        address("outreach@kalaya.org"),
        recipients.iter().copied().map(address),
        PayloadRef::new("templates/pongal-greeting").expect("valid payload reference"),
    )
}

fn request(recipients: &[&str]) -> CreateMessageRequest {
    CreateMessageRequest::new(
        "outreach@kalaya.org",
        recipients.iter().copied(),
        "templates/pongal-greeting",
    )
}

/// Lifecycle service wired to in-memory adapters that tests can inspect.
struct Harness {
    service: Arc<MemoryLifecycle>,
    repository: InMemoryMessageRepository,
    recipients: InMemoryRecipientStatusStore,
    transport: ScriptedTransport,
    events: RecordingEventSink,
    clock: ManualClock,
}

impl Harness {
    fn new(lease: LeaseConfig) -> Self {
        let repository = InMemoryMessageRepository::new();
        let recipients = InMemoryRecipientStatusStore::new();
        let transport = ScriptedTransport::new();
        let events = RecordingEventSink::new();
        let clock = ManualClock::new(epoch());
        let service = MessageLifecycleService::new(
            Arc::new(repository.clone()),
            Arc::new(recipients.clone()),
            Arc::new(transport.clone()),
            Arc::new(clock.clone()),
        )
        .with_events(Arc::new(events.clone()))
        .with_lease_config(lease);
        Self {
            service: Arc::new(service),
            repository,
            recipients,
            transport,
            events,
            clock,
        }
    }

    async fn queued(&self, message: CreateMessageRequest) -> Message {
        let created = self
            .service
            .create(message)
            .await
            .expect("message should be created");
        self.service
            .queue(created.id(), None)
            .await
            .expect("message should be queued")
    }
}
