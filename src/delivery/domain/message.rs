//! Message aggregate root and its lifecycle.

use super::{
    DeliveryDomainError, DeliveryFailure, EmailAddress, FailureKind, Lease, LeaseToken,
    MessageId, MessageStatus, PayloadRef, Priority, RetryPolicy, WorkerId, validate_max_retries,
};
use crate::scheduling::domain::{ResolutionStrategy, Severity};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Scheduling outcome recorded on a message when its send time was checked
/// against observance calendars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CulturalContext {
    /// Time originally requested.
    pub requested_time: DateTime<Utc>,
    /// Time approved by scheduling.
    pub approved_time: DateTime<Utc>,
    /// Severity of the strictest conflict.
    pub severity: Severity,
    /// Strategy chosen for the conflict.
    pub strategy: ResolutionStrategy,
    /// Name of the conflicting observance, if any.
    pub conflicting_observance: Option<String>,
}

/// One entry in a message's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// Status before the transition.
    pub from: MessageStatus,
    /// Status after the transition.
    pub to: MessageStatus,
    /// Transition time.
    pub at: DateTime<Utc>,
    /// Optional explanation.
    pub note: Option<String>,
}

/// Record of a finished delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Worker that made the attempt.
    pub worker: WorkerId,
    /// Lease grant time.
    pub started_at: DateTime<Utc>,
    /// Completion time.
    pub finished_at: DateTime<Utc>,
    /// Failure, when the attempt did not succeed.
    pub failure: Option<DeliveryFailure>,
}

/// What happens after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    /// A retry may start at the given instant.
    RetryAt(DateTime<Utc>),
    /// The failure was transient but the retry ceiling was reached.
    Exhausted,
    /// The failure was permanent.
    Permanent,
}

/// Validated input for creating a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    /// Sending address.
    pub sender: EmailAddress,
    /// Recipient addresses; at least one, no duplicates.
    pub recipients: Vec<EmailAddress>,
    /// Reference to the message body.
    pub payload: PayloadRef,
    /// Dispatch priority.
    pub priority: Priority,
    /// Retry ceiling in `1..=10`.
    pub max_retries: u32,
    /// Requested send time; defaults to creation time.
    pub scheduled_send_time: Option<DateTime<Utc>>,
    /// Scheduling outcome, when known.
    pub cultural_context: Option<CulturalContext>,
}

impl MessageDraft {
    /// Creates a draft with default priority and retry ceiling.
    #[must_use]
    pub fn new(
        sender: EmailAddress,
        recipients: impl IntoIterator<Item = EmailAddress>,
        payload: PayloadRef,
    ) -> Self {
        Self {
            sender,
            recipients: recipients.into_iter().collect(),
            payload,
            priority: Priority::default(),
            max_retries: RetryPolicy::default().max_retries,
            scheduled_send_time: None,
            cultural_context: None,
        }
    }

    /// Sets the dispatch priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the retry ceiling.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the requested send time.
    #[must_use]
    pub const fn with_scheduled_send_time(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_send_time = Some(at);
        self
    }

    /// Attaches a scheduling outcome.
    #[must_use]
    pub fn with_cultural_context(mut self, context: CulturalContext) -> Self {
        self.cultural_context = Some(context);
        self
    }
}

/// Message aggregate root.
///
/// All status changes go through methods that validate the transition
/// first; a rejected transition leaves the message untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    sender: EmailAddress,
    recipients: Vec<EmailAddress>,
    payload: PayloadRef,
    status: MessageStatus,
    priority: Priority,
    retry_count: u32,
    max_retries: u32,
    next_retry_at: Option<DateTime<Utc>>,
    scheduled_send_time: DateTime<Utc>,
    cultural_context: Option<CulturalContext>,
    cultural_override: Option<String>,
    lease: Option<Lease>,
    provider_message_id: Option<String>,
    last_failure: Option<DeliveryFailure>,
    history: Vec<StateTransition>,
    attempts: Vec<AttemptRecord>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Message {
    /// Creates a pending message from a draft.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::NoRecipients`],
    /// [`DeliveryDomainError::DuplicateRecipient`], or
    /// [`DeliveryDomainError::InvalidMaxRetries`] when the draft is invalid.
    pub fn new(draft: MessageDraft, clock: &impl Clock) -> Result<Self, DeliveryDomainError> {
        if draft.recipients.is_empty() {
            return Err(DeliveryDomainError::NoRecipients);
        }
        for (position, recipient) in draft.recipients.iter().enumerate() {
            if draft.recipients.iter().skip(position + 1).any(|other| other == recipient) {
                return Err(DeliveryDomainError::DuplicateRecipient(recipient.clone()));
            }
        }
        validate_max_retries(draft.max_retries)?;

        let timestamp = clock.utc();
        Ok(Self {
            id: MessageId::new(),
            sender: draft.sender,
            recipients: draft.recipients,
            payload: draft.payload,
            status: MessageStatus::Pending,
            priority: draft.priority,
            retry_count: 0,
            max_retries: draft.max_retries,
            next_retry_at: None,
            scheduled_send_time: draft.scheduled_send_time.unwrap_or(timestamp),
            cultural_context: draft.cultural_context,
            cultural_override: None,
            lease: None,
            provider_message_id: None,
            last_failure: None,
            history: Vec::new(),
            attempts: Vec::new(),
            created_at: timestamp,
            updated_at: timestamp,
            version: 0,
        })
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the sending address.
    #[must_use]
    pub const fn sender(&self) -> &EmailAddress {
        &self.sender
    }

    /// Returns the recipients.
    #[must_use]
    pub fn recipients(&self) -> &[EmailAddress] {
        &self.recipients
    }

    /// Returns the payload reference.
    #[must_use]
    pub const fn payload(&self) -> &PayloadRef {
        &self.payload
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> MessageStatus {
        self.status
    }

    /// Returns the dispatch priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns how many attempts have failed.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Returns the retry ceiling.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns when the next retry may start, if one is scheduled.
    ///
    /// Set while the message is `Failed` with retries left, and kept after a
    /// retryable failure is requeued so the `Queued` message is not claimed
    /// early. Cleared when the next attempt begins.
    #[must_use]
    pub const fn next_retry_at(&self) -> Option<DateTime<Utc>> {
        self.next_retry_at
    }

    /// Returns the approved send time.
    #[must_use]
    pub const fn scheduled_send_time(&self) -> DateTime<Utc> {
        self.scheduled_send_time
    }

    /// Returns the recorded scheduling outcome.
    #[must_use]
    pub const fn cultural_context(&self) -> Option<&CulturalContext> {
        self.cultural_context.as_ref()
    }

    /// Returns the reason given when a conflict was overridden.
    #[must_use]
    pub fn cultural_override(&self) -> Option<&str> {
        self.cultural_override.as_deref()
    }

    /// Returns the current lease, if any.
    #[must_use]
    pub const fn lease(&self) -> Option<&Lease> {
        self.lease.as_ref()
    }

    /// Returns the provider identifier of the accepted send.
    #[must_use]
    pub fn provider_message_id(&self) -> Option<&str> {
        self.provider_message_id.as_deref()
    }

    /// Returns the most recent failure.
    #[must_use]
    pub const fn last_failure(&self) -> Option<&DeliveryFailure> {
        self.last_failure.as_ref()
    }

    /// Returns the status audit trail, oldest first.
    #[must_use]
    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    /// Returns finished attempts, oldest first.
    #[must_use]
    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.attempts
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest change timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the optimistic-concurrency version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns the message with its version replaced.
    ///
    /// Repository adapters call this when persisting an update.
    #[must_use]
    pub const fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Returns whether the message can never change status again.
    ///
    /// A failed message is terminal once no retry is scheduled.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        match self.status {
            MessageStatus::Delivered | MessageStatus::Cancelled => true,
            MessageStatus::Failed => self.next_retry_at.is_none(),
            _ => false,
        }
    }

    /// Returns the instant a queued message becomes due.
    #[must_use]
    pub fn ready_at(&self) -> DateTime<Utc> {
        self.next_retry_at
            .map_or(self.scheduled_send_time, |retry_at| {
                retry_at.max(self.scheduled_send_time)
            })
    }

    /// Returns whether a worker may claim the message at `now`.
    ///
    /// Queued messages are claimable once due. Sending messages are
    /// claimable once their lease has expired.
    #[must_use]
    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            MessageStatus::Queued => self.ready_at() <= now,
            MessageStatus::Sending => self.lease.as_ref().is_none_or(|lease| lease.is_expired(now)),
            _ => false,
        }
    }

    /// Moves a pending message to the queue for sending at `send_at`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::InvalidTransition`] unless pending.
    pub fn queue(
        &mut self,
        send_at: DateTime<Utc>,
        clock: &impl Clock,
    ) -> Result<(), DeliveryDomainError> {
        self.transition(MessageStatus::Queued, None, clock.utc())?;
        self.scheduled_send_time = send_at;
        Ok(())
    }

    /// Withdraws a message that has not started sending.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::InvalidTransition`] unless pending or
    /// queued.
    pub fn cancel(
        &mut self,
        reason: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), DeliveryDomainError> {
        self.transition(MessageStatus::Cancelled, Some(reason.into()), clock.utc())
    }

    /// Starts a delivery attempt under a new lease.
    ///
    /// A queued message that is due moves to sending. A sending message whose
    /// lease has expired is taken over without touching its retry count.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::NotReady`] before the message is due,
    /// [`DeliveryDomainError::LeaseHeld`] while another lease is live, or
    /// [`DeliveryDomainError::InvalidTransition`] from any other status.
    pub fn begin_attempt(
        &mut self,
        worker: WorkerId,
        ttl: TimeDelta,
        clock: &impl Clock,
    ) -> Result<Lease, DeliveryDomainError> {
        let now = clock.utc();
        match self.status {
            MessageStatus::Queued => {
                let ready_at = self.ready_at();
                if ready_at > now {
                    return Err(DeliveryDomainError::NotReady {
                        message_id: self.id,
                        ready_at,
                    });
                }
                self.transition(MessageStatus::Sending, None, now)?;
                self.next_retry_at = None;
            }
            MessageStatus::Sending => {
                if let Some(live) = self.lease.as_ref().filter(|lease| !lease.is_expired(now)) {
                    return Err(DeliveryDomainError::LeaseHeld {
                        message_id: self.id,
                        expires_at: live.expires_at,
                    });
                }
                let note = self
                    .lease
                    .as_ref()
                    .map(|expired| format!("lease reclaimed from {}", expired.worker));
                self.history.push(StateTransition {
                    from: MessageStatus::Sending,
                    to: MessageStatus::Sending,
                    at: now,
                    note,
                });
                self.updated_at = now;
            }
            other => {
                return Err(DeliveryDomainError::InvalidTransition {
                    message_id: self.id,
                    from: other,
                    to: MessageStatus::Sending,
                });
            }
        }
        let lease = Lease::grant(worker, now, ttl);
        self.lease = Some(lease.clone());
        Ok(lease)
    }

    /// Completes the attempt held under `token` as sent.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::LeaseMismatch`] when `token` is not the
    /// current lease, or [`DeliveryDomainError::InvalidTransition`] when the
    /// message is not sending.
    pub fn complete_sent(
        &mut self,
        token: LeaseToken,
        provider_message_id: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), DeliveryDomainError> {
        let now = clock.utc();
        let lease = self.held_lease(token)?;
        self.transition(MessageStatus::Sent, None, now)?;
        self.attempts.push(AttemptRecord {
            worker: lease.worker,
            started_at: lease.acquired_at,
            finished_at: now,
            failure: None,
        });
        self.lease = None;
        self.last_failure = None;
        if provider_message_id.is_some() {
            self.provider_message_id = provider_message_id;
        }
        Ok(())
    }

    /// Records a failed attempt held under `token`.
    ///
    /// The retry count increases by one. A transient failure below the retry
    /// ceiling schedules a retry using `policy`'s backoff; anything else
    /// leaves the message terminally failed.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::LeaseMismatch`] when `token` is not the
    /// current lease, or [`DeliveryDomainError::InvalidTransition`] when the
    /// message is not sending.
    pub fn fail_attempt(
        &mut self,
        token: LeaseToken,
        failure: DeliveryFailure,
        policy: &RetryPolicy,
        clock: &impl Clock,
    ) -> Result<RetryDisposition, DeliveryDomainError> {
        let now = clock.utc();
        let lease = self.held_lease(token)?;
        self.transition(MessageStatus::Failed, Some(failure.reason.clone()), now)?;
        self.retry_count = self.retry_count.saturating_add(1).min(self.max_retries);

        let retryable = failure.is_transient() && self.retry_count < self.max_retries;
        self.next_retry_at = retryable.then(|| policy.next_retry_at(now, self.retry_count));
        self.lease = None;
        self.attempts.push(AttemptRecord {
            worker: lease.worker,
            started_at: lease.acquired_at,
            finished_at: now,
            failure: Some(failure.clone()),
        });
        let kind = failure.kind;
        self.last_failure = Some(failure);

        Ok(match (self.next_retry_at, kind) {
            (Some(retry_at), _) => RetryDisposition::RetryAt(retry_at),
            (None, FailureKind::Transient) => RetryDisposition::Exhausted,
            (None, FailureKind::Permanent) => RetryDisposition::Permanent,
        })
    }

    /// Returns a retryable failed message to the queue.
    ///
    /// The scheduled retry time is kept; the message becomes claimable once
    /// it passes.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::InvalidTransition`] unless the message
    /// failed with a retry scheduled.
    pub fn requeue(&mut self, clock: &impl Clock) -> Result<(), DeliveryDomainError> {
        self.transition(MessageStatus::Queued, Some("retry".to_owned()), clock.utc())
    }

    /// Records confirmed delivery.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::InvalidTransition`] unless sent.
    pub fn mark_delivered(&mut self, clock: &impl Clock) -> Result<(), DeliveryDomainError> {
        self.transition(MessageStatus::Delivered, None, clock.utc())
    }

    /// Changes the dispatch priority.
    pub fn reprioritise(&mut self, priority: Priority, clock: &impl Clock) {
        self.priority = priority;
        self.updated_at = clock.utc();
    }

    /// Records that a person chose the send time despite a conflict.
    pub fn record_cultural_override(&mut self, reason: impl Into<String>, clock: &impl Clock) {
        self.cultural_override = Some(reason.into());
        self.updated_at = clock.utc();
    }

    fn held_lease(&self, token: LeaseToken) -> Result<Lease, DeliveryDomainError> {
        self.lease
            .as_ref()
            .filter(|lease| lease.token == token)
            .cloned()
            .ok_or(DeliveryDomainError::LeaseMismatch(self.id))
    }

    fn transition(
        &mut self,
        to: MessageStatus,
        note: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), DeliveryDomainError> {
        if self.is_terminal() || !self.status.can_transition_to(to) {
            return Err(DeliveryDomainError::InvalidTransition {
                message_id: self.id,
                from: self.status,
                to,
            });
        }
        self.history.push(StateTransition {
            from: self.status,
            to,
            at,
            note,
        });
        self.status = to;
        self.updated_at = at;
        Ok(())
    }
}
