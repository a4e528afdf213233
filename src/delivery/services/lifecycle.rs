//! Service layer driving messages through their delivery lifecycle.

use crate::delivery::{
    adapters::TracingEventSink,
    domain::{
        CulturalContext, DeliveryDomainError, DeliveryEvent, DeliveryFailure, DeliveryOutcome,
        EmailAddress, Lease, LeaseConfig, Message, MessageDraft, MessageId,
        PayloadRef, Priority, QueueStats, RecipientDeliveryState, RecipientStatus,
        RecipientSummary, RecipientUpdate, RetryDisposition, RetryPolicy, WorkerId,
    },
    ports::{
        DeliveryEventSink, MessageRepository, MessageRepositoryError, MessageTransport,
        RecipientStatusStore, RecipientStoreError,
    },
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::tracker::RecipientStatusTracker;

/// Default number of ready messages inspected per claim.
pub const DEFAULT_CLAIM_BATCH: usize = 16;

/// Request payload for creating a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateMessageRequest {
    sender: String,
    recipients: Vec<String>,
    payload: String,
    priority: Option<u8>,
    max_retries: Option<u32>,
    scheduled_send_time: Option<DateTime<Utc>>,
    cultural_context: Option<CulturalContext>,
}

impl CreateMessageRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(
        sender: impl Into<String>,
        recipients: impl IntoIterator<Item = impl Into<String>>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipients: recipients.into_iter().map(Into::into).collect(),
            payload: payload.into(),
            priority: None,
            max_retries: None,
            scheduled_send_time: None,
            cultural_context: None,
        }
    }

    /// Sets the dispatch priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the retry ceiling.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
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

    fn into_draft(self, default_max_retries: u32) -> Result<MessageDraft, DeliveryDomainError> {
        let sender = EmailAddress::new(self.sender)?;
        let recipients = self
            .recipients
            .into_iter()
            .map(EmailAddress::new)
            .collect::<Result<Vec<_>, _>>()?;
        let payload = PayloadRef::new(self.payload)?;

        let mut draft = MessageDraft::new(sender, recipients, payload)
            .with_max_retries(self.max_retries.unwrap_or(default_max_retries));
        if let Some(priority) = self.priority {
            draft = draft.with_priority(Priority::new(priority)?);
        }
        if let Some(at) = self.scheduled_send_time {
            draft = draft.with_scheduled_send_time(at);
        }
        if let Some(context) = self.cultural_context {
            draft = draft.with_cultural_context(context);
        }
        Ok(draft)
    }
}

/// A message leased to one worker for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// The leased message as stored.
    pub message: Message,
    /// The lease the worker holds.
    pub lease: Lease,
}

/// How a delivery attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// At least one recipient accepted and nothing needs retrying.
    Sent,
    /// A transient failure occurred; the message is queued again.
    RetryScheduled {
        /// When the retry becomes due.
        retry_at: DateTime<Utc>,
    },
    /// A transient failure occurred with no retries left.
    Exhausted(DeliveryFailure),
    /// Every recipient rejected the message permanently.
    Rejected(DeliveryFailure),
}

/// Result of [`MessageLifecycleService::attempt_delivery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptReport {
    /// Message state after the attempt.
    pub message: Message,
    /// Attempt result.
    pub outcome: AttemptOutcome,
}

/// Service-level errors for message lifecycle operations.
#[derive(Debug, Error)]
pub enum MessageLifecycleError {
    /// Domain validation or a lifecycle guard failed.
    #[error(transparent)]
    Domain(#[from] DeliveryDomainError),
    /// Message repository operation failed.
    #[error(transparent)]
    Repository(#[from] MessageRepositoryError),
    /// Recipient store operation failed.
    #[error(transparent)]
    Recipients(#[from] RecipientStoreError),
    /// The message does not exist.
    #[error("message not found: {0}")]
    NotFound(MessageId),
    /// Another writer changed the message while this worker held it.
    #[error("worker {worker} lost message {message_id} to a concurrent writer")]
    LeaseLost {
        /// Message identifier.
        message_id: MessageId,
        /// Worker that lost the race.
        worker: WorkerId,
    },
}

impl MessageLifecycleError {
    /// Returns whether the error only means the message is not available to
    /// this caller right now.
    #[must_use]
    pub const fn is_contention(&self) -> bool {
        matches!(
            self,
            Self::LeaseLost { .. }
                | Self::Domain(
                    DeliveryDomainError::LeaseHeld { .. }
                        | DeliveryDomainError::NotReady { .. }
                        | DeliveryDomainError::InvalidTransition { .. }
                )
        )
    }
}

/// Result type for message lifecycle service operations.
pub type MessageLifecycleResult<T> = Result<T, MessageLifecycleError>;

/// Message lifecycle orchestration service.
///
/// Every write goes through the repository's versioned update, so two
/// workers racing for one message cannot both move it into sending.
pub struct MessageLifecycleService<R, S, T, C>
where
    R: MessageRepository,
    S: RecipientStatusStore,
    T: MessageTransport,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    tracker: RecipientStatusTracker<S>,
    transport: Arc<T>,
    clock: Arc<C>,
    events: Arc<dyn DeliveryEventSink>,
    retry: RetryPolicy,
    lease: LeaseConfig,
    claim_batch: usize,
}

impl<R, S, T, C> MessageLifecycleService<R, S, T, C>
where
    R: MessageRepository,
    S: RecipientStatusStore,
    T: MessageTransport,
    C: Clock + Send + Sync,
{
    /// Creates a service with default retry and lease settings that logs
    /// events through `tracing`.
    #[must_use]
    pub fn new(repository: Arc<R>, recipients: Arc<S>, transport: Arc<T>, clock: Arc<C>) -> Self {
        let events: Arc<dyn DeliveryEventSink> = Arc::new(TracingEventSink::new());
        Self {
            repository,
            tracker: RecipientStatusTracker::new(recipients, Arc::clone(&events)),
            transport,
            clock,
            events,
            retry: RetryPolicy::default(),
            lease: LeaseConfig::default(),
            claim_batch: DEFAULT_CLAIM_BATCH,
        }
    }

    /// Routes events to `events`.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn DeliveryEventSink>) -> Self {
        self.tracker = self.tracker.with_events(Arc::clone(&events));
        self.events = events;
        self
    }

    /// Replaces the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the lease settings.
    #[must_use]
    pub const fn with_lease_config(mut self, lease: LeaseConfig) -> Self {
        self.lease = lease;
        self
    }

    /// Sets how many ready messages [`Self::claim_next`] inspects.
    #[must_use]
    pub fn with_claim_batch(mut self, claim_batch: usize) -> Self {
        self.claim_batch = claim_batch.max(1);
        self
    }

    /// Returns the retry policy in force.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Returns the lease settings in force.
    #[must_use]
    pub const fn lease_config(&self) -> &LeaseConfig {
        &self.lease
    }

    /// Returns the recipient tracker.
    #[must_use]
    pub const fn tracker(&self) -> &RecipientStatusTracker<S> {
        &self.tracker
    }

    /// Creates and stores a pending message and its recipient records.
    ///
    /// # Errors
    ///
    /// Returns [`MessageLifecycleError::Domain`] when the request is invalid,
    /// or a storage error when persistence fails.
    pub async fn create(&self, request: CreateMessageRequest) -> MessageLifecycleResult<Message> {
        let message = Message::new(request.into_draft(self.retry.max_retries)?, &*self.clock)?;
        self.repository.store(&message).await?;
        self.tracker
            .initialise(message.id(), message.recipients(), message.created_at())
            .await?;
        debug!(message_id = %message.id(), recipients = message.recipients().len(), "message created");
        Ok(message)
    }

    /// Returns a message by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MessageLifecycleError::Repository`] when lookup fails.
    pub async fn find(&self, id: MessageId) -> MessageLifecycleResult<Option<Message>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Queues a pending message for sending at `send_at`, or at its
    /// scheduled time when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`MessageLifecycleError::NotFound`] for unknown messages and
    /// [`MessageLifecycleError::Domain`] unless the message is pending.
    pub async fn queue(
        &self,
        id: MessageId,
        send_at: Option<DateTime<Utc>>,
    ) -> MessageLifecycleResult<Message> {
        let mut message = self.load(id).await?;
        let history_len = message.history().len();
        let at = send_at.unwrap_or_else(|| message.scheduled_send_time());
        message.queue(at, &*self.clock)?;
        self.save(&message, history_len).await
    }

    /// Queues a pending message after a person accepted a scheduling
    /// conflict, recording their reason.
    ///
    /// # Errors
    ///
    /// As for [`Self::queue`].
    pub async fn queue_with_override(
        &self,
        id: MessageId,
        send_at: DateTime<Utc>,
        reason: impl Into<String> + Send,
    ) -> MessageLifecycleResult<Message> {
        let mut message = self.load(id).await?;
        let history_len = message.history().len();
        let approver_reason = reason.into();
        message.record_cultural_override(approver_reason.clone(), &*self.clock);
        message.queue(send_at, &*self.clock)?;
        info!(message_id = %id, reason = %approver_reason, "cultural conflict overridden");
        self.save(&message, history_len).await
    }

    /// Cancels a pending or queued message.
    ///
    /// # Errors
    ///
    /// Returns [`MessageLifecycleError::Domain`] once sending has started.
    pub async fn cancel(
        &self,
        id: MessageId,
        reason: impl Into<String> + Send,
    ) -> MessageLifecycleResult<Message> {
        let mut message = self.load(id).await?;
        let history_len = message.history().len();
        message.cancel(reason, &*self.clock)?;
        self.save(&message, history_len).await
    }

    /// Changes a message's priority, clamping to the valid range.
    ///
    /// # Errors
    ///
    /// Returns [`MessageLifecycleError::NotFound`] or a repository error.
    pub async fn reprioritise(&self, id: MessageId, priority: u8) -> MessageLifecycleResult<Message> {
        let mut message = self.load(id).await?;
        let history_len = message.history().len();
        message.reprioritise(Priority::clamped(priority), &*self.clock);
        self.save(&message, history_len).await
    }

    /// Records confirmed delivery of a sent message.
    ///
    /// # Errors
    ///
    /// Returns [`MessageLifecycleError::Domain`] unless the message is sent.
    pub async fn mark_delivered(&self, id: MessageId) -> MessageLifecycleResult<Message> {
        let mut message = self.load(id).await?;
        let history_len = message.history().len();
        message.mark_delivered(&*self.clock)?;
        self.save(&message, history_len).await
    }

    /// Leases `id` to `worker` for one attempt.
    ///
    /// # Errors
    ///
    /// Returns [`MessageLifecycleError::LeaseLost`] when another worker won
    /// the race, or a domain error when the message is not claimable.
    pub async fn claim(&self, id: MessageId, worker: &WorkerId) -> MessageLifecycleResult<Claim> {
        let message = self.load(id).await?;
        self.claim_loaded(message, worker).await
    }

    /// Leases the highest-priority ready message to `worker`.
    ///
    /// Returns `Ok(None)` when nothing is ready or every candidate was taken
    /// by other workers.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the ready queue cannot be read.
    pub async fn claim_next(&self, worker: &WorkerId) -> MessageLifecycleResult<Option<Claim>> {
        let ready = self
            .repository
            .list_ready(self.clock.utc(), self.claim_batch)
            .await?;
        for message in ready {
            match self.claim_loaded(message, worker).await {
                Ok(claim) => return Ok(Some(claim)),
                Err(err) if err.is_contention() => {}
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    /// Dispatches a claimed message to every recipient still pending and
    /// records the result.
    ///
    /// Each dispatch is bounded by the configured timeout and by the time
    /// left on the lease; a timeout or an unreachable transport counts as a
    /// transient failure. Transient failures requeue the message with
    /// backoff until retries run out. The lease is checked again before
    /// every recipient, and the attempt stops as soon as it has lapsed so
    /// that a worker reclaiming the message never overlaps with this one.
    ///
    /// # Errors
    ///
    /// Returns [`MessageLifecycleError::LeaseLost`] when the lease lapsed or
    /// was reclaimed by another worker during the attempt.
    pub async fn attempt_delivery(&self, claim: Claim) -> MessageLifecycleResult<AttemptReport> {
        let Claim { mut message, lease } = claim;
        let history_len = message.history().len();
        let summary = self.dispatch_pending(&message, &lease).await?;

        let outcome = if let Some(failure) = summary.transient {
            self.fail(&mut message, &lease, failure)?
        } else if summary.any_sent {
            message.complete_sent(lease.token, summary.provider_message_id, &*self.clock)?;
            AttemptOutcome::Sent
        } else {
            let failure = summary
                .permanent
                .unwrap_or_else(|| DeliveryFailure::permanent("no deliverable recipients"));
            self.fail(&mut message, &lease, failure)?
        };

        let stored = self
            .save(&message, history_len)
            .await
            .map_err(|err| lost_on_conflict(err, message.id(), &lease.worker))?;
        Ok(AttemptReport {
            message: stored,
            outcome,
        })
    }

    /// Claims the next ready message for `worker` and attempts delivery.
    ///
    /// Returns `Ok(None)` when nothing was claimable.
    ///
    /// # Errors
    ///
    /// As for [`Self::claim_next`] and [`Self::attempt_delivery`].
    pub async fn process_next(
        &self,
        worker: &WorkerId,
    ) -> MessageLifecycleResult<Option<AttemptReport>> {
        let Some(claim) = self.claim_next(worker).await? else {
            return Ok(None);
        };
        self.attempt_delivery(claim).await.map(Some)
    }

    /// Records a recipient-level event reported by the transport.
    ///
    /// Out-of-order updates are logged and dropped; `Ok(None)` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`MessageLifecycleError::Recipients`] on storage failure.
    pub async fn record_recipient_event(
        &self,
        message_id: MessageId,
        recipient: &EmailAddress,
        update: RecipientUpdate,
    ) -> MessageLifecycleResult<Option<RecipientStatus>> {
        Ok(self.tracker.record(message_id, recipient, update).await?)
    }

    /// Returns message counts by status.
    ///
    /// # Errors
    ///
    /// Returns [`MessageLifecycleError::Repository`] when the counts cannot
    /// be read.
    pub async fn queue_stats(&self) -> MessageLifecycleResult<QueueStats> {
        Ok(self.repository.queue_stats().await?)
    }

    /// Returns per-state recipient counts for a message.
    ///
    /// # Errors
    ///
    /// Returns [`MessageLifecycleError::Recipients`] on storage failure.
    pub async fn recipient_summary(&self, id: MessageId) -> MessageLifecycleResult<RecipientSummary> {
        Ok(self.tracker.summary(id).await?)
    }

    async fn load(&self, id: MessageId) -> MessageLifecycleResult<Message> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(MessageLifecycleError::NotFound(id))
    }

    async fn save(&self, message: &Message, history_len: usize) -> MessageLifecycleResult<Message> {
        let stored = self.repository.update(message).await?;
        for transition in stored.history().iter().skip(history_len) {
            debug!(
                message_id = %stored.id(),
                from = %transition.from,
                to = %transition.to,
                "message transitioned"
            );
            self.events.publish(&DeliveryEvent::Transitioned {
                message_id: stored.id(),
                from: transition.from,
                to: transition.to,
                at: transition.at,
            });
        }
        Ok(stored)
    }

    async fn claim_loaded(
        &self,
        mut message: Message,
        worker: &WorkerId,
    ) -> MessageLifecycleResult<Claim> {
        let history_len = message.history().len();
        let lease = message.begin_attempt(worker.clone(), self.lease.lease_ttl(), &*self.clock)?;
        let stored = match self.save(&message, history_len).await {
            Ok(stored) => stored,
            Err(err) => {
                let mapped = lost_on_conflict(err, message.id(), worker);
                if let MessageLifecycleError::LeaseLost { .. } = mapped {
                    debug!(message_id = %message.id(), %worker, "lease race lost");
                    self.events.publish(&DeliveryEvent::LeaseLost {
                        message_id: message.id(),
                        worker: worker.clone(),
                    });
                }
                return Err(mapped);
            }
        };
        self.events.publish(&DeliveryEvent::LeaseAcquired {
            message_id: stored.id(),
            worker: worker.clone(),
            expires_at: lease.expires_at,
        });
        Ok(Claim {
            message: stored,
            lease,
        })
    }

    async fn dispatch_pending(
        &self,
        message: &Message,
        lease: &Lease,
    ) -> MessageLifecycleResult<DispatchSummary> {
        let records = self.tracker.list(message.id()).await?;
        let mut summary = DispatchSummary {
            any_sent: records.iter().any(|record| is_sent(record.state())),
            ..DispatchSummary::default()
        };
        let dispatch_timeout = self.lease.dispatch_timeout();

        for recipient in message.recipients() {
            let state = records
                .iter()
                .find(|record| record.recipient() == recipient)
                .map_or(RecipientDeliveryState::Pending, RecipientStatus::state);
            if state != RecipientDeliveryState::Pending {
                continue;
            }

            let started = self.clock.utc();
            if lease.is_expired(started) {
                debug!(
                    message_id = %message.id(),
                    worker = %lease.worker,
                    %recipient,
                    "lease lapsed mid-attempt"
                );
                self.events.publish(&DeliveryEvent::LeaseLost {
                    message_id: message.id(),
                    worker: lease.worker.clone(),
                });
                return Err(MessageLifecycleError::LeaseLost {
                    message_id: message.id(),
                    worker: lease.worker.clone(),
                });
            }
            let timeout = dispatch_timeout.min(lease.remaining(started));

            let dispatched =
                tokio::time::timeout(timeout, self.transport.dispatch(message, recipient)).await;
            let now = self.clock.utc();
            match dispatched {
                Err(_elapsed) => {
                    summary.note_transient(DeliveryFailure::timed_out(timeout.as_secs()));
                }
                Ok(Err(err)) => summary.note_transient(DeliveryFailure::transient(err.to_string())),
                Ok(Ok(DeliveryOutcome::Accepted {
                    provider_message_id,
                })) => {
                    self.tracker
                        .record(
                            message.id(),
                            recipient,
                            RecipientUpdate::new(RecipientDeliveryState::Sent, now),
                        )
                        .await?;
                    summary.any_sent = true;
                    if summary.provider_message_id.is_none() {
                        summary.provider_message_id = provider_message_id;
                    }
                }
                Ok(Ok(DeliveryOutcome::Rejected(failure))) if failure.is_transient() => {
                    summary.note_transient(failure);
                }
                Ok(Ok(DeliveryOutcome::Rejected(failure))) => {
                    self.tracker
                        .record(
                            message.id(),
                            recipient,
                            RecipientUpdate::failed(now, failure.reason.clone()),
                        )
                        .await?;
                    if summary.permanent.is_none() {
                        summary.permanent = Some(failure);
                    }
                }
            }
        }
        Ok(summary)
    }

    fn fail(
        &self,
        message: &mut Message,
        lease: &Lease,
        failure: DeliveryFailure,
    ) -> MessageLifecycleResult<AttemptOutcome> {
        let kind = failure.kind;
        let disposition = message.fail_attempt(lease.token, failure.clone(), &self.retry, &*self.clock)?;
        self.events.publish(&DeliveryEvent::AttemptFailed {
            message_id: message.id(),
            kind,
            retry_count: message.retry_count(),
            next_retry_at: message.next_retry_at(),
        });

        Ok(match disposition {
            RetryDisposition::RetryAt(retry_at) => {
                message.requeue(&*self.clock)?;
                info!(
                    message_id = %message.id(),
                    retry_count = message.retry_count(),
                    %retry_at,
                    reason = %failure.reason,
                    "message requeued for retry"
                );
                AttemptOutcome::RetryScheduled { retry_at }
            }
            RetryDisposition::Exhausted => {
                warn!(
                    message_id = %message.id(),
                    retry_count = message.retry_count(),
                    reason = %failure.reason,
                    "message failed after exhausting retries"
                );
                AttemptOutcome::Exhausted(failure)
            }
            RetryDisposition::Permanent => {
                warn!(
                    message_id = %message.id(),
                    reason = %failure.reason,
                    "message failed permanently"
                );
                AttemptOutcome::Rejected(failure)
            }
        })
    }
}

#[derive(Debug, Default)]
struct DispatchSummary {
    any_sent: bool,
    provider_message_id: Option<String>,
    transient: Option<DeliveryFailure>,
    permanent: Option<DeliveryFailure>,
}

impl DispatchSummary {
    fn note_transient(&mut self, failure: DeliveryFailure) {
        if self.transient.is_none() {
            self.transient = Some(failure);
        }
    }
}

const fn is_sent(state: RecipientDeliveryState) -> bool {
    matches!(
        state,
        RecipientDeliveryState::Sent
            | RecipientDeliveryState::Delivered
            | RecipientDeliveryState::Opened
            | RecipientDeliveryState::Clicked
    )
}

fn lost_on_conflict(
    err: MessageLifecycleError,
    message_id: MessageId,
    worker: &WorkerId,
) -> MessageLifecycleError {
    match err {
        MessageLifecycleError::Repository(MessageRepositoryError::VersionConflict { .. }) => {
            MessageLifecycleError::LeaseLost {
                message_id,
                worker: worker.clone(),
            }
        }
        other => other,
    }
}
