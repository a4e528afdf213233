//! Send requests that pass through cultural scheduling before queueing.

use crate::delivery::{
    domain::{CulturalContext, Message, MessageId},
    ports::{MessageRepository, MessageTransport, RecipientStatusStore},
};
use crate::scheduling::{
    ports::{ObservanceCalendar, Translator},
    services::{ScheduleDecision, ScheduleRequest, SchedulingError, TimingScheduler},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use super::lifecycle::{CreateMessageRequest, MessageLifecycleError, MessageLifecycleService};

/// What happened to a send request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The message is queued for the approved time.
    Queued {
        /// Stored message.
        message: Message,
        /// Scheduling decision applied.
        decision: ScheduleDecision,
    },
    /// The conflict is too severe to resolve automatically; the message
    /// stays pending until someone confirms a time.
    AwaitingConfirmation {
        /// Stored message.
        message: Message,
        /// Scheduling decision needing review.
        decision: ScheduleDecision,
    },
}

impl SendOutcome {
    /// Returns the stored message.
    #[must_use]
    pub const fn message(&self) -> &Message {
        match self {
            Self::Queued { message, .. } | Self::AwaitingConfirmation { message, .. } => message,
        }
    }

    /// Returns the scheduling decision.
    #[must_use]
    pub const fn decision(&self) -> &ScheduleDecision {
        match self {
            Self::Queued { decision, .. } | Self::AwaitingConfirmation { decision, .. } => decision,
        }
    }
}

/// Errors returned by [`SendRequestService`].
#[derive(Debug, Error)]
pub enum SendRequestError {
    /// Scheduling failed.
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
    /// Creating or queueing the message failed.
    #[error(transparent)]
    Lifecycle(#[from] MessageLifecycleError),
}

/// Result type for send request operations.
pub type SendRequestResult<T> = Result<T, SendRequestError>;

/// Front door for sending: checks the requested time against observance
/// calendars, then creates and queues the message.
///
/// Conflicts that cannot be resolved automatically leave the message
/// pending; it is only queued once [`Self::confirm_send`] is called.
pub struct SendRequestService<Cal, Tr, R, S, T, C>
where
    Cal: ObservanceCalendar,
    Tr: Translator,
    R: MessageRepository,
    S: RecipientStatusStore,
    T: MessageTransport,
    C: Clock + Send + Sync,
{
    scheduler: Arc<TimingScheduler<Cal, Tr>>,
    lifecycle: Arc<MessageLifecycleService<R, S, T, C>>,
}

impl<Cal, Tr, R, S, T, C> SendRequestService<Cal, Tr, R, S, T, C>
where
    Cal: ObservanceCalendar,
    Tr: Translator,
    R: MessageRepository,
    S: RecipientStatusStore,
    T: MessageTransport,
    C: Clock + Send + Sync,
{
    /// Creates the service.
    #[must_use]
    pub const fn new(
        scheduler: Arc<TimingScheduler<Cal, Tr>>,
        lifecycle: Arc<MessageLifecycleService<R, S, T, C>>,
    ) -> Self {
        Self {
            scheduler,
            lifecycle,
        }
    }

    /// Schedules, creates and, when allowed, queues a message.
    ///
    /// The message's send time is the approved time and its cultural
    /// context records the decision.
    ///
    /// # Errors
    ///
    /// Returns [`SendRequestError::Scheduling`] when the calendar cannot be
    /// read, or [`SendRequestError::Lifecycle`] when the message is invalid
    /// or cannot be stored.
    pub async fn request_send(
        &self,
        message: CreateMessageRequest,
        audience: &ScheduleRequest,
    ) -> SendRequestResult<SendOutcome> {
        let decision = self.scheduler.schedule(audience).await?;
        let context = CulturalContext {
            requested_time: decision.requested_time,
            approved_time: decision.approved_time,
            severity: decision.conflict.severity,
            strategy: decision.conflict.strategy,
            conflicting_observance: decision.conflict.conflicting_observance.clone(),
        };
        let created = self
            .lifecycle
            .create(
                message
                    .with_scheduled_send_time(decision.approved_time)
                    .with_cultural_context(context),
            )
            .await?;

        if decision.requires_confirmation {
            info!(
                message_id = %created.id(),
                severity = %decision.conflict.severity,
                strategy = %decision.conflict.strategy,
                "send held for confirmation"
            );
            return Ok(SendOutcome::AwaitingConfirmation {
                message: created,
                decision,
            });
        }

        let queued = self
            .lifecycle
            .queue(created.id(), Some(decision.approved_time))
            .await?;
        Ok(SendOutcome::Queued {
            message: queued,
            decision,
        })
    }

    /// Queues a held message at `send_at` on a person's authority.
    ///
    /// # Errors
    ///
    /// Returns [`SendRequestError::Lifecycle`] when the message is missing
    /// or no longer pending.
    pub async fn confirm_send(
        &self,
        id: MessageId,
        send_at: DateTime<Utc>,
        approver_reason: impl Into<String> + Send,
    ) -> SendRequestResult<Message> {
        Ok(self
            .lifecycle
            .queue_with_override(id, send_at, approver_reason)
            .await?)
    }
}
