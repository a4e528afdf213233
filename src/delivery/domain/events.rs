//! Events emitted as messages and recipients progress.

use super::{
    EmailAddress, FailureKind, MessageId, MessageStatus, RecipientDeliveryState, WorkerId,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Observable delivery event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DeliveryEvent {
    /// A message changed status.
    Transitioned {
        /// Message identifier.
        message_id: MessageId,
        /// Previous status.
        from: MessageStatus,
        /// New status.
        to: MessageStatus,
        /// Transition time.
        at: DateTime<Utc>,
    },
    /// A worker obtained a lease.
    LeaseAcquired {
        /// Message identifier.
        message_id: MessageId,
        /// Leasing worker.
        worker: WorkerId,
        /// Lease expiry.
        expires_at: DateTime<Utc>,
    },
    /// A worker lost a race for a message.
    LeaseLost {
        /// Message identifier.
        message_id: MessageId,
        /// Worker that lost.
        worker: WorkerId,
    },
    /// An attempt failed.
    AttemptFailed {
        /// Message identifier.
        message_id: MessageId,
        /// Failure classification.
        kind: FailureKind,
        /// Failed attempts so far.
        retry_count: u32,
        /// Scheduled retry, if any.
        next_retry_at: Option<DateTime<Utc>>,
    },
    /// A recipient advanced.
    RecipientUpdated {
        /// Message identifier.
        message_id: MessageId,
        /// Recipient address.
        recipient: EmailAddress,
        /// New state.
        state: RecipientDeliveryState,
        /// Observation time.
        at: DateTime<Utc>,
    },
    /// A recipient update arrived out of order and was dropped.
    RecipientUpdateRejected {
        /// Message identifier.
        message_id: MessageId,
        /// Recipient address.
        recipient: EmailAddress,
        /// Recorded state.
        current: RecipientDeliveryState,
        /// Rejected state.
        attempted: RecipientDeliveryState,
    },
    /// An update named a recipient the message was never sent to.
    UnknownRecipientUpdate {
        /// Message identifier.
        message_id: MessageId,
        /// Unrecognised address.
        recipient: EmailAddress,
        /// Reported state.
        attempted: RecipientDeliveryState,
    },
}

impl DeliveryEvent {
    /// Returns the message the event concerns.
    #[must_use]
    pub const fn message_id(&self) -> MessageId {
        match self {
            Self::Transitioned { message_id, .. }
            | Self::LeaseAcquired { message_id, .. }
            | Self::LeaseLost { message_id, .. }
            | Self::AttemptFailed { message_id, .. }
            | Self::RecipientUpdated { message_id, .. }
            | Self::RecipientUpdateRejected { message_id, .. }
            | Self::UnknownRecipientUpdate { message_id, .. } => *message_id,
        }
    }

    /// Returns the snake-case event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Transitioned { .. } => "transitioned",
            Self::LeaseAcquired { .. } => "lease_acquired",
            Self::LeaseLost { .. } => "lease_lost",
            Self::AttemptFailed { .. } => "attempt_failed",
            Self::RecipientUpdated { .. } => "recipient_updated",
            Self::RecipientUpdateRejected { .. } => "recipient_update_rejected",
            Self::UnknownRecipientUpdate { .. } => "unknown_recipient_update",
        }
    }
}
