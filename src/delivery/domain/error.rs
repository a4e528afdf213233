//! Error types for delivery domain validation and lifecycle guards.

use super::{EmailAddress, MessageId, MessageStatus, RecipientDeliveryState};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned by delivery domain values and transitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryDomainError {
    /// The address is not of the form `local@domain`.
    #[error("invalid email address '{0}'")]
    InvalidAddress(String),

    /// The payload reference is empty after trimming.
    #[error("payload reference must not be empty")]
    EmptyPayloadRef,

    /// The worker identifier is empty after trimming.
    #[error("worker identifier must not be empty")]
    EmptyWorkerId,

    /// A message must have at least one recipient.
    #[error("message must have at least one recipient")]
    NoRecipients,

    /// The same recipient appears twice.
    #[error("duplicate recipient {0}")]
    DuplicateRecipient(EmailAddress),

    /// Priority is outside `1..=10`.
    #[error("invalid priority {0}, expected 1..=10")]
    InvalidPriority(u8),

    /// Retry ceiling is outside `1..=10`.
    #[error("invalid max retries {0}, expected 1..=10")]
    InvalidMaxRetries(u32),

    /// The requested lifecycle transition is not permitted.
    #[error("message {message_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Message identifier.
        message_id: MessageId,
        /// Current status.
        from: MessageStatus,
        /// Requested status.
        to: MessageStatus,
    },

    /// The message is not yet due for an attempt.
    #[error("message {message_id} is not ready until {ready_at}")]
    NotReady {
        /// Message identifier.
        message_id: MessageId,
        /// Earliest instant the message becomes ready.
        ready_at: DateTime<Utc>,
    },

    /// Another worker holds a live lease on the message.
    #[error("message {message_id} is leased until {expires_at}")]
    LeaseHeld {
        /// Message identifier.
        message_id: MessageId,
        /// Expiry of the live lease.
        expires_at: DateTime<Utc>,
    },

    /// The caller's lease token does not match the message's lease.
    #[error("lease on message {0} is no longer held by the caller")]
    LeaseMismatch(MessageId),

    /// A recipient update would move the recipient backwards or sideways.
    #[error("recipient {recipient} cannot move from {current} to {attempted}")]
    StaleRecipientUpdate {
        /// Recipient address.
        recipient: EmailAddress,
        /// Recorded state.
        current: RecipientDeliveryState,
        /// Rejected state.
        attempted: RecipientDeliveryState,
    },
}

/// Error returned while parsing message statuses from storage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown message status: {0}")]
pub struct ParseMessageStatusError(pub String);

/// Error returned while parsing recipient delivery states.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown recipient delivery state: {0}")]
pub struct ParseRecipientStateError(pub String);

/// Error returned while parsing failure kinds.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown failure kind: {0}")]
pub struct ParseFailureKindError(pub String);
