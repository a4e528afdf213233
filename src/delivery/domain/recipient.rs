//! Per-recipient delivery status.

use super::{DeliveryDomainError, EmailAddress, MessageId, ParseRecipientStateError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery progress for one recipient of one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientDeliveryState {
    /// Not yet accepted by the transport.
    Pending,
    /// Accepted by the transport.
    Sent,
    /// Confirmed delivered to the mailbox.
    Delivered,
    /// Opened by the recipient.
    Opened,
    /// A link in the message was followed.
    Clicked,
    /// Permanently failed for this recipient.
    Failed,
}

impl RecipientDeliveryState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Opened => "opened",
            Self::Clicked => "clicked",
            Self::Failed => "failed",
        }
    }

    /// Returns whether a recipient may move from `self` to `target`.
    ///
    /// Progress only moves forward: `Pending -> Sent -> Delivered ->
    /// Opened -> Clicked`, with `Delivered -> Clicked` allowed for clients
    /// that suppress open tracking, and `Failed` reachable before delivery.
    #[must_use]
    pub const fn can_advance_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Sent | Self::Failed)
                | (Self::Sent, Self::Delivered | Self::Failed)
                | (Self::Delivered, Self::Opened | Self::Clicked)
                | (Self::Opened, Self::Clicked)
        )
    }

    /// Returns whether the recipient counts as delivered.
    #[must_use]
    pub const fn is_delivered(self) -> bool {
        matches!(self, Self::Delivered | Self::Opened | Self::Clicked)
    }
}

impl fmt::Display for RecipientDeliveryState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RecipientDeliveryState {
    type Error = ParseRecipientStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "opened" => Ok(Self::Opened),
            "clicked" => Ok(Self::Clicked),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseRecipientStateError(value.to_owned())),
        }
    }
}

/// An observed change to one recipient's delivery state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientUpdate {
    /// New state.
    pub state: RecipientDeliveryState,
    /// Observation time.
    pub at: DateTime<Utc>,
    /// Failure detail for [`RecipientDeliveryState::Failed`].
    pub error: Option<String>,
}

impl RecipientUpdate {
    /// Creates an update without error detail.
    #[must_use]
    pub const fn new(state: RecipientDeliveryState, at: DateTime<Utc>) -> Self {
        Self {
            state,
            at,
            error: None,
        }
    }

    /// Creates a failure update.
    #[must_use]
    pub fn failed(at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            state: RecipientDeliveryState::Failed,
            at,
            error: Some(error.into()),
        }
    }
}

/// Delivery record for one recipient of one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientStatus {
    message_id: MessageId,
    recipient: EmailAddress,
    state: RecipientDeliveryState,
    sent_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    opened_at: Option<DateTime<Utc>>,
    clicked_at: Option<DateTime<Utc>>,
    failed_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
    updated_at: DateTime<Utc>,
}

impl RecipientStatus {
    /// Creates a pending record.
    #[must_use]
    pub const fn pending(message_id: MessageId, recipient: EmailAddress, at: DateTime<Utc>) -> Self {
        Self {
            message_id,
            recipient,
            state: RecipientDeliveryState::Pending,
            sent_at: None,
            delivered_at: None,
            opened_at: None,
            clicked_at: None,
            failed_at: None,
            error_message: None,
            updated_at: at,
        }
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// Returns the recipient address.
    #[must_use]
    pub const fn recipient(&self) -> &EmailAddress {
        &self.recipient
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> RecipientDeliveryState {
        self.state
    }

    /// Returns when the transport accepted the message.
    #[must_use]
    pub const fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.sent_at
    }

    /// Returns when delivery was confirmed.
    #[must_use]
    pub const fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    /// Returns when the message was opened.
    #[must_use]
    pub const fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.opened_at
    }

    /// Returns when a link was followed.
    #[must_use]
    pub const fn clicked_at(&self) -> Option<DateTime<Utc>> {
        self.clicked_at
    }

    /// Returns when delivery failed.
    #[must_use]
    pub const fn failed_at(&self) -> Option<DateTime<Utc>> {
        self.failed_at
    }

    /// Returns the failure detail.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns the time of the latest applied update.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies `update` when it moves the recipient forward.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDomainError::StaleRecipientUpdate`] for backward or
    /// repeated states; the record is left unchanged.
    pub fn advance(&mut self, update: RecipientUpdate) -> Result<(), DeliveryDomainError> {
        if !self.state.can_advance_to(update.state) {
            return Err(DeliveryDomainError::StaleRecipientUpdate {
                recipient: self.recipient.clone(),
                current: self.state,
                attempted: update.state,
            });
        }
        let at = update.at;
        match update.state {
            RecipientDeliveryState::Pending => {}
            RecipientDeliveryState::Sent => self.sent_at = Some(at),
            RecipientDeliveryState::Delivered => self.delivered_at = Some(at),
            RecipientDeliveryState::Opened => self.opened_at = Some(at),
            RecipientDeliveryState::Clicked => self.clicked_at = Some(at),
            RecipientDeliveryState::Failed => {
                self.failed_at = Some(at);
                self.error_message = update.error;
            }
        }
        self.state = update.state;
        self.updated_at = at;
        Ok(())
    }
}
