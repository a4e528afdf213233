//! Message lifecycle status.

use super::ParseMessageStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a message.
///
/// ```text
/// Pending -> Queued -> Sending -> Sent -> Delivered
///    |         |          |
///    |         |          +-> Failed --(retryable)--> Queued
///    +---------+-> Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Created, awaiting a send time.
    Pending,
    /// Waiting for a worker.
    Queued,
    /// A worker holds a lease and is dispatching.
    Sending,
    /// Accepted by the transport for at least one recipient.
    Sent,
    /// Confirmed delivered.
    Delivered,
    /// The last attempt failed.
    Failed,
    /// Withdrawn before any attempt.
    Cancelled,
}

impl MessageStatus {
    /// Every status in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Queued,
        Self::Sending,
        Self::Sent,
        Self::Delivered,
        Self::Failed,
        Self::Cancelled,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Queued => "queued",
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns whether the edge `self -> target` exists in the state graph.
    ///
    /// `Failed -> Queued` additionally requires the failure to be retryable,
    /// which the message aggregate checks.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Queued | Self::Cancelled)
                | (Self::Queued, Self::Sending | Self::Cancelled)
                | (Self::Sending, Self::Sent | Self::Failed)
                | (Self::Sent, Self::Delivered)
                | (Self::Failed, Self::Queued)
        )
    }

    /// Returns whether no further transition is possible regardless of
    /// retry state.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MessageStatus {
    type Error = ParseMessageStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "queued" => Ok(Self::Queued),
            "sending" => Ok(Self::Sending),
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseMessageStatusError(value.to_owned())),
        }
    }
}
