//! Delivery failure classification and transport outcomes.

use super::ParseFailureKindError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Timeouts, rate limits, temporary rejections.
    Transient,
    /// Invalid addresses, content rejections, blocked senders.
    Permanent,
}

impl FailureKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Permanent => "permanent",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for FailureKind {
    type Error = ParseFailureKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "transient" => Ok(Self::Transient),
            "permanent" => Ok(Self::Permanent),
            _ => Err(ParseFailureKindError(value.to_owned())),
        }
    }
}

/// A classified delivery failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFailure {
    /// Failure classification.
    pub kind: FailureKind,
    /// Provider or engine supplied reason.
    pub reason: String,
}

impl DeliveryFailure {
    /// Creates a transient failure.
    #[must_use]
    pub fn transient(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            reason: reason.into(),
        }
    }

    /// Creates a permanent failure.
    #[must_use]
    pub fn permanent(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            reason: reason.into(),
        }
    }

    /// Creates the transient failure recorded when dispatch exceeds its
    /// deadline.
    #[must_use]
    pub fn timed_out(after_secs: u64) -> Self {
        Self::transient(format!("dispatch timed out after {after_secs}s"))
    }

    /// Returns whether the failure may be retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.kind, FailureKind::Transient)
    }
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} failure: {}", self.kind, self.reason)
    }
}

/// Response of the transport to a single dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// The transport accepted the message for the recipient.
    Accepted {
        /// Provider-side identifier, when returned.
        provider_message_id: Option<String>,
    },
    /// The transport refused the message for the recipient.
    Rejected(DeliveryFailure),
}

impl DeliveryOutcome {
    /// Creates an acceptance without a provider identifier.
    #[must_use]
    pub const fn accepted() -> Self {
        Self::Accepted {
            provider_message_id: None,
        }
    }
}
