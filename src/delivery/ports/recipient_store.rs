//! Storage port for per-recipient delivery records.

use crate::delivery::domain::{
    DeliveryDomainError, EmailAddress, MessageId, RecipientStatus, RecipientUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for recipient store operations.
pub type RecipientStoreResult<T> = Result<T, RecipientStoreError>;

/// Per-recipient record storage.
///
/// Updates for one recipient are serialised; updates for different
/// recipients may proceed concurrently.
#[async_trait]
pub trait RecipientStatusStore: Send + Sync {
    /// Creates pending records for any of `recipients` not yet tracked.
    ///
    /// # Errors
    ///
    /// Returns [`RecipientStoreError::Persistence`] on storage failure.
    async fn initialise(
        &self,
        message_id: MessageId,
        recipients: &[EmailAddress],
        at: DateTime<Utc>,
    ) -> RecipientStoreResult<()>;

    /// Applies `update` atomically and returns the new record.
    ///
    /// Only recipients created by [`Self::initialise`] can be updated.
    ///
    /// # Errors
    ///
    /// Returns [`RecipientStoreError::UnknownRecipient`] when no record
    /// exists for the pair, [`RecipientStoreError::Rejected`] when the update
    /// would move the recipient backwards, or
    /// [`RecipientStoreError::Persistence`] on storage failure.
    async fn apply(
        &self,
        message_id: MessageId,
        recipient: &EmailAddress,
        update: RecipientUpdate,
    ) -> RecipientStoreResult<RecipientStatus>;

    /// Returns the record for one recipient.
    async fn find(
        &self,
        message_id: MessageId,
        recipient: &EmailAddress,
    ) -> RecipientStoreResult<Option<RecipientStatus>>;

    /// Returns every record for a message, ordered by recipient address.
    async fn list_for_message(
        &self,
        message_id: MessageId,
    ) -> RecipientStoreResult<Vec<RecipientStatus>>;
}

/// Errors returned by recipient store implementations.
#[derive(Debug, Clone, Error)]
pub enum RecipientStoreError {
    /// The update was out of order.
    #[error(transparent)]
    Rejected(#[from] DeliveryDomainError),

    /// No record exists for the message and recipient.
    #[error("recipient {recipient} is not tracked for message {message_id}")]
    UnknownRecipient {
        /// Message identifier.
        message_id: MessageId,
        /// Unrecognised address.
        recipient: EmailAddress,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RecipientStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
