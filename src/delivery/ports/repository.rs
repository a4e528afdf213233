//! Repository port for message persistence and ready-queue lookup.

use crate::delivery::domain::{Message, MessageId, QueueStats};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for message repository operations.
pub type MessageRepositoryResult<T> = Result<T, MessageRepositoryError>;

/// Message persistence contract.
///
/// Updates use optimistic concurrency: a write succeeds only when the stored
/// version equals the version carried by the message, and the stored copy is
/// given the next version. This is what makes lease acquisition atomic
/// across workers.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Stores a new message.
    ///
    /// # Errors
    ///
    /// Returns [`MessageRepositoryError::DuplicateMessage`] when the ID
    /// already exists.
    async fn store(&self, message: &Message) -> MessageRepositoryResult<()>;

    /// Persists changes to an existing message and returns the stored copy
    /// with its new version.
    ///
    /// # Errors
    ///
    /// Returns [`MessageRepositoryError::NotFound`] when the message does not
    /// exist, or [`MessageRepositoryError::VersionConflict`] when another
    /// writer updated it first.
    async fn update(&self, message: &Message) -> MessageRepositoryResult<Message>;

    /// Finds a message by identifier.
    ///
    /// Returns `None` when the message does not exist.
    async fn find_by_id(&self, id: MessageId) -> MessageRepositoryResult<Option<Message>>;

    /// Returns up to `limit` messages claimable at `now`.
    ///
    /// Ordering is priority descending, then ready time ascending, then
    /// creation time ascending. Sending messages whose lease has expired are
    /// included.
    async fn list_ready(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> MessageRepositoryResult<Vec<Message>>;

    /// Returns message counts by status.
    async fn queue_stats(&self) -> MessageRepositoryResult<QueueStats>;
}

/// Errors returned by message repository implementations.
#[derive(Debug, Clone, Error)]
pub enum MessageRepositoryError {
    /// A message with the same identifier already exists.
    #[error("duplicate message identifier: {0}")]
    DuplicateMessage(MessageId),

    /// The message was not found.
    #[error("message not found: {0}")]
    NotFound(MessageId),

    /// The stored version moved on since the message was read.
    #[error("version conflict on message {id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// Message identifier.
        id: MessageId,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl MessageRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
