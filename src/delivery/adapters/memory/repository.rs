//! In-memory message repository with versioned updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::delivery::{
    domain::{Message, MessageId, QueueStats},
    ports::{MessageRepository, MessageRepositoryError, MessageRepositoryResult},
};

/// Thread-safe in-memory message repository.
///
/// The write lock makes each compare-and-swap in [`MessageRepository::update`]
/// atomic, so concurrent claims on one message resolve to a single winner.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageRepository {
    messages: Arc<RwLock<HashMap<MessageId, Message>>>,
}

impl InMemoryMessageRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored messages, or `0` if the lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.read().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Returns `true` if no messages are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned(err: &impl std::fmt::Display) -> MessageRepositoryError {
    MessageRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn store(&self, message: &Message) -> MessageRepositoryResult<()> {
        let mut guard = self.messages.write().map_err(|err| poisoned(&err))?;
        if guard.contains_key(&message.id()) {
            return Err(MessageRepositoryError::DuplicateMessage(message.id()));
        }
        guard.insert(message.id(), message.clone());
        Ok(())
    }

    async fn update(&self, message: &Message) -> MessageRepositoryResult<Message> {
        let mut guard = self.messages.write().map_err(|err| poisoned(&err))?;
        let stored = guard
            .get_mut(&message.id())
            .ok_or(MessageRepositoryError::NotFound(message.id()))?;

        if stored.version() != message.version() {
            return Err(MessageRepositoryError::VersionConflict {
                id: message.id(),
                expected: message.version(),
                actual: stored.version(),
            });
        }

        let next = message.clone().with_version(message.version().saturating_add(1));
        *stored = next.clone();
        Ok(next)
    }

    async fn find_by_id(&self, id: MessageId) -> MessageRepositoryResult<Option<Message>> {
        let guard = self.messages.read().map_err(|err| poisoned(&err))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_ready(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> MessageRepositoryResult<Vec<Message>> {
        let guard = self.messages.read().map_err(|err| poisoned(&err))?;
        let mut ready: Vec<Message> = guard
            .values()
            .filter(|message| message.is_claimable(now))
            .cloned()
            .collect();

        ready.sort_by_key(|message| {
            (
                Reverse(message.priority()),
                message.ready_at(),
                message.created_at(),
                message.id(),
            )
        });
        ready.truncate(limit);
        Ok(ready)
    }

    async fn queue_stats(&self) -> MessageRepositoryResult<QueueStats> {
        let guard = self.messages.read().map_err(|err| poisoned(&err))?;
        Ok(QueueStats::from_statuses(
            guard.values().map(Message::status),
        ))
    }
}
