//! Sharded in-memory store for per-recipient delivery records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use crate::delivery::{
    domain::{EmailAddress, MessageId, RecipientStatus, RecipientUpdate},
    ports::{RecipientStatusStore, RecipientStoreError, RecipientStoreResult},
};

type RecipientKey = (MessageId, EmailAddress);

/// In-memory recipient store backed by a [`DashMap`].
///
/// Each entry is locked independently, so updates to different recipients
/// never contend and updates to the same recipient apply one at a time.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecipientStatusStore {
    records: Arc<DashMap<RecipientKey, RecipientStatus>>,
}

impl InMemoryRecipientStatusStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of tracked recipients across all messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecipientStatusStore for InMemoryRecipientStatusStore {
    async fn initialise(
        &self,
        message_id: MessageId,
        recipients: &[EmailAddress],
        at: DateTime<Utc>,
    ) -> RecipientStoreResult<()> {
        for recipient in recipients {
            self.records
                .entry((message_id, recipient.clone()))
                .or_insert_with(|| RecipientStatus::pending(message_id, recipient.clone(), at));
        }
        Ok(())
    }

    async fn apply(
        &self,
        message_id: MessageId,
        recipient: &EmailAddress,
        update: RecipientUpdate,
    ) -> RecipientStoreResult<RecipientStatus> {
        let mut entry = self
            .records
            .get_mut(&(message_id, recipient.clone()))
            .ok_or_else(|| RecipientStoreError::UnknownRecipient {
                message_id,
                recipient: recipient.clone(),
            })?;
        entry.advance(update)?;
        Ok(entry.clone())
    }

    async fn find(
        &self,
        message_id: MessageId,
        recipient: &EmailAddress,
    ) -> RecipientStoreResult<Option<RecipientStatus>> {
        Ok(self
            .records
            .get(&(message_id, recipient.clone()))
            .map(|entry| entry.value().clone()))
    }

    async fn list_for_message(
        &self,
        message_id: MessageId,
    ) -> RecipientStoreResult<Vec<RecipientStatus>> {
        let mut statuses: Vec<RecipientStatus> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == message_id)
            .map(|entry| entry.value().clone())
            .collect();
        statuses.sort_by(|left, right| left.recipient().cmp(right.recipient()));
        Ok(statuses)
    }
}
