//! Per-recipient delivery tracking.

use crate::delivery::{
    domain::{
        DeliveryDomainError, DeliveryEvent, EmailAddress, MessageId, RecipientStatus,
        RecipientSummary, RecipientUpdate,
    },
    ports::{DeliveryEventSink, RecipientStatusStore, RecipientStoreError, RecipientStoreResult},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Records recipient-level progress reported by the transport.
///
/// Recipients only move forward. A stale or repeated update, or one naming
/// a recipient the message does not have, is logged and published as an
/// event but otherwise ignored.
pub struct RecipientStatusTracker<S>
where
    S: RecipientStatusStore,
{
    store: Arc<S>,
    events: Arc<dyn DeliveryEventSink>,
}

impl<S> RecipientStatusTracker<S>
where
    S: RecipientStatusStore,
{
    /// Creates a tracker over `store` publishing to `events`.
    #[must_use]
    pub fn new(store: Arc<S>, events: Arc<dyn DeliveryEventSink>) -> Self {
        Self { store, events }
    }

    /// Routes events to `events`.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn DeliveryEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Creates pending records for a new message.
    ///
    /// # Errors
    ///
    /// Returns [`RecipientStoreError::Persistence`] on storage failure.
    pub async fn initialise(
        &self,
        message_id: MessageId,
        recipients: &[EmailAddress],
        at: DateTime<Utc>,
    ) -> RecipientStoreResult<()> {
        self.store.initialise(message_id, recipients, at).await
    }

    /// Applies `update` to one recipient.
    ///
    /// Returns the new record, or `None` when the update was stale or named
    /// an untracked recipient and was dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RecipientStoreError::Persistence`] on storage failure.
    pub async fn record(
        &self,
        message_id: MessageId,
        recipient: &EmailAddress,
        update: RecipientUpdate,
    ) -> RecipientStoreResult<Option<RecipientStatus>> {
        let state = update.state;
        let at = update.at;
        match self.store.apply(message_id, recipient, update).await {
            Ok(status) => {
                debug!(%message_id, %recipient, %state, "recipient updated");
                self.events.publish(&DeliveryEvent::RecipientUpdated {
                    message_id,
                    recipient: recipient.clone(),
                    state,
                    at,
                });
                Ok(Some(status))
            }
            Err(RecipientStoreError::Rejected(DeliveryDomainError::StaleRecipientUpdate {
                current,
                attempted,
                ..
            })) => {
                warn!(%message_id, %recipient, %current, %attempted, "stale recipient update ignored");
                self.events.publish(&DeliveryEvent::RecipientUpdateRejected {
                    message_id,
                    recipient: recipient.clone(),
                    current,
                    attempted,
                });
                Ok(None)
            }
            Err(RecipientStoreError::UnknownRecipient { .. }) => {
                warn!(%message_id, %recipient, %state, "update for untracked recipient ignored");
                self.events.publish(&DeliveryEvent::UnknownRecipientUpdate {
                    message_id,
                    recipient: recipient.clone(),
                    attempted: state,
                });
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Returns one recipient's record.
    ///
    /// # Errors
    ///
    /// Returns [`RecipientStoreError::Persistence`] on storage failure.
    pub async fn find(
        &self,
        message_id: MessageId,
        recipient: &EmailAddress,
    ) -> RecipientStoreResult<Option<RecipientStatus>> {
        self.store.find(message_id, recipient).await
    }

    /// Returns every recipient record of a message.
    ///
    /// # Errors
    ///
    /// Returns [`RecipientStoreError::Persistence`] on storage failure.
    pub async fn list(&self, message_id: MessageId) -> RecipientStoreResult<Vec<RecipientStatus>> {
        self.store.list_for_message(message_id).await
    }

    /// Returns per-state counts and rates for a message.
    ///
    /// # Errors
    ///
    /// Returns [`RecipientStoreError::Persistence`] on storage failure.
    pub async fn summary(&self, message_id: MessageId) -> RecipientStoreResult<RecipientSummary> {
        let statuses = self.store.list_for_message(message_id).await?;
        Ok(RecipientSummary::from_statuses(message_id, &statuses))
    }
}
