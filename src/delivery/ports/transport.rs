//! Transport port performing the actual send.

use crate::delivery::domain::{DeliveryOutcome, EmailAddress, Message};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Sends one message to one recipient through an outbound provider.
///
/// A provider response, including a rejection, is an `Ok` outcome; `Err` is
/// reserved for failing to reach the provider at all and is treated as a
/// transient failure.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Dispatches `message` to `recipient`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the provider cannot be reached.
    async fn dispatch(
        &self,
        message: &Message,
        recipient: &EmailAddress,
    ) -> TransportResult<DeliveryOutcome>;
}

/// Errors returned when the provider cannot be reached.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The provider is unavailable.
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    /// Lower-level I/O or client failure.
    #[error("transport failure: {0}")]
    Client(Arc<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Wraps a client error.
    pub fn client(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Client(Arc::new(err))
    }
}
