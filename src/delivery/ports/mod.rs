//! Port contracts for message delivery.
//!
//! Ports define infrastructure-agnostic interfaces used by delivery
//! services.

pub mod events;
pub mod recipient_store;
pub mod repository;
pub mod transport;

pub use events::DeliveryEventSink;
pub use recipient_store::{RecipientStatusStore, RecipientStoreError, RecipientStoreResult};
pub use repository::{MessageRepository, MessageRepositoryError, MessageRepositoryResult};
pub use transport::{MessageTransport, TransportError, TransportResult};
