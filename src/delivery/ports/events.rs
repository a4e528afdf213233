//! Sink port for delivery events.

use crate::delivery::domain::DeliveryEvent;

/// Receives delivery events.
///
/// Publishing must not fail the operation that produced the event.
pub trait DeliveryEventSink: Send + Sync {
    /// Publishes one event.
    fn publish(&self, event: &DeliveryEvent);
}
