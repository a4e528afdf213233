//! Event sink that writes delivery events to the log.

use tracing::{debug, info, warn};

use crate::delivery::{domain::DeliveryEvent, ports::DeliveryEventSink};

/// Logs every event through `tracing`, with the event body as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl TracingEventSink {
    /// Creates the sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DeliveryEventSink for TracingEventSink {
    fn publish(&self, event: &DeliveryEvent) {
        let body = serde_json::to_string(event).unwrap_or_default();
        let message_id = event.message_id();
        match event {
            DeliveryEvent::RecipientUpdateRejected { .. }
            | DeliveryEvent::UnknownRecipientUpdate { .. } => {
                warn!(%message_id, event = event.name(), %body, "delivery event");
            }
            DeliveryEvent::AttemptFailed { .. } => {
                info!(%message_id, event = event.name(), %body, "delivery event");
            }
            _ => debug!(%message_id, event = event.name(), %body, "delivery event"),
        }
    }
}
