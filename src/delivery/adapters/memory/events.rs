//! Event sink that keeps everything it receives.

use std::sync::{Arc, Mutex};

use crate::delivery::{domain::DeliveryEvent, ports::DeliveryEventSink};

/// Collects published events for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingEventSink {
    events: Arc<Mutex<Vec<DeliveryEvent>>>,
}

impl RecordingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events published so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<DeliveryEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Returns the names of the events published so far.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(DeliveryEvent::name).collect()
    }
}

impl DeliveryEventSink for RecordingEventSink {
    fn publish(&self, event: &DeliveryEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
