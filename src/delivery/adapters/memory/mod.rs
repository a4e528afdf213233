//! In-memory delivery adapters.

mod clock;
mod events;
mod recipient_store;
mod repository;
mod transport;

pub use clock::ManualClock;
pub use events::RecordingEventSink;
pub use recipient_store::InMemoryRecipientStatusStore;
pub use repository::InMemoryMessageRepository;
pub use transport::{ScriptedReply, ScriptedTransport};
