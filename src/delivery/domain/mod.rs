//! Domain model for message delivery.
//!
//! The message aggregate owns its lifecycle state machine, retry accounting,
//! and delivery lease. Recipient records track per-address progress
//! independently of the message status.

mod error;
mod events;
mod failure;
mod ids;
mod lease;
mod message;
mod priority;
mod recipient;
mod retry;
mod stats;
mod status;

pub use error::{
    DeliveryDomainError, ParseFailureKindError, ParseMessageStatusError, ParseRecipientStateError,
};
pub use events::DeliveryEvent;
pub use failure::{DeliveryFailure, DeliveryOutcome, FailureKind};
pub use ids::{EmailAddress, LeaseToken, MessageId, PayloadRef, WorkerId};
pub use lease::{Lease, LeaseConfig};
pub use message::{
    AttemptRecord, CulturalContext, Message, MessageDraft, RetryDisposition, StateTransition,
};
pub use priority::Priority;
pub use recipient::{RecipientDeliveryState, RecipientStatus, RecipientUpdate};
pub use retry::{MAX_RETRIES_LIMIT, RetryPolicy, validate_max_retries};
pub use stats::{QueueStats, RecipientSummary};
pub use status::MessageStatus;
