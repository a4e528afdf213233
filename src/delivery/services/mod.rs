//! Application services for message delivery.

pub mod lifecycle;
pub mod send_request;
pub mod tracker;
pub mod worker;

pub use lifecycle::{
    AttemptOutcome, AttemptReport, Claim, CreateMessageRequest, DEFAULT_CLAIM_BATCH,
    MessageLifecycleError, MessageLifecycleResult, MessageLifecycleService,
};
pub use send_request::{SendOutcome, SendRequestError, SendRequestResult, SendRequestService};
pub use tracker::RecipientStatusTracker;
pub use worker::{DeliveryWorkerPool, WorkerConfig, WorkerReport};
