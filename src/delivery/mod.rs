//! Message delivery lifecycle and recipient tracking.
//!
//! Messages move through `Pending → Queued → Sending → Sent → Delivered`,
//! with transient failures retried under exponential backoff and at most
//! one worker holding a message at a time. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
