//! Culturally-aware send timing.
//!
//! Checks proposed sends against the observance calendars of the diaspora
//! communities a message targets and proposes alternatives when they
//! collide. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Windowing rules per observance kind in [`windowing`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
pub mod windowing;

#[cfg(test)]
mod tests;
