//! Kalaya: culturally-aware message delivery for diaspora communities.
//!
//! Sends are checked against the observance calendars of the communities a
//! message reaches, moved when they collide with an observance, and then
//! delivered by a pool of workers with lease-based exclusion, retry and
//! per-recipient tracking.
//!
//! # Architecture
//!
//! Kalaya follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports
//!
//! # Modules
//!
//! - [`scheduling`]: Conflict detection and send-time approval
//! - [`delivery`]: Message lifecycle, leasing and recipient tracking
//! - [`config`]: TOML engine configuration
//! - [`telemetry`]: Logging setup

pub mod config;
pub mod delivery;
pub mod scheduling;
pub mod telemetry;
