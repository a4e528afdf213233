//! Port contracts for send timing.
//!
//! Ports define infrastructure-agnostic interfaces used by scheduling
//! services.

pub mod calendar;
pub mod translator;

pub use calendar::{CalendarError, CalendarResult, ObservanceCalendar};
pub use translator::Translator;
