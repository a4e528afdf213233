//! Adapter implementations for the scheduling ports.
//!
//! - [`memory::InMemoryObservanceCalendar`]: calendar backed by a list of
//!   periods
//! - [`memory::CachingObservanceCalendar`]: read-through cache decorator
//! - [`memory::PhraseBookTranslator`]: table-driven translator

pub mod memory;
