//! In-memory scheduling adapters.

mod cache;
mod calendar;
mod translator;

pub use cache::CachingObservanceCalendar;
pub use calendar::InMemoryObservanceCalendar;
pub use translator::PhraseBookTranslator;
