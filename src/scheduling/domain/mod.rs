//! Domain model for culturally-aware send timing.
//!
//! Observance periods, recipient profiles, and the conflict results produced
//! when a proposed send overlaps an observance. Nothing here performs I/O or
//! reads the clock.

mod conflict;
mod error;
mod observance;
mod profile;
mod severity;
mod strategy;
mod zone;

pub use conflict::ConflictResult;
pub use error::{
    ParseObservanceLevelError, ParseResolutionStrategyError, ParseSeverityError,
    SchedulingDomainError,
};
pub use observance::{CommunityId, ObservancePeriod, ObservanceType};
pub use profile::{DiasporaProfile, LanguageCode, Location, ObservanceLevel, ScopeDescriptor};
pub use severity::Severity;
pub use strategy::ResolutionStrategy;
pub use zone::ZoneSpec;
