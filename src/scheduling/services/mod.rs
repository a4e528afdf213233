//! Application services for culturally-aware send timing.

mod detector;
mod policy;
mod resolver;
mod scheduler;

pub use detector::{ConflictDetector, DetectionRequest};
pub use policy::{
    DEFAULT_AUTO_RESOLVE_CEILING, DEFAULT_FLAG_FLOOR, ResolutionPolicy, SchedulingThresholds,
};
pub use resolver::{DiasporaRelevanceResolver, ObservanceScope};
pub use scheduler::{
    ScheduleDecision, ScheduleRequest, SchedulingError, SchedulingResult, TimingScheduler,
};
