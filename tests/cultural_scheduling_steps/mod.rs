//! Step definitions for cultural scheduling scenarios.

pub mod world;

mod given;
mod then;
mod when;
