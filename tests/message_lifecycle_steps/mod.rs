//! Step definitions for message lifecycle scenarios.

pub mod world;

mod given;
mod then;
mod when;
