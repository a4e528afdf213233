//! Adapter implementations for the delivery ports.
//!
//! - [`memory`]: in-process repository, recipient store, scripted transport,
//!   recording event sink and manual clock
//! - [`TracingEventSink`]: publishes delivery events to the log

pub mod memory;
mod tracing_sink;

pub use tracing_sink::TracingEventSink;
