//! hostbridge-logging - Host log handler registration
//!
//! This crate provides:
//! - [`LogSink`], the slot holding the host's [`LogHandler`]
//! - [`HostLoggingLayer`] tracing layer that forwards events to the handler
//! - Log level filtering for forwarded events

mod callback;
mod layer;

pub use callback::{LogHandler, LogSink};
pub use hostbridge_core::LogLevel;
pub use layer::{HostLoggingLayer, init_logging, init_logging_with_level};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{HostLoggingLayer, LogHandler, LogLevel, LogSink, init_logging};
}
