//! Tracing layer that forwards to the host log handler

use crate::callback::LogSink;
use hostbridge_core::LogLevel;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::subscriber::Interest;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// Tracing layer that forwards log events through a [`LogSink`]
pub struct HostLoggingLayer {
    sink: Arc<LogSink>,
}

impl HostLoggingLayer {
    /// Create a layer using the global sink
    pub fn new() -> Self {
        Self {
            sink: LogSink::shared(),
        }
    }

    /// Create a layer with a specific sink
    pub fn with_sink(sink: Arc<LogSink>) -> Self {
        Self { sink }
    }

    /// Convert tracing Level to our LogLevel
    ///
    /// The host has no trace level; TRACE is delivered as Debug.
    fn convert_level(level: &Level) -> LogLevel {
        match *level {
            Level::TRACE | Level::DEBUG => LogLevel::Debug,
            Level::INFO => LogLevel::Info,
            Level::WARN => LogLevel::Warn,
            Level::ERROR => LogLevel::Error,
        }
    }
}

impl Default for HostLoggingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for HostLoggingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = Self::convert_level(event.metadata().level());

        // Skip formatting when nothing would be delivered
        if !self.sink.is_enabled(level) || !self.sink.is_registered() {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.sink.invoke(level, &visitor.finish());
    }

    fn register_callsite(&self, _metadata: &'static tracing::Metadata<'static>) -> Interest {
        // The sink level changes at runtime, so decide per event
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &tracing::Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        self.sink.is_enabled(Self::convert_level(metadata.level()))
    }
}

/// Visitor that renders the message followed by `name=value` fields
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn push_field(&mut self, name: &str, value: std::fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", name, value);
    }

    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), format_args!("{}", value));
        }
    }
}

/// Initialize the logging system with the host layer
///
/// Installs a global subscriber forwarding to [`LogSink::global`]. Calling
/// this more than once is harmless; later calls leave the first subscriber
/// in place.
pub fn init_logging() {
    use tracing_subscriber::prelude::*;

    let subscriber = tracing_subscriber::registry().with(HostLoggingLayer::new());

    // Ignore the error if a global default is already set
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Initialize logging with a specific log level
pub fn init_logging_with_level(level: LogLevel) {
    LogSink::global().set_level(level);
    init_logging();
}
