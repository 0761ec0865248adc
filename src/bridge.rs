//! Adapters that feed the `log` and `tracing` facades into a [`LoggerState`].
//!
//! Both bridges write the bare message, exactly like the native emission
//! API: no level tag, no timestamp, no newline. Records targeted at the
//! logger's own diagnostics are dropped to keep a failing sink from feeding
//! itself.

use std::fmt;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::error::Result;
use crate::logger_state::{LoggerState, INTERNAL_TARGET};
use crate::severity::Severity;

fn is_internal(target: &str) -> bool {
    target == INTERNAL_TARGET
        || target
            .strip_prefix(INTERNAL_TARGET)
            .is_some_and(|rest| rest.starts_with("::"))
}

/// [`log::Log`] implementation backed by a logger state.
#[derive(Debug, Clone, Copy)]
pub struct LogBridge {
    state: &'static LoggerState,
}

impl LogBridge {
    pub fn new(state: &'static LoggerState) -> Self {
        Self { state }
    }

    /// Bridge onto the process-wide state.
    pub fn global() -> Self {
        Self::new(crate::global())
    }

    /// Registers this bridge as the `log` crate's logger.
    ///
    /// The `log` max level is set from the current threshold. It is not kept
    /// in sync afterwards; later `set_level` calls still filter correctly
    /// but `log` may skip records it would otherwise forward.
    pub fn install(self) -> Result<()> {
        log::set_max_level(self.state.get_level().into());
        log::set_boxed_logger(Box::new(self))?;
        Ok(())
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        !is_internal(metadata.target()) && self.state.enabled(metadata.level().into())
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            self.state.log(record.level().into(), *record.args());
        }
    }

    // every message is flushed as it is written
    fn flush(&self) {}
}

/// [`tracing_subscriber::Layer`] that writes event messages to a logger state.
///
/// Only the `message` field is written; other fields are ignored.
#[derive(Debug, Clone, Copy)]
pub struct SpinlogLayer {
    state: &'static LoggerState,
}

impl SpinlogLayer {
    pub fn new(state: &'static LoggerState) -> Self {
        Self { state }
    }

    pub fn global() -> Self {
        Self::new(crate::global())
    }
}

impl<S: Subscriber> Layer<S> for SpinlogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_internal(metadata.target()) {
            return;
        }
        let severity = Severity::from(*metadata.level());
        if !self.state.enabled(severity) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        if let Some(message) = visitor.message {
            self.state.log(severity, format_args!("{}", message));
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        }
    }
}
