//! # spinlog
//!
//! A process-wide, thread-safe logger with one destination and one severity
//! threshold, guarded by a busy-wait lock.
//!
//! ## Key Features
//!
//! * Suppressed messages are rejected lock-free and allocation-free
//! * Emitted messages are written whole and flushed before the lock is released
//! * No OS blocking primitive: the lock spins on compare-and-swap, yielding between attempts
//! * Compile-time checked format strings through `format_args!`
//!
//! ## Main Components
//!
//! * `AtomicLock`: spin lock guarding the logger record
//! * `LoggerState`: sink plus threshold, with `init`/`shutdown` lifecycle and
//!   the six emission operations
//! * `Severity`: the ordered levels `Trace < Debug < Info < Warn < Error < Fatal`
//! * `Config`: declarative or environment-driven setup
//! * `LogBridge` / `SpinlogLayer`: adapters for the `log` and `tracing` facades
//!
//! Messages carry no implicit framing: what the format string renders is
//! exactly what reaches the sink.
//!
//! ## Quick Start
//!
//! ```
//! use spinlog::{LoggerState, MemorySink, Severity};
//!
//! let sink = MemorySink::new();
//! let logger = LoggerState::new();
//! let _ = logger.init(Some(Box::new(sink.clone())), Severity::Warn);
//!
//! spinlog::info!(logger => "ignored\n");
//! spinlog::warn!(logger => "disk at {}%\n", 93);
//! assert_eq!(sink.contents_lossy(), "disk at 93%\n");
//!
//! logger.shutdown();
//! assert!(sink.is_closed());
//! ```
//!
//! Without a `logger =>` prefix the macros use the process-wide state returned
//! by [`global`], which the free functions of this crate also operate on.

pub mod atomic_lock;
pub mod bridge;
pub mod config;
pub mod error;
pub mod logger_state;
mod macros;
pub mod platform;
pub mod severity;
pub mod sink;

use std::fmt;

pub use atomic_lock::{AtomicLock, LockGuard};
pub use bridge::{LogBridge, SpinlogLayer};
pub use config::{Config, SinkTarget};
pub use error::{Result, SpinlogError};
pub use logger_state::{LoggerState, UninitPolicy};
pub use severity::{IntoSeverity, Severity};
pub use sink::{LogSink, MemorySink};

/// The process-wide logger. Built at compile time, so reaching it costs nothing.
static GLOBAL: LoggerState = LoggerState::new();

/// The process-wide logger state.
#[inline]
pub fn global() -> &'static LoggerState {
    &GLOBAL
}

/// Initializes the process-wide logger. See [`LoggerState::init`].
pub fn init<L: IntoSeverity>(
    sink: Option<Box<dyn LogSink>>,
    level: L,
) -> Option<Box<dyn LogSink>> {
    GLOBAL.init(sink, level)
}

/// Initializes the process-wide logger from the `SPINLOG_*` environment.
pub fn init_from_env() -> Result<Option<Box<dyn LogSink>>> {
    GLOBAL.init_with_config(&Config::from_env()?)
}

pub fn shutdown() {
    GLOBAL.shutdown()
}

pub fn get_level() -> Severity {
    GLOBAL.get_level()
}

pub fn set_level<L: IntoSeverity>(level: L) {
    GLOBAL.set_level(level)
}

pub fn trace(args: fmt::Arguments<'_>) {
    GLOBAL.trace(args)
}

pub fn debug(args: fmt::Arguments<'_>) {
    GLOBAL.debug(args)
}

pub fn info(args: fmt::Arguments<'_>) {
    GLOBAL.info(args)
}

pub fn warn(args: fmt::Arguments<'_>) {
    GLOBAL.warn(args)
}

pub fn error(args: fmt::Arguments<'_>) {
    GLOBAL.error(args)
}

pub fn fatal(args: fmt::Arguments<'_>) {
    GLOBAL.fatal(args)
}
