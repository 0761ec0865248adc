use std::cell::UnsafeCell;
use std::fmt::{self, Write as _};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use crate::atomic_lock::AtomicLock;
use crate::config::Config;
use crate::error::Result;
use crate::severity::{IntoSeverity, Severity};
use crate::sink::LogSink;

/// Target used for the logger's own diagnostics. Bridges skip it so a
/// diagnostic can never be routed back into the logger that produced it.
pub(crate) const INTERNAL_TARGET: &str = "spinlog";

/// What emission does while no `init` is in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UninitPolicy {
    /// Write to standard error using the default `Info` threshold.
    #[default]
    DefaultStream,
    /// Panic at the call site, before the lock is taken.
    Panic,
}

type SinkSlot = Option<Box<dyn LogSink>>;

/// The guarded logger record: one sink, one threshold, one lock.
///
/// `LoggerState` is an explicit context object. The crate keeps a single
/// process-wide instance behind [`crate::global`], but nothing stops an
/// embedder (or a test) from owning its own.
///
/// # Lifecycle
///
/// A fresh state is uninitialized: it writes to standard error with an
/// `Info` threshold. [`init`](Self::init) installs a sink and threshold,
/// [`shutdown`](Self::shutdown) closes the sink and returns to the
/// uninitialized state. What emission does while uninitialized is governed
/// by [`UninitPolicy`].
///
/// # Thread Safety
///
/// The sink is only touched while the internal [`AtomicLock`] is held, so
/// messages from different threads never interleave. The threshold lives in
/// an atomic: it is written under the lock but may be read without it by the
/// fast-path filter. That read is advisory. A message racing a concurrent
/// `set_level` may be filtered against the old or the new threshold, and the
/// locked re-check may disagree with the fast path. Both outcomes are
/// accepted; the payoff is that suppressed messages never touch the lock.
///
/// The lock is not reentrant. A `Display` impl that logs through the same
/// state while being rendered will deadlock.
pub struct LoggerState {
    lock: AtomicLock,
    sink: UnsafeCell<SinkSlot>,
    threshold: AtomicU8,
    initialized: AtomicBool,
    strict: AtomicBool,
    write_failures: AtomicUsize,
}

// SAFETY: `sink` is only dereferenced inside `with_sink`, which holds `lock`
// for the whole access. Every other field is atomic.
unsafe impl Sync for LoggerState {}

impl LoggerState {
    /// Creates an uninitialized state using [`UninitPolicy::DefaultStream`].
    pub const fn new() -> Self {
        Self::with_uninit_policy(UninitPolicy::DefaultStream)
    }

    pub const fn with_uninit_policy(policy: UninitPolicy) -> Self {
        Self {
            lock: AtomicLock::new(),
            sink: UnsafeCell::new(None),
            threshold: AtomicU8::new(Severity::DEFAULT.as_u8()),
            initialized: AtomicBool::new(false),
            strict: AtomicBool::new(matches!(policy, UninitPolicy::Panic)),
            write_failures: AtomicUsize::new(0),
        }
    }

    /// Runs `f` with exclusive access to the sink slot.
    fn with_sink<R>(&self, f: impl FnOnce(&mut SinkSlot) -> R) -> R {
        let _guard = self.lock.lock();
        // SAFETY: the guard is held until `f` returns, so no other thread
        // can reach the slot.
        let slot = unsafe { &mut *self.sink.get() };
        f(slot)
    }

    /// Installs `sink` and `level`, replacing whatever was configured.
    ///
    /// `None` selects standard error. An out-of-range raw level becomes
    /// `Info`. The previously installed sink is returned without being
    /// closed: ownership goes back to the caller, who decides its fate.
    ///
    /// ```
    /// # use spinlog::{LoggerState, MemorySink, Severity};
    /// let logger = LoggerState::new();
    /// let first = MemorySink::new();
    /// assert!(logger.init(Some(Box::new(first.clone())), Severity::Debug).is_none());
    ///
    /// let previous = logger.init(None, 99);
    /// assert!(previous.is_some());
    /// assert!(!first.is_closed());
    /// assert_eq!(logger.get_level(), Severity::Info);
    /// ```
    pub fn init<L: IntoSeverity>(
        &self,
        sink: Option<Box<dyn LogSink>>,
        level: L,
    ) -> Option<Box<dyn LogSink>> {
        let level = level.into_severity();
        let custom_sink = sink.is_some();
        let previous = self.with_sink(move |slot| {
            let previous = std::mem::replace(slot, sink);
            self.threshold.store(level.as_u8(), Ordering::Relaxed);
            self.initialized.store(true, Ordering::Relaxed);
            previous
        });
        tracing::debug!(
            target: INTERNAL_TARGET,
            %level,
            custom_sink,
            replaced = previous.is_some(),
            "logger initialized"
        );
        previous
    }

    /// Opens the sink described by `config` and initializes with it.
    ///
    /// The uninitialized-emission policy is applied too. Fails only if the
    /// sink cannot be opened, in which case the state is left untouched.
    pub fn init_with_config(&self, config: &Config) -> Result<Option<Box<dyn LogSink>>> {
        let sink = config.target.open()?;
        self.set_uninit_policy(config.uninit_policy);
        Ok(self.init(sink, config.level))
    }

    /// Closes a caller-supplied sink and returns to the uninitialized state.
    ///
    /// Standard error is never closed. Calling this repeatedly is harmless.
    /// Close failures are swallowed and counted as write failures.
    pub fn shutdown(&self) {
        let closed = self.with_sink(|slot| {
            let closed = slot.take().map(|mut sink| sink.close());
            self.threshold.store(Severity::DEFAULT.as_u8(), Ordering::Relaxed);
            self.initialized.store(false, Ordering::Relaxed);
            closed
        });
        match closed {
            Some(Ok(())) => {
                tracing::debug!(target: INTERNAL_TARGET, "logger shut down, sink closed")
            }
            Some(Err(err)) => {
                self.write_failures.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    target: INTERNAL_TARGET,
                    error = %err,
                    "logger shut down, sink failed to close"
                );
            }
            None => {}
        }
    }

    /// Current threshold. An unlocked snapshot, see the type-level docs.
    #[inline]
    pub fn get_level(&self) -> Severity {
        Severity::from_raw(self.threshold.load(Ordering::Relaxed) as i64)
    }

    /// Stores a new threshold; out-of-range raw levels become `Info`.
    pub fn set_level<L: IntoSeverity>(&self, level: L) {
        let level = level.into_severity();
        self.with_sink(|_| self.threshold.store(level.as_u8(), Ordering::Relaxed));
    }

    /// Fast-path filter: would a message at `severity` pass the threshold?
    ///
    /// Never takes the lock.
    #[inline(always)]
    pub fn enabled(&self, severity: Severity) -> bool {
        severity.as_u8() >= self.threshold.load(Ordering::Relaxed)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Relaxed)
    }

    pub fn uninit_policy(&self) -> UninitPolicy {
        if self.strict.load(Ordering::Relaxed) {
            UninitPolicy::Panic
        } else {
            UninitPolicy::DefaultStream
        }
    }

    pub fn set_uninit_policy(&self, policy: UninitPolicy) {
        self.strict.store(matches!(policy, UninitPolicy::Panic), Ordering::Relaxed);
    }

    /// Messages (and sink closes) that failed with an I/O or formatting
    /// error since this state was created.
    pub fn write_failures(&self) -> usize {
        self.write_failures.load(Ordering::Relaxed)
    }

    /// Filters, renders and writes one message.
    ///
    /// The message is rendered into a single buffer and handed to the sink
    /// with one `write_all` followed by a flush, both under the lock. Errors
    /// from the sink or from a failing `Display` impl are not reported to
    /// the caller.
    ///
    /// # Panics
    ///
    /// With [`UninitPolicy::Panic`], if no `init` is in effect and the
    /// message passes the threshold.
    pub fn log(&self, severity: Severity, args: fmt::Arguments<'_>) {
        if !self.enabled(severity) {
            return;
        }
        if !self.is_initialized() && self.uninit_policy() == UninitPolicy::Panic {
            panic!("spinlog: {} message emitted before init() was called", severity);
        }

        let failure = self.with_sink(|slot| {
            // the threshold may have moved since the fast path
            if severity < self.get_level() {
                return None;
            }
            let mut rendered = String::new();
            if rendered.write_fmt(args).is_err() {
                return Some(io::Error::new(io::ErrorKind::InvalidData, "formatting failed"));
            }
            write_message(slot, rendered.as_bytes()).err()
        });

        if let Some(err) = failure {
            self.write_failures.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                target: INTERNAL_TARGET,
                %severity,
                error = %err,
                "dropped log message"
            );
        }
    }

    #[inline]
    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Trace, args)
    }

    #[inline]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Debug, args)
    }

    #[inline]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Info, args)
    }

    #[inline]
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Warn, args)
    }

    #[inline]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Error, args)
    }

    #[inline]
    pub fn fatal(&self, args: fmt::Arguments<'_>) {
        self.log(Severity::Fatal, args)
    }
}

fn write_message(slot: &mut SinkSlot, bytes: &[u8]) -> io::Result<()> {
    match slot {
        Some(sink) => {
            sink.write_all(bytes)?;
            sink.flush()
        }
        None => {
            let mut stderr = io::stderr().lock();
            stderr.write_all(bytes)?;
            stderr.flush()
        }
    }
}

impl Default for LoggerState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerState")
            .field("threshold", &self.get_level())
            .field("initialized", &self.is_initialized())
            .field("uninit_policy", &self.uninit_policy())
            .field("write_failures", &self.write_failures())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    #[test]
    fn test_fresh_state_defaults() {
        let logger = LoggerState::new();
        assert_eq!(logger.get_level(), Severity::Info);
        assert!(!logger.is_initialized());
        assert!(!logger.enabled(Severity::Debug));
        assert!(logger.enabled(Severity::Info));
    }

    #[test]
    fn test_set_level_coerces_raw() {
        let logger = LoggerState::new();
        logger.set_level(Severity::Error);
        assert_eq!(logger.get_level(), Severity::Error);
        logger.set_level(-3);
        assert_eq!(logger.get_level(), Severity::Info);
        logger.set_level(5u8);
        assert_eq!(logger.get_level(), Severity::Fatal);
    }

    #[test]
    fn test_failing_sink_is_counted_not_raised() {
        let mut closed = MemorySink::new();
        closed.close().unwrap();
        let logger = LoggerState::new();
        let _ = logger.init(Some(Box::new(closed)), Severity::Trace);
        logger.error(format_args!("lost"));
        logger.trace(format_args!("also lost"));
        assert_eq!(logger.write_failures(), 2);
    }

    #[test]
    fn test_failing_display_is_swallowed() {
        struct Broken;
        impl fmt::Display for Broken {
            fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
                Err(fmt::Error)
            }
        }

        let sink = MemorySink::new();
        let logger = LoggerState::new();
        let _ = logger.init(Some(Box::new(sink.clone())), Severity::Info);
        logger.info(format_args!("{}", Broken));
        assert_eq!(sink.write_count(), 0);
        assert_eq!(logger.write_failures(), 1);
    }

    #[test]
    fn test_lock_released_after_emission() {
        let logger = LoggerState::new();
        let _ = logger.init(Some(Box::new(MemorySink::new())), Severity::Info);
        logger.warn(format_args!("x"));
        assert!(!logger.lock.is_locked());
    }
}
