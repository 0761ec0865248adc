/// Emits a message at a runtime-chosen severity.
///
/// The fast-path filter runs before the arguments are evaluated, so a
/// suppressed call costs one atomic load.
///
/// ```
/// # use spinlog::{log_at, LoggerState, MemorySink, Severity};
/// fn expensive() -> String {
///     panic!("arguments of a suppressed message were evaluated")
/// }
///
/// let sink = MemorySink::new();
/// let logger = LoggerState::new();
/// let _ = logger.init(Some(Box::new(sink.clone())), Severity::Info);
///
/// log_at!(logger => Severity::Debug, "{}", expensive());
/// log_at!(logger => Severity::Error, "code {}", 7);
/// assert_eq!(sink.contents_lossy(), "code 7");
/// ```
#[macro_export]
macro_rules! log_at {
    ($logger:expr => $severity:expr, $($arg:tt)+) => {{
        let logger: &$crate::LoggerState = &$logger;
        let severity: $crate::Severity = $severity;
        if logger.enabled(severity) {
            logger.log(severity, format_args!($($arg)+));
        }
    }};
    ($severity:expr, $($arg:tt)+) => {
        $crate::log_at!($crate::global() => $severity, $($arg)+)
    };
}

/// Emits a `Trace` message. Accepts an optional `logger =>` prefix.
#[macro_export]
macro_rules! trace {
    ($logger:expr => $($arg:tt)+) => {
        $crate::log_at!($logger => $crate::Severity::Trace, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log_at!($crate::Severity::Trace, $($arg)+)
    };
}

/// Emits a `Debug` message. Accepts an optional `logger =>` prefix.
#[macro_export]
macro_rules! debug {
    ($logger:expr => $($arg:tt)+) => {
        $crate::log_at!($logger => $crate::Severity::Debug, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log_at!($crate::Severity::Debug, $($arg)+)
    };
}

/// Emits an `Info` message. Accepts an optional `logger =>` prefix.
#[macro_export]
macro_rules! info {
    ($logger:expr => $($arg:tt)+) => {
        $crate::log_at!($logger => $crate::Severity::Info, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log_at!($crate::Severity::Info, $($arg)+)
    };
}

/// Emits a `Warn` message. Accepts an optional `logger =>` prefix.
#[macro_export]
macro_rules! warn {
    ($logger:expr => $($arg:tt)+) => {
        $crate::log_at!($logger => $crate::Severity::Warn, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log_at!($crate::Severity::Warn, $($arg)+)
    };
}

/// Emits an `Error` message. Accepts an optional `logger =>` prefix.
#[macro_export]
macro_rules! error {
    ($logger:expr => $($arg:tt)+) => {
        $crate::log_at!($logger => $crate::Severity::Error, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log_at!($crate::Severity::Error, $($arg)+)
    };
}

/// Emits a `Fatal` message. Accepts an optional `logger =>` prefix.
///
/// Only logs; it does not terminate the process.
#[macro_export]
macro_rules! fatal {
    ($logger:expr => $($arg:tt)+) => {
        $crate::log_at!($logger => $crate::Severity::Fatal, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::log_at!($crate::Severity::Fatal, $($arg)+)
    };
}
