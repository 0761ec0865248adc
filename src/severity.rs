use std::fmt;
use std::str::FromStr;

use crate::error::SpinlogError;

/// Ordered message severity.
///
/// The discriminants are the raw ranks accepted by [`Severity::from_raw`].
/// Ordering follows rank: `Trace < Debug < Info < Warn < Error < Fatal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Severity {
    /// Every severity, lowest first.
    pub const ALL: [Severity; 6] = [
        Severity::Trace,
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    /// Threshold used before `init` and after `shutdown`.
    pub const DEFAULT: Severity = Severity::Info;

    /// Maps a raw rank onto a severity, coercing anything out of range to `Info`.
    ///
    /// ```
    /// # use spinlog::Severity;
    /// assert_eq!(Severity::from_raw(3), Severity::Warn);
    /// assert_eq!(Severity::from_raw(-1), Severity::Info);
    /// assert_eq!(Severity::from_raw(42), Severity::Info);
    /// ```
    pub const fn from_raw(raw: i64) -> Severity {
        match raw {
            0 => Severity::Trace,
            1 => Severity::Debug,
            2 => Severity::Info,
            3 => Severity::Warn,
            4 => Severity::Error,
            5 => Severity::Fatal,
            _ => Severity::DEFAULT,
        }
    }

    #[inline(always)]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::DEFAULT
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = SpinlogError;

    /// Parses a severity name (any case) or a raw rank.
    ///
    /// Unlike [`Severity::from_raw`], unknown input is an error here: text
    /// usually comes from configuration, where a typo should be reported.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(rank) = trimmed.parse::<u8>() {
            return match rank {
                0..=5 => Ok(Severity::from_raw(rank as i64)),
                _ => Err(SpinlogError::InvalidLevel(s.to_string())),
            };
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => Ok(Severity::Trace),
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" | "err" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            _ => Err(SpinlogError::InvalidLevel(s.to_string())),
        }
    }
}

/// Anything that can be stored as a threshold.
///
/// Raw integers go through [`Severity::from_raw`], so invalid ranks silently
/// become `Info` instead of failing.
pub trait IntoSeverity {
    fn into_severity(self) -> Severity;
}

impl IntoSeverity for Severity {
    #[inline(always)]
    fn into_severity(self) -> Severity {
        self
    }
}

impl IntoSeverity for i32 {
    fn into_severity(self) -> Severity {
        Severity::from_raw(self as i64)
    }
}

impl IntoSeverity for i64 {
    fn into_severity(self) -> Severity {
        Severity::from_raw(self)
    }
}

impl IntoSeverity for u8 {
    fn into_severity(self) -> Severity {
        Severity::from_raw(self as i64)
    }
}

impl IntoSeverity for log::Level {
    fn into_severity(self) -> Severity {
        Severity::from(self)
    }
}

impl IntoSeverity for tracing::Level {
    fn into_severity(self) -> Severity {
        Severity::from(self)
    }
}

impl From<log::Level> for Severity {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => Severity::Trace,
            log::Level::Debug => Severity::Debug,
            log::Level::Info => Severity::Info,
            log::Level::Warn => Severity::Warn,
            log::Level::Error => Severity::Error,
        }
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Severity::Trace,
            tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warn,
            _ => Severity::Error,
        }
    }
}

impl From<Severity> for log::LevelFilter {
    /// The `log` crate has no fatal level; `Fatal` maps to `Error`.
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Trace => log::LevelFilter::Trace,
            Severity::Debug => log::LevelFilter::Debug,
            Severity::Info => log::LevelFilter::Info,
            Severity::Warn => log::LevelFilter::Warn,
            Severity::Error | Severity::Fatal => log::LevelFilter::Error,
        }
    }
}
