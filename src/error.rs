use std::io;
use std::path::PathBuf;

/// Errors raised while setting a logger up.
///
/// Emitting, `shutdown` and level changes never fail; only the configuration
/// paths that parse user input or open files return these.
#[derive(Debug, thiserror::Error)]
pub enum SpinlogError {
    #[error("invalid log level {0:?}: expected trace, debug, info, warn, error, fatal or 0-5")]
    InvalidLevel(String),

    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("failed to open log file {}: {source}", .path.display())]
    OpenSink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("a `log` logger is already installed")]
    LoggerAlreadySet(#[from] log::SetLoggerError),
}

pub type Result<T, E = SpinlogError> = std::result::Result<T, E>;
