//! Declarative logger setup.
//!
//! A [`Config`] names a threshold, a destination and the policy for messages
//! emitted before `init`. It can be built in code or read from the
//! environment:
//!
//! | Variable          | Meaning                                          |
//! |-------------------|--------------------------------------------------|
//! | `SPINLOG_LEVEL`   | threshold, by name (`warn`) or rank (`3`)         |
//! | `SPINLOG_FILE`    | log to this file instead of standard error       |
//! | `SPINLOG_APPEND`  | `0`/`false` truncates `SPINLOG_FILE` on open      |
//! | `SPINLOG_STRICT`  | `1`/`true` panics on emission before `init`      |

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;

use crate::error::{Result, SpinlogError};
use crate::logger_state::UninitPolicy;
use crate::severity::Severity;
use crate::sink::LogSink;

pub const LEVEL_VAR: &str = "SPINLOG_LEVEL";
pub const FILE_VAR: &str = "SPINLOG_FILE";
pub const APPEND_VAR: &str = "SPINLOG_APPEND";
pub const STRICT_VAR: &str = "SPINLOG_STRICT";

/// Where messages go.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SinkTarget {
    /// The default stream. Never closed by `shutdown`.
    #[default]
    Stderr,
    Stdout,
    File { path: PathBuf, append: bool },
}

impl SinkTarget {
    /// Opens the destination. Standard error is represented by `None`, the
    /// logger's "use the default stream" slot.
    pub fn open(&self) -> Result<Option<Box<dyn LogSink>>> {
        match self {
            SinkTarget::Stderr => Ok(None),
            SinkTarget::Stdout => Ok(Some(Box::new(io::stdout()))),
            SinkTarget::File { path, append } => {
                let mut options = OpenOptions::new();
                options.create(true);
                if *append {
                    options.append(true);
                } else {
                    options.write(true).truncate(true);
                }
                let file = options.open(path).map_err(|source| SpinlogError::OpenSink {
                    path: path.clone(),
                    source,
                })?;
                Ok(Some(Box::new(file)))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub level: Severity,
    pub target: SinkTarget,
    pub uninit_policy: UninitPolicy,
}

impl Config {
    /// Reads the `SPINLOG_*` variables from the process environment.
    ///
    /// Values are read as raw OS strings, so a `SPINLOG_FILE` that is not
    /// valid Unicode still names its file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var_os(var))
    }

    /// Builds a config from any variable lookup. Unset variables keep their
    /// defaults; set but unparsable ones are errors.
    ///
    /// ```
    /// # use spinlog::{Config, Severity, SinkTarget};
    /// let config = Config::from_lookup(|var| match var {
    ///     "SPINLOG_LEVEL" => Some("warn".into()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(config.level, Severity::Warn);
    /// assert_eq!(config.target, SinkTarget::Stderr);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let mut config = Config::default();

        if let Some(level) = lookup(LEVEL_VAR) {
            config.level = level
                .into_string()
                .map_err(|raw| SpinlogError::InvalidLevel(raw.to_string_lossy().into_owned()))?
                .parse()?;
        }

        if let Some(path) = lookup(FILE_VAR).filter(|path| !path.is_empty()) {
            let append = match lookup(APPEND_VAR) {
                Some(value) => parse_flag(APPEND_VAR, value)?,
                None => true,
            };
            config.target = SinkTarget::File {
                path: PathBuf::from(path),
                append,
            };
        }

        if let Some(value) = lookup(STRICT_VAR) {
            if parse_flag(STRICT_VAR, value)? {
                config.uninit_policy = UninitPolicy::Panic;
            }
        }

        Ok(config)
    }
}

fn parse_flag(var: &'static str, value: OsString) -> Result<bool> {
    let invalid = |value: &OsString| SpinlogError::InvalidEnv {
        var,
        value: value.to_string_lossy().into_owned(),
    };
    let text = value.to_str().ok_or_else(|| invalid(&value))?;
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid(&value)),
    }
}
