//! Logger Module
//!
//! Leveled, structured logging consumed by the cache for diagnostics.
//!
//! The cache only talks to the [`Logger`] trait. [`TracingLogger`] forwards to
//! `tracing`; [`NoopLogger`] discards everything.

mod noop;
mod subscriber;
mod tracing_logger;

#[cfg(test)]
mod test_support;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use noop::NoopLogger;
pub use serde_json::Value;
pub use subscriber::{init_tracing, LoggerError};
pub use tracing_logger::TracingLogger;

// == Field Keys ==
/// Field carrying the error message on error and fatal events
pub const ERROR_KEY: &str = "error";
/// Field carrying the configured environment
pub const ENVIRONMENT_KEY: &str = "environment";
/// Field carrying the configured service name
pub const SERVICE_NAME_KEY: &str = "service";

/// Structured fields attached to a log event.
pub type Fields = BTreeMap<String, Value>;

/// Builds a [`Fields`] map from `key => value` pairs.
///
/// ```
/// let fields = localcache::fields! { "key" => "user:1", "attempt" => 2 };
/// assert_eq!(fields.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => { $crate::logger::Fields::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::logger::Fields::new();
        $( fields.insert(::std::string::String::from($key), $crate::logger::Value::from($value)); )+
        fields
    }};
}

// == Log Level ==
/// Severity of a log event, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    /// Logged at error severity; never terminates the process
    Fatal,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }

    /// Equivalent directive for an `EnvFilter`.
    pub(crate) fn filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Fatal => "error",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "fatal" => Ok(LogLevel::Fatal),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Error passed alongside error and fatal events.
pub type LogError<'a> = Option<&'a (dyn std::error::Error + 'static)>;

// == Logger Trait ==
/// Leveled logger with attached structured fields.
///
/// The active `tracing` span stands in for a request context, so no explicit
/// context parameter is taken.
pub trait Logger: Send + Sync {
    /// Returns a derived logger that adds `fields` to every event.
    fn with_fields(&self, fields: Fields) -> Arc<dyn Logger>;

    fn debug(&self, msg: &str, fields: Fields);

    fn info(&self, msg: &str, fields: Fields);

    fn warn(&self, msg: &str, fields: Fields);

    fn error(&self, msg: &str, err: LogError<'_>, fields: Fields);

    /// Logs at the highest severity. Purely diagnostic: does not exit.
    fn fatal(&self, msg: &str, err: LogError<'_>, fields: Fields);
}
