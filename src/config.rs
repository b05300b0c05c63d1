//! Configuration Module
//!
//! Handles loading logger configuration from environment variables.
//!
//! There is no process-wide default: every logger and subscriber is built from
//! a `LoggerConfig` value the caller holds.

use std::env;
use std::str::FromStr;

use crate::logger::LogLevel;

/// Output encoding of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Multi-line human readable output
    Pretty,
    /// Single-line human readable output
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Where formatted log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            other => Err(format!("unknown log output: {other}")),
        }
    }
}

/// Logger configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Minimum level that will be emitted
    pub level: LogLevel,
    /// Output encoding
    pub format: LogFormat,
    /// Output destination
    pub output: LogOutput,
    /// Running environment attached to every event (e.g. "production")
    pub environment: Option<String>,
    /// Service name attached to every event
    pub service_name: Option<String>,
}

impl LoggerConfig {
    /// Creates a new LoggerConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `LOG_LEVEL` - Minimum level (default: info)
    /// - `LOG_FORMAT` - json, pretty or compact (default: json)
    /// - `LOG_OUTPUT` - stdout or stderr (default: stdout)
    /// - `APP_ENV` - Environment field (default: unset)
    /// - `SERVICE_NAME` - Service field (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            level: parse_env("LOG_LEVEL").unwrap_or(defaults.level),
            format: parse_env("LOG_FORMAT").unwrap_or(defaults.format),
            output: parse_env("LOG_OUTPUT").unwrap_or(defaults.output),
            environment: non_empty_env("APP_ENV"),
            service_name: non_empty_env("SERVICE_NAME"),
        }
    }

    /// Sets the minimum level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the service name attached to every event.
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Sets the environment attached to every event.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            output: LogOutput::Stdout,
            environment: None,
            service_name: None,
        }
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::Stdout);
        assert!(config.environment.is_none());
        assert!(config.service_name.is_none());
    }

    #[test]
    fn test_config_builders() {
        let config = LoggerConfig::default()
            .with_level(LogLevel::Debug)
            .with_service_name("billing")
            .with_environment("staging");

        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.service_name.as_deref(), Some("billing"));
        assert_eq!(config.environment.as_deref(), Some("staging"));
    }

    #[test]
    fn test_config_from_env() {
        // Single test touching the environment to avoid races between tests
        env::remove_var("LOG_LEVEL");
        env::remove_var("LOG_FORMAT");
        env::remove_var("LOG_OUTPUT");
        env::remove_var("APP_ENV");
        env::remove_var("SERVICE_NAME");

        assert_eq!(LoggerConfig::from_env(), LoggerConfig::default());

        env::set_var("LOG_LEVEL", "warn");
        env::set_var("LOG_FORMAT", "compact");
        env::set_var("LOG_OUTPUT", "bogus");
        env::set_var("SERVICE_NAME", "billing");
        env::set_var("APP_ENV", "  ");

        let config = LoggerConfig::from_env();
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.output, LogOutput::Stdout);
        assert_eq!(config.service_name.as_deref(), Some("billing"));
        assert!(config.environment.is_none());

        for var in ["LOG_LEVEL", "LOG_FORMAT", "LOG_OUTPUT", "APP_ENV", "SERVICE_NAME"] {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_parse_format_and_output() {
        assert_eq!("PRETTY".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert_eq!(" stderr ".parse::<LogOutput>(), Ok(LogOutput::Stderr));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
