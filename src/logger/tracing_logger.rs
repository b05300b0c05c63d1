//! Logger backed by `tracing` events.

use std::sync::Arc;

use super::{
    Fields, LogError, LogLevel, Logger, Value, ENVIRONMENT_KEY, ERROR_KEY, SERVICE_NAME_KEY,
};
use crate::config::LoggerConfig;

/// [`Logger`] that emits one `tracing` event per call.
///
/// Fields carried by the logger are merged with per-call fields (the call wins
/// on conflicts) and rendered as a JSON object in the event's `fields` field.
/// Events below the configured level are dropped before reaching `tracing`.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    level: LogLevel,
    fields: Fields,
}

impl TracingLogger {
    /// Builds a logger from an explicit configuration.
    pub fn new(config: &LoggerConfig) -> Self {
        let mut fields = Fields::new();
        if let Some(environment) = &config.environment {
            fields.insert(ENVIRONMENT_KEY.to_owned(), Value::from(environment.as_str()));
        }
        if let Some(service) = &config.service_name {
            fields.insert(SERVICE_NAME_KEY.to_owned(), Value::from(service.as_str()));
        }

        Self {
            level: config.level,
            fields,
        }
    }

    /// Logger built from [`LoggerConfig::default`].
    pub fn from_default_config() -> Self {
        Self::new(&LoggerConfig::default())
    }

    /// Returns a shared handle, the form the cache stores.
    pub fn shared(config: &LoggerConfig) -> Arc<dyn Logger> {
        Arc::new(Self::new(config))
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    fn merged(&self, fields: Fields) -> Fields {
        let mut merged = self.fields.clone();
        merged.extend(fields);
        merged
    }

    fn log(&self, level: LogLevel, msg: &str, err: LogError<'_>, fields: Fields) {
        if level < self.level {
            return;
        }

        let mut merged = self.merged(fields);
        if let Some(err) = err {
            merged.insert(ERROR_KEY.to_owned(), Value::from(err.to_string()));
        }
        let rendered = Value::Object(merged.into_iter().collect());

        match level {
            LogLevel::Debug => tracing::debug!(fields = %rendered, "{}", msg),
            LogLevel::Info => tracing::info!(fields = %rendered, "{}", msg),
            LogLevel::Warn => tracing::warn!(fields = %rendered, "{}", msg),
            LogLevel::Error => tracing::error!(fields = %rendered, "{}", msg),
            LogLevel::Fatal => {
                tracing::error!(severity = "fatal", fields = %rendered, "{}", msg)
            }
        }
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::from_default_config()
    }
}

impl Logger for TracingLogger {
    fn with_fields(&self, fields: Fields) -> Arc<dyn Logger> {
        Arc::new(Self {
            level: self.level,
            fields: self.merged(fields),
        })
    }

    fn debug(&self, msg: &str, fields: Fields) {
        self.log(LogLevel::Debug, msg, None, fields);
    }

    fn info(&self, msg: &str, fields: Fields) {
        self.log(LogLevel::Info, msg, None, fields);
    }

    fn warn(&self, msg: &str, fields: Fields) {
        self.log(LogLevel::Warn, msg, None, fields);
    }

    fn error(&self, msg: &str, err: LogError<'_>, fields: Fields) {
        self.log(LogLevel::Error, msg, err, fields);
    }

    fn fatal(&self, msg: &str, err: LogError<'_>, fields: Fields) {
        self.log(LogLevel::Fatal, msg, err, fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    use crate::logger::test_support::Capture;

    fn capture_logs(f: impl FnOnce()) -> String {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(capture.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        capture.contents()
    }

    #[test]
    fn test_new_attaches_config_fields() {
        let config = LoggerConfig::default()
            .with_service_name("billing")
            .with_environment("production");
        let logger = TracingLogger::new(&config);

        assert_eq!(logger.fields()[SERVICE_NAME_KEY], Value::from("billing"));
        assert_eq!(logger.fields()[ENVIRONMENT_KEY], Value::from("production"));
    }

    #[test]
    fn test_info_renders_merged_fields() {
        let config = LoggerConfig::default().with_service_name("billing");
        let logger = TracingLogger::new(&config);

        let output = capture_logs(|| {
            logger.info("cache warmed", crate::fields! { "entries" => 3 });
        });

        assert!(output.contains("INFO"));
        assert!(output.contains("cache warmed"));
        assert!(output.contains(r#""service":"billing""#));
        assert!(output.contains(r#""entries":3"#));
    }

    #[test]
    fn test_below_level_is_dropped() {
        let logger = TracingLogger::new(&LoggerConfig::default().with_level(LogLevel::Warn));

        let output = capture_logs(|| {
            logger.debug("hidden debug", Fields::new());
            logger.info("hidden info", Fields::new());
            logger.warn("visible warn", Fields::new());
        });

        assert!(!output.contains("hidden"));
        assert!(output.contains("visible warn"));
    }

    #[test]
    fn test_with_fields_derives_without_mutating_parent() {
        let parent = TracingLogger::from_default_config();
        let child = parent.with_fields(crate::fields! { "cache" => "users" });

        assert!(parent.fields().is_empty());

        let output = capture_logs(|| {
            child.info("derived", crate::fields! { "cache" => "override" });
        });
        assert!(output.contains(r#""cache":"override""#));
    }

    #[test]
    fn test_error_and_fatal_attach_error() {
        let logger = TracingLogger::from_default_config();
        let err = io::Error::new(io::ErrorKind::Other, "disk on fire");

        let output = capture_logs(|| {
            logger.error("load failed", Some(&err), Fields::new());
            logger.fatal("giving up", Some(&err), Fields::new());
        });

        assert!(output.contains(r#""error":"disk on fire""#));
        assert!(output.contains("severity=\"fatal\""));
        assert!(output.contains("giving up"));
    }
}
