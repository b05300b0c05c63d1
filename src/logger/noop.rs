//! Logger that discards every event.

use std::sync::Arc;

use super::{Fields, LogError, Logger};

/// Zero-cost [`Logger`] for callers that want no logging overhead.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl NoopLogger {
    pub fn new() -> Self {
        NoopLogger
    }

    /// Returns a shared handle, the form the cache stores.
    pub fn shared() -> Arc<dyn Logger> {
        Arc::new(NoopLogger)
    }
}

impl Logger for NoopLogger {
    fn with_fields(&self, _fields: Fields) -> Arc<dyn Logger> {
        Arc::new(NoopLogger)
    }

    fn debug(&self, _msg: &str, _fields: Fields) {}

    fn info(&self, _msg: &str, _fields: Fields) {}

    fn warn(&self, _msg: &str, _fields: Fields) {}

    fn error(&self, _msg: &str, _err: LogError<'_>, _fields: Fields) {}

    fn fatal(&self, _msg: &str, _err: LogError<'_>, _fields: Fields) {}
}
