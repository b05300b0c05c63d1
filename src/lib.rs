//! localcache - An in-process generic cache
//!
//! Provides a key-value cache with per-entry TTL expiration and singleflight
//! loading: concurrent misses on one key run a single initializer and share
//! its outcome.

pub mod cache;
pub mod config;
pub mod error;
pub mod logger;

pub use cache::{CacheStats, LocalCache, LocalCacheBuilder};
pub use config::LoggerConfig;
pub use error::{CacheError, Result};
pub use logger::{init_tracing, Fields, Logger, NoopLogger, TracingLogger};
