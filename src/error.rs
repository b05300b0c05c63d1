//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
///
/// Cloning is cheap: an initializer failure is shared behind an `Arc`, so every
/// caller waiting on the same load receives the very same error value.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// No valid entry for the key and no initializer to compute one
    #[error("cache miss")]
    Miss,

    /// The initializer returned an error; the original error is kept verbatim
    #[error("initializer failed: {0}")]
    Initializer(Arc<anyhow::Error>),

    /// The initializer panicked or its task was torn down before publishing
    #[error("initializer for key {0:?} did not complete")]
    InitializerPanicked(String),

    /// An initializer was supplied outside of a Tokio runtime
    #[error("no tokio runtime available to run the initializer")]
    NoRuntime,
}

impl CacheError {
    /// Returns true for the cache-miss sentinel.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::Miss)
    }

    /// Returns the shared initializer error, if this is one.
    pub fn initializer_error(&self) -> Option<&Arc<anyhow::Error>> {
        match self {
            CacheError::Initializer(err) => Some(err),
            _ => None,
        }
    }

    /// Attempts to view the initializer's underlying error as a concrete type.
    ///
    /// Lets callers check for a specific failure they produced in their own
    /// initializer without caring about how it travelled through the cache.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        self.initializer_error().and_then(|err| err.downcast_ref::<E>())
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
