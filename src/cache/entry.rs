//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with value and expiry deadline.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The stored value
    pub value: T,
    /// Absolute expiry deadline, None = no expiration
    pub expires_at: Option<Instant>,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry that expires `ttl` from now.
    ///
    /// A zero TTL yields an entry that is already expired. A TTL too large to
    /// be represented as an `Instant` (e.g. `Duration::MAX`) never expires.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Time-to-live measured from now
    pub fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is valid only while the deadline is
    /// strictly after the current time, so it is expired at `now >= expires_at`.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`CacheEntry::is_expired`] against a caller-supplied clock reading.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }
}
