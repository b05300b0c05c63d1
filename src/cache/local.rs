//! Local Cache Module
//!
//! Public cache API combining the entry store with singleflight loading.

use std::future::Future;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::runtime::Handle;

use crate::cache::singleflight::{Coordinator, Join, LeaderSlot};
use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheStats, EntryStore};
use crate::error::{CacheError, Result};
use crate::fields;
use crate::logger::{Logger, NoopLogger};

/// Name used when none is given to the builder.
pub const DEFAULT_CACHE_NAME: &str = "localcache";

struct Inner<T> {
    name: String,
    store: EntryStore<T>,
    coordinator: Coordinator<T>,
    stats: StatsRecorder,
    logger: Arc<dyn Logger>,
}

// == Local Cache ==
/// In-process cache of `T` values with per-entry TTL.
///
/// Handles are cheap to clone and all clones share the same entries. Misses
/// resolved through [`LocalCache::get_with`] are deduplicated per key: however
/// many callers miss at once, the initializer runs a single time and every
/// caller receives its outcome. Failed loads are never cached.
pub struct LocalCache<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for LocalCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> std::fmt::Debug for LocalCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

// == Builder ==
/// Configures a [`LocalCache`] before construction.
///
/// The value type is fixed by the cache the builder produces, so
/// `LocalCache::builder().name("users").build()` infers `T` from later use.
pub struct LocalCacheBuilder<T> {
    name: String,
    logger: Arc<dyn Logger>,
    _value: PhantomData<fn() -> T>,
}

impl<T: Clone + Send + Sync + 'static> LocalCacheBuilder<T> {
    /// Sets the name attached to the cache's log events.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the logger for cache diagnostics.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn build(self) -> LocalCache<T> {
        let logger = self.logger.with_fields(fields! { "cache" => self.name.as_str() });
        LocalCache {
            inner: Arc::new(Inner {
                name: self.name,
                store: EntryStore::new(),
                coordinator: Coordinator::new(),
                stats: StatsRecorder::default(),
                logger,
            }),
        }
    }
}

impl<T> Default for LocalCacheBuilder<T> {
    fn default() -> Self {
        Self {
            name: DEFAULT_CACHE_NAME.to_owned(),
            logger: NoopLogger::shared(),
            _value: PhantomData,
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for LocalCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> LocalCache<T> {
    // == Constructor ==
    /// Creates an empty cache that does no logging.
    pub fn new() -> Self {
        LocalCacheBuilder::default().build()
    }

    pub fn builder() -> LocalCacheBuilder<T> {
        LocalCacheBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    // == Get ==
    /// Returns the cached value for `key`.
    ///
    /// Fails with [`CacheError::Miss`] if the key is absent or expired.
    pub fn get(&self, key: &str) -> Result<T> {
        self.lookup(key).ok_or(CacheError::Miss)
    }

    // == Get With ==
    /// Returns the cached value for `key`, loading it with `initializer` on a miss.
    ///
    /// The initializer yields the value and its TTL. Concurrent misses on the
    /// same key share a single initializer run; the value is stored before any
    /// caller sees it. An initializer error is returned verbatim to every
    /// waiting caller and nothing is stored.
    ///
    /// The load runs on its own Tokio task: dropping this future stops the
    /// wait, not the load, and the value is still stored when it completes.
    ///
    /// # Errors
    /// - [`CacheError::Initializer`] with the initializer's error
    /// - [`CacheError::InitializerPanicked`] if the initializer panicked
    /// - [`CacheError::NoRuntime`] if called outside a Tokio runtime
    pub async fn get_with<F, Fut>(&self, key: &str, initializer: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<(T, Duration)>> + Send + 'static,
    {
        if let Some(value) = self.lookup(key) {
            return Ok(value);
        }

        let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let store = &self.inner.store;
        let waiter = match self.inner.coordinator.join(key, || store.lookup(key)) {
            Join::Ready(value) => return Ok(value),
            Join::Follower(waiter) => {
                self.inner.stats.record_coalesced();
                waiter
            }
            Join::Leader(slot, waiter) => {
                self.inner.stats.record_load();
                runtime.spawn(load(self.inner.clone(), slot, initializer));
                waiter
            }
        };

        waiter.wait().await
    }

    /// Get with an optional initializer: [`LocalCache::get`] when `None`,
    /// [`LocalCache::get_with`] otherwise.
    pub async fn get_or_miss<F, Fut>(&self, key: &str, initializer: Option<F>) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<(T, Duration)>> + Send + 'static,
    {
        match initializer {
            Some(initializer) => self.get_with(key, initializer).await,
            None => self.get(key),
        }
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl`, replacing any existing entry.
    ///
    /// A zero TTL stores an already expired entry, so the next read misses.
    pub fn set(&self, key: impl Into<String>, value: T, ttl: Duration) {
        self.inner.store.put(key.into(), value, ttl);
    }

    // == Invalidate ==
    /// Removes the entry for `key`. Invalidating an absent key is not an error.
    ///
    /// A load already in flight for the key is unaffected and will still
    /// store its value.
    pub fn invalidate(&self, key: &str) -> Result<()> {
        if self.inner.store.remove(key) {
            self.inner
                .logger
                .debug("entry invalidated", fields! { "key" => key });
        }
        Ok(())
    }

    // == Invalidate All ==
    /// Removes every entry.
    pub fn invalidate_all(&self) -> Result<()> {
        let removed = self.inner.store.clear();
        self.inner
            .logger
            .debug("cache cleared", fields! { "removed" => removed });
        Ok(())
    }

    // == Introspection ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot()
    }

    /// Number of stored entries, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    /// Number of keys with a load in flight.
    pub fn pending_loads(&self) -> usize {
        self.inner.coordinator.pending()
    }

    fn lookup(&self, key: &str) -> Option<T> {
        let value = self.inner.store.lookup(key);
        match value {
            Some(_) => self.inner.stats.record_hit(),
            None => self.inner.stats.record_miss(),
        }
        value
    }
}

/// TTL in whole milliseconds for log fields, saturating for never-expiring TTLs.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}

/// Leader side of a load: runs the initializer, stores a success, publishes.
async fn load<T, F, Fut>(inner: Arc<Inner<T>>, slot: LeaderSlot<T>, initializer: F)
where
    T: Clone + Send + Sync + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<(T, Duration)>> + Send + 'static,
{
    let key = slot.key().to_owned();
    inner.logger.debug("loading entry", fields! { "key" => key.as_str() });

    let outcome = AssertUnwindSafe(async move { initializer().await })
        .catch_unwind()
        .await;

    let result = match outcome {
        Ok(Ok((value, ttl))) => {
            inner.store.put(key.clone(), value.clone(), ttl);
            inner.logger.debug(
                "entry loaded",
                fields! { "key" => key.as_str(), "ttl_ms" => ttl_millis(ttl) },
            );
            Ok(value)
        }
        Ok(Err(err)) => {
            inner.stats.record_load_failure();
            inner.logger.warn(
                "initializer failed",
                fields! { "key" => key.as_str(), "error" => format!("{err:#}") },
            );
            Err(CacheError::Initializer(Arc::new(err)))
        }
        Err(_panic) => {
            inner.stats.record_load_failure();
            let err = CacheError::InitializerPanicked(key.clone());
            inner
                .logger
                .error("initializer panicked", Some(&err), fields! { "key" => key.as_str() });
            Err(err)
        }
    };

    slot.publish(result);
}
