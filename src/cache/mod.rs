//! Cache Module
//!
//! Provides in-process caching with lazy TTL expiration and singleflight loading.
//!
//! Only the façade is public; the entry store and load coordination stay
//! internal:
//!
//! ```compile_fail
//! use localcache::cache::EntryStore;
//! ```
//!
//! ```compile_fail
//! use localcache::cache::Coordinator;
//! ```

mod entry;
mod local;
mod singleflight;
mod stats;
mod store;


// Re-export public types
pub use local::{LocalCache, LocalCacheBuilder, DEFAULT_CACHE_NAME};
pub use stats::CacheStats;

pub(crate) use entry::CacheEntry;
pub(crate) use store::EntryStore;
