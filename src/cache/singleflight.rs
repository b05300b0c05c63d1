//! Singleflight Coordinator
//!
//! Deduplicates concurrent loads of the same key into a single initializer run.
//!
//! Each in-flight load is a shared oneshot receiver kept in a map keyed by the
//! cache key. The first caller to miss inserts the record and becomes the
//! leader; later callers clone the receiver and wait on it. The map lock is only
//! held while inspecting or mutating the map, never while waiting.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{FutureExt, Shared};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{CacheError, Result};

type LoadChannel<T> = Shared<oneshot::Receiver<Result<T>>>;

type InFlightMap<T> = Arc<Mutex<HashMap<String, InFlight<T>>>>;

struct InFlight<T> {
    id: u64,
    channel: LoadChannel<T>,
}

// == Join Outcome ==
/// What a caller should do after asking the coordinator about a key.
pub enum Join<T> {
    /// The value landed in the store while the caller was queueing.
    Ready(T),
    /// Another caller is already loading; wait for its outcome.
    Follower(Waiter<T>),
    /// This caller owns the load and must publish through the slot.
    Leader(LeaderSlot<T>, Waiter<T>),
}

// == Waiter ==
/// Handle on the outcome of an in-flight load.
///
/// Dropping a waiter abandons the wait without affecting the load itself.
pub struct Waiter<T> {
    key: String,
    channel: LoadChannel<T>,
}

impl<T: Clone> Waiter<T> {
    /// Waits for the leader to publish.
    ///
    /// A leader that disappears without publishing (panic, runtime shutdown)
    /// is reported as [`CacheError::InitializerPanicked`].
    pub async fn wait(self) -> Result<T> {
        match self.channel.await {
            Ok(result) => result,
            Err(_) => Err(CacheError::InitializerPanicked(self.key)),
        }
    }
}

// == Leader Slot ==
/// Exclusive right to publish the outcome for a key.
///
/// Dropping the slot without publishing still clears the in-flight record, and
/// waiters observe the closed channel.
pub struct LeaderSlot<T> {
    guard: InFlightGuard<T>,
    tx: oneshot::Sender<Result<T>>,
}

impl<T> LeaderSlot<T> {
    /// Returns the key this slot is loading.
    pub fn key(&self) -> &str {
        &self.guard.key
    }

    /// Clears the in-flight record, then hands the outcome to every waiter.
    ///
    /// The record goes first so that any caller who has seen the outcome
    /// starts a fresh load on its next miss.
    pub fn publish(self, result: Result<T>) {
        let LeaderSlot { guard, tx } = self;
        drop(guard);
        // Nobody left waiting is fine.
        let _ = tx.send(result);
    }
}

struct InFlightGuard<T> {
    id: u64,
    key: String,
    in_flight: InFlightMap<T>,
}

impl<T> Drop for InFlightGuard<T> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock();
        // Only remove our own record, never a newer leader's.
        if in_flight.get(&self.key).is_some_and(|record| record.id == self.id) {
            in_flight.remove(&self.key);
        }
    }
}

// == Coordinator ==
/// Per-key in-flight tracking for cache loads.
pub struct Coordinator<T> {
    in_flight: InFlightMap<T>,
    next_id: AtomicU64,
}

impl<T> Default for Coordinator<T> {
    fn default() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<T: Clone> Coordinator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    // == Join ==
    /// Joins the in-flight load for `key`, or claims it.
    ///
    /// `recheck` runs under the map lock when no load is in flight. A leader
    /// writes the store before clearing its record, so an empty map plus a
    /// store miss means nobody has produced a value yet.
    pub fn join<F>(&self, key: &str, recheck: F) -> Join<T>
    where
        F: FnOnce() -> Option<T>,
    {
        let mut in_flight = self.in_flight.lock();

        if let Some(record) = in_flight.get(key) {
            return Join::Follower(Waiter {
                key: key.to_owned(),
                channel: record.channel.clone(),
            });
        }

        if let Some(value) = recheck() {
            return Join::Ready(value);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        let channel = rx.shared();

        in_flight.insert(
            key.to_owned(),
            InFlight {
                id,
                channel: channel.clone(),
            },
        );

        let slot = LeaderSlot {
            guard: InFlightGuard {
                id,
                key: key.to_owned(),
                in_flight: self.in_flight.clone(),
            },
            tx,
        };
        let waiter = Waiter {
            key: key.to_owned(),
            channel,
        };

        Join::Leader(slot, waiter)
    }

    /// Returns the number of keys with a load in flight.
    pub fn pending(&self) -> usize {
        self.in_flight.lock().len()
    }
}
