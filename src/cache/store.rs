//! Keyed in-memory cache with per-key request coalescing.
//!
//! Each entry tracks `{data, error, status, fetched_at}` plus an optional
//! shared handle to an in-flight fetch. Concurrent callers for the same key
//! attach to that handle instead of issuing a second network call; a settled
//! fetch is written back only while its handle is still the entry's current
//! one, so superseded results are discarded rather than applied.

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::debug;

use crate::fetch::FetchError;

/// Identity of a logical query, used for cache lookup and coalescing.
///
/// Must be deterministically derivable from the coordinator's inputs alone:
/// two requests with equal hashes are the same cache entry.
pub trait QueryKey {
  /// Stable hash used as the cache map key.
  fn cache_hash(&self) -> String;

  /// Human-readable description for logging.
  fn description(&self) -> String;
}

/// Lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  Idle,
  Loading,
  Success,
  Error,
}

/// Shared handle to an in-flight fetch. Everyone awaiting it observes the
/// same settled result.
pub type SharedFetch = Shared<BoxFuture<'static, Result<Arc<Value>, FetchError>>>;

/// Point-in-time view of a cache entry, handed to readers and subscribers.
#[derive(Debug, Clone)]
pub struct EntrySnapshot {
  pub data: Option<Arc<Value>>,
  pub error: Option<FetchError>,
  pub status: QueryStatus,
  pub fetched_at: Option<Instant>,
}

impl EntrySnapshot {
  fn idle() -> Self {
    Self {
      data: None,
      error: None,
      status: QueryStatus::Idle,
      fetched_at: None,
    }
  }
}

struct CacheEntry {
  data: Option<Arc<Value>>,
  error: Option<FetchError>,
  status: QueryStatus,
  fetched_at: Option<Instant>,
  in_flight: Option<InFlight>,
}

struct InFlight {
  /// Identity of this fetch; write-back applies only while it matches.
  token: u64,
  future: SharedFetch,
}

impl CacheEntry {
  fn empty() -> Self {
    Self {
      data: None,
      error: None,
      status: QueryStatus::Idle,
      fetched_at: None,
      in_flight: None,
    }
  }

  fn snapshot(&self) -> EntrySnapshot {
    EntrySnapshot {
      data: self.data.clone(),
      error: self.error.clone(),
      status: self.status,
      fetched_at: self.fetched_at,
    }
  }
}

type SubscriberFn = Arc<dyn Fn(&EntrySnapshot) + Send + Sync>;

/// Handle returned by [`CacheStore::subscribe`]; pass it back to
/// [`CacheStore::unsubscribe`]. Unsubscribing twice is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

struct Inner {
  entries: HashMap<String, CacheEntry>,
  subscribers: HashMap<String, Vec<(u64, SubscriberFn)>>,
  next_token: u64,
  next_subscriber: u64,
}

/// The single shared mutable resource of the data layer.
///
/// Cheap to clone; clones share the same entries. All mutation funnels
/// through [`get_or_create_in_flight`](Self::get_or_create_in_flight) and
/// [`invalidate`](Self::invalidate). The internal lock is only held for map
/// access, never across an await.
#[derive(Clone)]
pub struct CacheStore {
  inner: Arc<Mutex<Inner>>,
}

impl Default for CacheStore {
  fn default() -> Self {
    Self::new()
  }
}

impl CacheStore {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(Mutex::new(Inner {
        entries: HashMap::new(),
        subscribers: HashMap::new(),
        next_token: 0,
        next_subscriber: 0,
      })),
    }
  }

  fn locked(&self) -> MutexGuard<'_, Inner> {
    // Map updates never panic midway, so a poisoned lock still holds
    // consistent state.
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Current view of the entry for `key`, if any.
  pub fn snapshot(&self, key: &str) -> Option<EntrySnapshot> {
    self.locked().entries.get(key).map(CacheEntry::snapshot)
  }

  /// Return the in-flight fetch for `key`, starting one with `producer` if
  /// none exists.
  ///
  /// This is the at-most-one-concurrent-request guarantee: if the entry
  /// already has a fetch in flight, its shared handle is returned and
  /// `producer` is never called. Otherwise the produced future is spawned,
  /// the entry transitions to `Loading` (prior data retained), and on
  /// settling the result is written back with `fetched_at = now` — unless
  /// the entry was invalidated or replaced in the meantime.
  ///
  /// `producer` only builds the future; it must not call back into the
  /// store synchronously.
  pub fn get_or_create_in_flight<F, Fut>(&self, key: &str, producer: F) -> SharedFetch
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
  {
    let (token, future, snapshot, subscribers) = {
      let mut inner = self.locked();

      if let Some(entry) = inner.entries.get(key) {
        if let Some(in_flight) = &entry.in_flight {
          debug!(key, "coalescing onto in-flight fetch");
          return in_flight.future.clone();
        }
      }

      let token = inner.next_token;
      inner.next_token += 1;

      let future: SharedFetch = producer().map(|r| r.map(Arc::new)).boxed().shared();

      let entry = inner
        .entries
        .entry(key.to_string())
        .or_insert_with(CacheEntry::empty);
      entry.status = QueryStatus::Loading;
      entry.in_flight = Some(InFlight {
        token,
        future: future.clone(),
      });
      let snapshot = entry.snapshot();
      let subscribers = inner.subscriber_callbacks(key);
      (token, future, snapshot, subscribers)
    };

    for callback in &subscribers {
      callback(&snapshot);
    }

    // Drive the fetch to completion and write the result back.
    let store = self.clone();
    let owned_key = key.to_string();
    let write_back = future.clone();
    tokio::spawn(async move {
      let result = write_back.await;
      store.apply(&owned_key, token, result);
    });

    future
  }

  /// Remove the entry for `key`, forcing the next access to refetch.
  ///
  /// An in-flight fetch for the key is allowed to complete, but its result
  /// will no longer match the entry and is discarded on arrival.
  pub fn invalidate(&self, key: &str) {
    let subscribers = {
      let mut inner = self.locked();
      if inner.entries.remove(key).is_none() {
        return;
      }
      inner.subscriber_callbacks(key)
    };

    debug!(key, "invalidated cache entry");
    let snapshot = EntrySnapshot::idle();
    for callback in &subscribers {
      callback(&snapshot);
    }
  }

  /// Register `callback` to run on every status transition for `key`.
  pub fn subscribe<F>(&self, key: &str, callback: F) -> SubscriptionId
  where
    F: Fn(&EntrySnapshot) + Send + Sync + 'static,
  {
    let mut inner = self.locked();
    let id = inner.next_subscriber;
    inner.next_subscriber += 1;
    inner
      .subscribers
      .entry(key.to_string())
      .or_default()
      .push((id, Arc::new(callback)));
    SubscriptionId(id)
  }

  /// Remove a subscription. Unknown or already-removed ids are ignored.
  pub fn unsubscribe(&self, id: SubscriptionId) {
    let mut inner = self.locked();
    for list in inner.subscribers.values_mut() {
      list.retain(|(existing, _)| *existing != id.0);
    }
    inner.subscribers.retain(|_, list| !list.is_empty());
  }

  /// Write back a settled fetch, unless it has been superseded.
  fn apply(&self, key: &str, token: u64, result: Result<Arc<Value>, FetchError>) {
    let (snapshot, subscribers) = {
      let mut inner = self.locked();
      let Some(entry) = inner.entries.get_mut(key) else {
        debug!(key, "discarding result for invalidated key");
        return;
      };
      match &entry.in_flight {
        Some(in_flight) if in_flight.token == token => {}
        _ => {
          debug!(key, "discarding superseded fetch result");
          return;
        }
      }

      entry.in_flight = None;
      entry.fetched_at = Some(Instant::now());
      match result {
        Ok(data) => {
          entry.data = Some(data);
          entry.error = None;
          entry.status = QueryStatus::Success;
        }
        Err(err) => {
          // Prior success data stays servable next to the error.
          entry.error = Some(err);
          entry.status = QueryStatus::Error;
        }
      }
      let snapshot = entry.snapshot();
      let subscribers = inner.subscriber_callbacks(key);
      (snapshot, subscribers)
    };

    for callback in &subscribers {
      callback(&snapshot);
    }
  }
}

impl Inner {
  fn subscriber_callbacks(&self, key: &str) -> Vec<SubscriberFn> {
    self
      .subscribers
      .get(key)
      .map(|list| list.iter().map(|(_, cb)| cb.clone()).collect())
      .unwrap_or_default()
  }
}
