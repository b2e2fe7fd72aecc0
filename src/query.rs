//! Observing cache keys as `{data, is_loading, error}` query results.
//!
//! This is the seam between the cache core and the presentation layer: a
//! coordinator derives a key, picks a policy, and calls [`observe`]; the
//! returned [`QueryResult`] is everything a view needs. Errors never escape
//! as panics or bubbled `Result`s — they surface in the result next to
//! whatever prior data is still servable.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use tracing::debug;

use crate::cache::{CacheStore, EntrySnapshot, FetchPlan, QueryKey, QueryStatus, RevalidatePolicy, Trigger};
use crate::fetch::FetchError;

/// What one query exposes to the view layer.
#[derive(Debug, Clone)]
pub struct QueryResult<T> {
  pub data: Option<T>,
  pub error: Option<FetchError>,
  pub is_loading: bool,
}

impl<T> QueryResult<T> {
  /// Transform the data while keeping error/loading state.
  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryResult<U> {
    QueryResult {
      data: self.data.map(f),
      error: self.error,
      is_loading: self.is_loading,
    }
  }
}

/// Observe `key` through the store under `policy`.
///
/// Depending on the plan this either serves the cached entry as-is, serves
/// it while kicking off a background revalidation, or awaits a blocking
/// fetch. The `fetcher` is only invoked when a network call is actually
/// needed and no fetch for the key is already in flight.
pub async fn observe<K, T, F, Fut>(
  store: &CacheStore,
  key: &K,
  policy: &RevalidatePolicy,
  trigger: Trigger,
  fetcher: F,
) -> QueryResult<T>
where
  K: QueryKey + ?Sized,
  T: DeserializeOwned,
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
{
  let hash = key.cache_hash();
  let snapshot = store.snapshot(&hash);

  match policy.plan(snapshot.as_ref(), trigger) {
    FetchPlan::UseCached => from_snapshot(snapshot),
    FetchPlan::RevalidateInBackground => {
      debug!(query = %key.description(), "serving cached data, revalidating in background");
      let _in_flight = store.get_or_create_in_flight(&hash, fetcher);
      from_snapshot(snapshot)
    }
    FetchPlan::FetchBlocking => {
      debug!(query = %key.description(), "fetching");
      match store.get_or_create_in_flight(&hash, fetcher).await {
        Ok(value) => match decode(&value) {
          Ok(data) => QueryResult {
            data: Some(data),
            error: None,
            is_loading: false,
          },
          Err(err) => QueryResult {
            data: None,
            error: Some(err),
            is_loading: false,
          },
        },
        Err(err) => QueryResult {
          data: None,
          error: Some(err),
          is_loading: false,
        },
      }
    }
  }
}

fn from_snapshot<T: DeserializeOwned>(snapshot: Option<EntrySnapshot>) -> QueryResult<T> {
  let Some(snapshot) = snapshot else {
    return QueryResult {
      data: None,
      error: None,
      is_loading: false,
    };
  };

  let mut error = snapshot.error;
  let data = snapshot.data.and_then(|value| match decode(&value) {
    Ok(data) => Some(data),
    Err(err) => {
      error.get_or_insert(err);
      None
    }
  });

  QueryResult {
    data,
    error,
    is_loading: snapshot.status == QueryStatus::Loading,
  }
}

fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, FetchError> {
  serde_json::from_value(value.clone()).map_err(|e| FetchError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;
  use std::time::Duration;

  struct TestKey(&'static str);

  impl QueryKey for TestKey {
    fn cache_hash(&self) -> String {
      self.0.to_string()
    }

    fn description(&self) -> String {
      self.0.to_string()
    }
  }

  fn counted_fetcher(
    calls: Arc<AtomicU32>,
    value: Value,
  ) -> impl FnOnce() -> futures::future::BoxFuture<'static, Result<Value, FetchError>> {
    use futures::FutureExt;
    move || {
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
      }
      .boxed()
    }
  }

  #[tokio::test]
  async fn first_observation_blocks_and_returns_decoded_data() {
    let store = CacheStore::new();
    let policy = RevalidatePolicy::new(Duration::from_secs(60), Duration::from_secs(600));
    let calls = Arc::new(AtomicU32::new(0));

    let result: QueryResult<Value> = observe(
      &store,
      &TestKey("movies"),
      &policy,
      Trigger::Observe,
      counted_fetcher(calls.clone(), json!({"results": ["batman"]})),
    )
    .await;

    assert_eq!(result.data, Some(json!({"results": ["batman"]})));
    assert!(result.error.is_none());
    assert!(!result.is_loading);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn fresh_entry_is_served_without_a_second_call() {
    let store = CacheStore::new();
    let policy = RevalidatePolicy::new(Duration::from_secs(60), Duration::from_secs(600));
    let calls = Arc::new(AtomicU32::new(0));

    for _ in 0..3 {
      let result: QueryResult<Value> = observe(
        &store,
        &TestKey("movies"),
        &policy,
        Trigger::Observe,
        counted_fetcher(calls.clone(), json!(1)),
      )
      .await;
      assert_eq!(result.data, Some(json!(1)));
      tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn stale_entry_is_served_synchronously_with_one_background_refetch() {
    let store = CacheStore::new();
    // Everything is immediately stale.
    let policy = RevalidatePolicy::new(Duration::ZERO, Duration::ZERO);
    let calls = Arc::new(AtomicU32::new(0));

    let first: QueryResult<Value> = observe(
      &store,
      &TestKey("movies"),
      &policy,
      Trigger::Observe,
      counted_fetcher(calls.clone(), json!("old")),
    )
    .await;
    assert_eq!(first.data, Some(json!("old")));
    tokio::time::sleep(Duration::from_millis(5)).await;

    // Served from cache immediately; the refetch happens behind it.
    let second: QueryResult<Value> = observe(
      &store,
      &TestKey("movies"),
      &policy,
      Trigger::Observe,
      counted_fetcher(calls.clone(), json!("new")),
    )
    .await;
    assert_eq!(second.data, Some(json!("old")));

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let third: QueryResult<Value> = observe(
      &store,
      &TestKey("movies"),
      &policy,
      Trigger::Observe,
      counted_fetcher(calls.clone(), json!("unused")),
    )
    .await;
    assert_eq!(third.data, Some(json!("new")));
  }

  #[tokio::test]
  async fn failed_revalidation_keeps_prior_data_and_surfaces_the_error() {
    let store = CacheStore::new();
    let policy = RevalidatePolicy::new(Duration::from_secs(60), Duration::ZERO);
    let calls = Arc::new(AtomicU32::new(0));

    let _: QueryResult<Value> = observe(
      &store,
      &TestKey("movies"),
      &policy,
      Trigger::Observe,
      counted_fetcher(calls.clone(), json!("good")),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    // Manual trigger forces a revalidation that fails.
    let _: QueryResult<Value> = observe(
      &store,
      &TestKey("movies"),
      &policy,
      Trigger::Manual,
      || async { Err(FetchError::HttpStatus { status: 503 }) },
    )
    .await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    // No automatic retry; the error rides along with the prior data.
    let result: QueryResult<Value> = observe(
      &store,
      &TestKey("movies"),
      &policy,
      Trigger::Observe,
      counted_fetcher(calls.clone(), json!("unused")),
    )
    .await;
    assert_eq!(result.data, Some(json!("good")));
    assert_eq!(result.error, Some(FetchError::HttpStatus { status: 503 }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn undecodable_cached_value_surfaces_a_parse_error() {
    let store = CacheStore::new();
    let policy = RevalidatePolicy::new(Duration::from_secs(60), Duration::from_secs(600));

    #[derive(Debug, serde::Deserialize)]
    struct Expected {
      #[allow(dead_code)]
      page: u32,
    }

    let result: QueryResult<Expected> = observe(
      &store,
      &TestKey("movies"),
      &policy,
      Trigger::Observe,
      || async { Ok(json!("not an object")) },
    )
    .await;
    assert!(result.data.is_none());
    assert!(matches!(result.error, Some(FetchError::Parse(_))));
  }
}
