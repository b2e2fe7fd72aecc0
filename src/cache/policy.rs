//! Revalidation policy: decide whether an observation of a cache entry can
//! be served as-is, needs a background refetch, or must block on the
//! network.

use std::time::{Duration, Instant};

use super::store::{EntrySnapshot, QueryStatus};

/// What caused the cache entry to be consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
  /// A view observed the key (mount / parameter change)
  Observe,
  /// The tab regained focus
  Focus,
  /// The network connection came back
  Reconnect,
  /// Explicit refresh requested by the caller
  Manual,
}

/// Outcome of a policy decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan {
  /// Serve the entry as it is; no network call
  UseCached,
  /// Serve the entry now and refetch in the background
  /// (stale-while-revalidate)
  RevalidateInBackground,
  /// Nothing servable yet; fetch and wait for the result
  FetchBlocking,
}

/// Per-resource revalidation knobs.
#[derive(Debug, Clone, Copy)]
pub struct RevalidatePolicy {
  /// Identical observations within this window never refetch
  pub deduping_interval: Duration,
  /// Entries older than this are served stale and revalidated
  pub stale_time: Duration,
  pub revalidate_on_focus: bool,
  pub revalidate_on_reconnect: bool,
  /// Automatically refetch after a failure. Off for every resource here;
  /// a failed fetch surfaces its error and keeps prior data servable.
  pub retry_on_error: bool,
}

impl RevalidatePolicy {
  /// Policy with the defaults shared by all resource kinds: never
  /// revalidate on focus, always on reconnect, never retry on error.
  pub fn new(deduping_interval: Duration, stale_time: Duration) -> Self {
    Self {
      deduping_interval,
      stale_time,
      revalidate_on_focus: false,
      revalidate_on_reconnect: true,
      retry_on_error: false,
    }
  }

  /// Decide what to do for an observation of `entry` caused by `trigger`.
  pub fn plan(&self, entry: Option<&EntrySnapshot>, trigger: Trigger) -> FetchPlan {
    let Some(entry) = entry else {
      return FetchPlan::FetchBlocking;
    };

    // An in-flight fetch already exists; the store coalesces onto it.
    if entry.status == QueryStatus::Loading {
      return if entry.data.is_some() {
        FetchPlan::UseCached
      } else {
        FetchPlan::FetchBlocking
      };
    }

    match trigger {
      Trigger::Focus => {
        if self.revalidate_on_focus {
          FetchPlan::RevalidateInBackground
        } else {
          FetchPlan::UseCached
        }
      }
      Trigger::Reconnect => {
        if self.revalidate_on_reconnect {
          FetchPlan::RevalidateInBackground
        } else {
          FetchPlan::UseCached
        }
      }
      Trigger::Manual => FetchPlan::RevalidateInBackground,
      Trigger::Observe => self.plan_observation(entry),
    }
  }

  fn plan_observation(&self, entry: &EntrySnapshot) -> FetchPlan {
    if entry.data.is_none() {
      // A failed fetch with nothing to serve: surface the error rather
      // than hammering the provider.
      return if self.retry_on_error {
        FetchPlan::FetchBlocking
      } else {
        FetchPlan::UseCached
      };
    }

    let age = match entry.fetched_at {
      Some(at) => at.elapsed(),
      None => return FetchPlan::RevalidateInBackground,
    };

    if age < self.deduping_interval {
      FetchPlan::UseCached
    } else if age >= self.stale_time {
      FetchPlan::RevalidateInBackground
    } else {
      FetchPlan::UseCached
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fetch::FetchError;
  use std::sync::Arc;

  fn policy() -> RevalidatePolicy {
    RevalidatePolicy::new(Duration::from_secs(60), Duration::from_secs(600))
  }

  fn success_entry(age: Duration) -> EntrySnapshot {
    EntrySnapshot {
      data: Some(Arc::new(serde_json::json!({"page": 1}))),
      error: None,
      status: QueryStatus::Success,
      fetched_at: Some(Instant::now() - age),
    }
  }

  #[test]
  fn missing_entry_blocks_on_the_network() {
    assert_eq!(
      policy().plan(None, Trigger::Observe),
      FetchPlan::FetchBlocking
    );
  }

  #[test]
  fn entry_within_deduping_interval_is_served_without_a_call() {
    let entry = success_entry(Duration::from_secs(1));
    assert_eq!(
      policy().plan(Some(&entry), Trigger::Observe),
      FetchPlan::UseCached
    );
  }

  #[test]
  fn entry_between_deduping_and_stale_is_served_without_a_call() {
    let entry = success_entry(Duration::from_secs(120));
    assert_eq!(
      policy().plan(Some(&entry), Trigger::Observe),
      FetchPlan::UseCached
    );
  }

  #[test]
  fn entry_older_than_stale_time_revalidates_in_background() {
    let entry = success_entry(Duration::from_secs(601));
    assert_eq!(
      policy().plan(Some(&entry), Trigger::Observe),
      FetchPlan::RevalidateInBackground
    );
  }

  #[test]
  fn focus_never_refetches_when_disabled() {
    let entry = success_entry(Duration::from_secs(601));
    assert_eq!(
      policy().plan(Some(&entry), Trigger::Focus),
      FetchPlan::UseCached
    );
  }

  #[test]
  fn reconnect_refetches_when_enabled() {
    let entry = success_entry(Duration::from_secs(1));
    assert_eq!(
      policy().plan(Some(&entry), Trigger::Reconnect),
      FetchPlan::RevalidateInBackground
    );
  }

  #[test]
  fn manual_trigger_always_revalidates() {
    let entry = success_entry(Duration::from_secs(1));
    assert_eq!(
      policy().plan(Some(&entry), Trigger::Manual),
      FetchPlan::RevalidateInBackground
    );
  }

  #[test]
  fn error_without_data_is_not_retried() {
    let entry = EntrySnapshot {
      data: None,
      error: Some(FetchError::HttpStatus { status: 500 }),
      status: QueryStatus::Error,
      fetched_at: Some(Instant::now()),
    };
    assert_eq!(
      policy().plan(Some(&entry), Trigger::Observe),
      FetchPlan::UseCached
    );
  }

  #[test]
  fn loading_entry_with_prior_data_is_served_while_the_fetch_runs() {
    let mut entry = success_entry(Duration::from_secs(1));
    entry.status = QueryStatus::Loading;
    assert_eq!(
      policy().plan(Some(&entry), Trigger::Observe),
      FetchPlan::UseCached
    );
  }

  #[test]
  fn loading_entry_without_data_attaches_to_the_in_flight_fetch() {
    let entry = EntrySnapshot {
      data: None,
      error: None,
      status: QueryStatus::Loading,
      fetched_at: None,
    };
    assert_eq!(
      policy().plan(Some(&entry), Trigger::Observe),
      FetchPlan::FetchBlocking
    );
  }
}
