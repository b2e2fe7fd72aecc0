//! In-memory request cache for the data layer.
//!
//! This module provides:
//! - A keyed [`CacheStore`] holding `{data, error, status, fetched_at}` per
//!   request identity, with at-most-one in-flight fetch per key
//! - A [`RevalidatePolicy`] deciding between serving cached data,
//!   stale-while-revalidate, and blocking fetches
//!
//! The store is explicitly owned and injected into coordinators; there is
//! no module-level singleton.

mod policy;
mod store;

pub use policy::{FetchPlan, RevalidatePolicy, Trigger};
pub use store::{CacheStore, EntrySnapshot, QueryKey, QueryStatus, SharedFetch, SubscriptionId};
