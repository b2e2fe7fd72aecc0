//! Client-side data layer for a movie catalog browser.
//!
//! The interesting part of this crate is the fetch/cache core: turning user
//! intent (a search term, a page number, a selected movie id) into
//! deduplicated, cached, revalidating requests against the movie data
//! provider, and reconciling overlapping requests as input changes.
//!
//! - [`cache`] — keyed cache store with request coalescing, plus the
//!   revalidation policy engine (stale-while-revalidate).
//! - [`query`] — observe a cache key through a policy and get back
//!   `{data, is_loading, error}` for the presentation layer.
//! - [`tmdb`] — the movie provider adapter: endpoints, models, and the
//!   per-resource query coordinators.
//! - [`trending`] — the search-counter collaborator (popularity counters
//!   behind the trending list).
//! - [`search`] — debounced search input and bounded pagination.

pub mod cache;
pub mod config;
pub mod fetch;
pub mod query;
pub mod search;
pub mod tmdb;
pub mod trending;

pub use cache::{CacheStore, QueryKey, RevalidatePolicy, Trigger};
pub use fetch::FetchError;
pub use query::QueryResult;
