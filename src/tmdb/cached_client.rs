//! Query coordinators: bind each resource kind to its cache key, endpoint,
//! and revalidation policy.
//!
//! The cache store is injected, not owned globally, so tests and callers
//! control its lifecycle. Details, videos, and recommendations for a movie
//! are three independent queries; a failure in one never suppresses the
//! others.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::warn;

use crate::cache::{CacheStore, RevalidatePolicy, Trigger};
use crate::fetch::FetchError;
use crate::query::{observe, QueryResult};
use crate::trending::{rank_entries, TrendingClient, TrendingEntry, TrendingRecord};

use super::client::TmdbClient;
use super::keys::MovieQueryKey;
use super::models::{MovieDetails, MoviePage, Video, VideoList};

/// Deduping window shared by all provider resources
const DEDUPING_INTERVAL: Duration = Duration::from_secs(60);
/// Catalog data barely changes; search, details, and videos stay fresh for
/// a week
const CATALOG_STALE_TIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);
/// Recommendations churn faster
const RECOMMENDATIONS_STALE_TIME: Duration = Duration::from_secs(30 * 60);
/// Trending counters refresh every ten minutes
const TRENDING_STALE_TIME: Duration = Duration::from_secs(10 * 60);

/// Movie client with transparent caching and revalidation.
///
/// Every method returns a [`QueryResult`]; errors surface there and are
/// never propagated as `Err` into the view layer.
#[derive(Clone)]
pub struct CachedMovieClient {
  inner: TmdbClient,
  store: CacheStore,
  trending: Option<TrendingClient>,
  /// (settled term, first-result id) pairs already counted
  recorded_searches: Arc<Mutex<HashSet<(String, u64)>>>,
}

impl CachedMovieClient {
  /// Build a coordinator set over an injected cache store. Trending is
  /// disabled when no counter collaborator is configured.
  pub fn new(inner: TmdbClient, store: CacheStore, trending: Option<TrendingClient>) -> Self {
    Self {
      inner,
      store,
      trending,
      recorded_searches: Arc::new(Mutex::new(HashSet::new())),
    }
  }

  /// Search movies by term, or browse by popularity when the term is
  /// empty. `page` applies to both.
  pub async fn search_movies(&self, term: &str, page: u32) -> QueryResult<MoviePage> {
    self.search_movies_on(Trigger::Observe, term, page).await
  }

  pub async fn search_movies_on(
    &self,
    trigger: Trigger,
    term: &str,
    page: u32,
  ) -> QueryResult<MoviePage> {
    let term = term.trim().to_string();
    let key = MovieQueryKey::for_search(&term, page);
    let policy = RevalidatePolicy::new(DEDUPING_INTERVAL, CATALOG_STALE_TIME);

    let inner = self.inner.clone();
    let fetch_term = term.clone();
    let result: QueryResult<MoviePage> = observe(&self.store, &key, &policy, trigger, move || {
      async move { inner.search_movies(&fetch_term, page).await }
    })
    .await;

    if let Some(page_data) = &result.data {
      self.record_search(&term, page_data);
    }
    result
  }

  pub async fn movie_details(&self, movie_id: u64) -> QueryResult<MovieDetails> {
    self.movie_details_on(Trigger::Observe, movie_id).await
  }

  pub async fn movie_details_on(
    &self,
    trigger: Trigger,
    movie_id: u64,
  ) -> QueryResult<MovieDetails> {
    let key = MovieQueryKey::Details { movie_id };
    let policy = RevalidatePolicy::new(DEDUPING_INTERVAL, CATALOG_STALE_TIME);
    let inner = self.inner.clone();
    observe(&self.store, &key, &policy, trigger, move || async move {
      inner.movie_details(movie_id).await
    })
    .await
  }

  /// First official YouTube trailer for the movie. A catalog with no such
  /// trailer is an empty result, not an error.
  pub async fn movie_trailer(&self, movie_id: u64) -> QueryResult<Option<Video>> {
    self.movie_trailer_on(Trigger::Observe, movie_id).await
  }

  pub async fn movie_trailer_on(
    &self,
    trigger: Trigger,
    movie_id: u64,
  ) -> QueryResult<Option<Video>> {
    let key = MovieQueryKey::Videos { movie_id };
    let policy = RevalidatePolicy::new(DEDUPING_INTERVAL, CATALOG_STALE_TIME);
    let inner = self.inner.clone();
    let result: QueryResult<VideoList> =
      observe(&self.store, &key, &policy, trigger, move || async move {
        inner.movie_videos(movie_id).await
      })
      .await;
    result.map(|list| list.official_trailer().cloned())
  }

  pub async fn movie_recommendations(&self, movie_id: u64) -> QueryResult<MoviePage> {
    self
      .movie_recommendations_on(Trigger::Observe, movie_id)
      .await
  }

  pub async fn movie_recommendations_on(
    &self,
    trigger: Trigger,
    movie_id: u64,
  ) -> QueryResult<MoviePage> {
    let key = MovieQueryKey::Recommendations { movie_id };
    let policy = RevalidatePolicy::new(DEDUPING_INTERVAL, RECOMMENDATIONS_STALE_TIME);
    let inner = self.inner.clone();
    observe(&self.store, &key, &policy, trigger, move || async move {
      inner.movie_recommendations(movie_id).await
    })
    .await
  }

  /// Top search terms from the counter collaborator, ranked.
  pub async fn trending_movies(&self) -> QueryResult<Vec<TrendingEntry>> {
    self.trending_movies_on(Trigger::Observe).await
  }

  pub async fn trending_movies_on(&self, trigger: Trigger) -> QueryResult<Vec<TrendingEntry>> {
    let Some(trending) = self.trending.clone() else {
      return QueryResult {
        data: None,
        error: Some(FetchError::Domain(
          "search counter collaborator not configured".to_string(),
        )),
        is_loading: false,
      };
    };

    // No deduping window here; only the staleness horizon throttles reads.
    let policy = RevalidatePolicy::new(Duration::ZERO, TRENDING_STALE_TIME);
    let result: QueryResult<Vec<TrendingRecord>> = observe(
      &self.store,
      &MovieQueryKey::Trending,
      &policy,
      trigger,
      move || async move { trending.load_trending().await },
    )
    .await;
    result.map(rank_entries)
  }

  /// Count a successful non-empty search, fire-and-forget.
  ///
  /// The cache can serve the same page many times; the recorded set keeps
  /// the counter from incrementing more than once per
  /// (term, first result) pair.
  fn record_search(&self, term: &str, page: &MoviePage) {
    let Some(trending) = &self.trending else {
      return;
    };
    if term.is_empty() {
      return;
    }
    let Some(first) = page.results.first() else {
      return;
    };
    if !self.mark_recorded(term, first.id) {
      return;
    }

    let trending = trending.clone();
    let term = term.to_string();
    let first = first.clone();
    tokio::spawn(async move {
      if let Err(err) = trending.record_search(&term, &first).await {
        warn!(%err, term, "failed to record search count");
      }
    });
  }

  /// Returns true the first time a (term, movie id) pair is seen.
  fn mark_recorded(&self, term: &str, movie_id: u64) -> bool {
    self
      .recorded_searches
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert((term.to_string(), movie_id))
  }
}
