//! Client for the search-counter collaborator.
//!
//! The collaborator persists a popularity counter per search term together
//! with a representative movie, and serves the top entries back for the
//! trending rail. It is treated as an opaque increment/read service; the
//! provider's catalog is never touched here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::fetch::FetchError;
use crate::tmdb::models::Movie;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of entries on the trending rail
pub const DEFAULT_TRENDING_LIMIT: usize = 5;

/// Read-only projection exposed to the view layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingEntry {
  pub id: String,
  pub poster_url: String,
  pub rank: u32,
}

/// Wire record as stored by the collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingRecord {
  pub id: String,
  pub search_term: String,
  pub movie_id: u64,
  #[serde(default)]
  pub poster_url: String,
  pub count: u64,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
}

/// Rank records by position; the collaborator returns them ordered by
/// count, highest first.
pub fn rank_entries(records: Vec<TrendingRecord>) -> Vec<TrendingEntry> {
  records
    .into_iter()
    .enumerate()
    .map(|(index, record)| TrendingEntry {
      id: record.id,
      poster_url: record.poster_url,
      rank: index as u32 + 1,
    })
    .collect()
}

/// HTTP client for the counter service.
#[derive(Clone)]
pub struct TrendingClient {
  client: reqwest::Client,
  base_url: String,
  limit: usize,
}

impl TrendingClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
    let client = reqwest::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| FetchError::Network(e.to_string()))?;

    Ok(Self {
      client,
      base_url: base_url.into().trim_end_matches('/').to_string(),
      limit: DEFAULT_TRENDING_LIMIT,
    })
  }

  /// Number of entries requested from the trending read.
  pub fn with_limit(mut self, limit: usize) -> Self {
    self.limit = limit;
    self
  }

  /// Increment the counter for `term`, keyed with the representative movie.
  pub async fn record_search(&self, term: &str, movie: &Movie) -> Result<(), FetchError> {
    let body = serde_json::json!({
      "search_term": term,
      "movie_id": movie.id,
      "poster_url": movie.poster_url(),
    });

    let response = self
      .client
      .post(format!("{}/searches", self.base_url))
      .json(&body)
      .send()
      .await
      .map_err(|e| FetchError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::HttpStatus {
        status: status.as_u16(),
      });
    }

    debug!(term, movie_id = movie.id, "recorded search count");
    Ok(())
  }

  /// Fetch the top counters as raw JSON, ready for the cache store.
  pub async fn load_trending(&self) -> Result<Value, FetchError> {
    let url = format!("{}/searches/trending?limit={}", self.base_url, self.limit);

    let response = self
      .client
      .get(&url)
      .send()
      .await
      .map_err(|e| FetchError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::HttpStatus {
        status: status.as_u16(),
      });
    }

    let body = response
      .text()
      .await
      .map_err(|e| FetchError::Network(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn records_decode_and_rank_by_position() {
    let records: Vec<TrendingRecord> = serde_json::from_value(json!([
      {"id": "a", "search_term": "batman", "movie_id": 268,
       "poster_url": "https://image.tmdb.org/t/p/w500/x.jpg", "count": 42},
      {"id": "b", "search_term": "dune", "movie_id": 438631,
       "poster_url": "https://image.tmdb.org/t/p/w500/y.jpg", "count": 17,
       "updated_at": "2026-08-01T12:00:00Z"}
    ]))
    .unwrap();

    let entries = rank_entries(records);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].rank, 1);
    assert_eq!(entries[0].id, "a");
    assert_eq!(entries[1].rank, 2);
    assert_eq!(entries[1].poster_url, "https://image.tmdb.org/t/p/w500/y.jpg");
  }
}
