//! Endpoint construction and raw fetches against the movie data provider.
//!
//! Methods here return unparsed JSON values; typing happens at the
//! coordinator boundary where results come back out of the cache.

use serde_json::Value;

use crate::fetch::{FetchError, Fetcher};

/// Default provider API root
pub const DEFAULT_API_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Thin client over the provider's GET endpoints.
#[derive(Clone)]
pub struct TmdbClient {
  fetcher: Fetcher,
  base_url: String,
}

impl TmdbClient {
  pub fn new(base_url: impl Into<String>, token: &str) -> Result<Self, FetchError> {
    Ok(Self {
      fetcher: Fetcher::new(token)?,
      base_url: base_url.into().trim_end_matches('/').to_string(),
    })
  }

  /// Endpoint for the search box: a non-empty term searches, an empty term
  /// browses by popularity. `page` applies to both.
  fn movies_endpoint(&self, term: &str, page: u32) -> String {
    if term.is_empty() {
      format!(
        "{}/discover/movie?page={}&sort_by=popularity.desc",
        self.base_url, page
      )
    } else {
      let encoded: String = url::form_urlencoded::byte_serialize(term.as_bytes()).collect();
      format!(
        "{}/search/movie?query={}&page={}",
        self.base_url, encoded, page
      )
    }
  }

  pub async fn search_movies(&self, term: &str, page: u32) -> Result<Value, FetchError> {
    let value = self
      .fetcher
      .get_json(&self.movies_endpoint(term, page))
      .await?;
    check_in_band_error(value)
  }

  pub async fn movie_details(&self, movie_id: u64) -> Result<Value, FetchError> {
    let url = format!("{}/movie/{}", self.base_url, movie_id);
    check_in_band_error(self.fetcher.get_json(&url).await?)
  }

  pub async fn movie_videos(&self, movie_id: u64) -> Result<Value, FetchError> {
    let url = format!("{}/movie/{}/videos", self.base_url, movie_id);
    check_in_band_error(self.fetcher.get_json(&url).await?)
  }

  pub async fn movie_recommendations(&self, movie_id: u64) -> Result<Value, FetchError> {
    let url = format!("{}/movie/{}/recommendations", self.base_url, movie_id);
    check_in_band_error(self.fetcher.get_json(&url).await?)
  }
}

/// The provider can signal failure inside a 2xx payload as
/// `{"response": "False", "error": "..."}`. Documented quirk: only
/// object-shaped payloads carry it; arrays are never probed.
fn check_in_band_error(value: Value) -> Result<Value, FetchError> {
  if let Some(object) = value.as_object() {
    if object.get("response").and_then(Value::as_str) == Some("False") {
      let message = object
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("provider reported a failure")
        .to_string();
      return Err(FetchError::Domain(message));
    }
  }
  Ok(value)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn client() -> TmdbClient {
    TmdbClient::new(DEFAULT_API_BASE_URL, "test-token").unwrap()
  }

  #[test]
  fn search_term_builds_the_search_endpoint() {
    assert_eq!(
      client().movies_endpoint("batman", 1),
      "https://api.themoviedb.org/3/search/movie?query=batman&page=1"
    );
  }

  #[test]
  fn empty_term_builds_the_discovery_endpoint() {
    assert_eq!(
      client().movies_endpoint("", 1),
      "https://api.themoviedb.org/3/discover/movie?page=1&sort_by=popularity.desc"
    );
  }

  #[test]
  fn search_terms_are_url_encoded() {
    assert_eq!(
      client().movies_endpoint("the dark knight", 2),
      "https://api.themoviedb.org/3/search/movie?query=the+dark+knight&page=2"
    );
  }

  #[test]
  fn in_band_provider_failure_maps_to_a_domain_error() {
    let err = check_in_band_error(json!({"response": "False", "error": "Movie not found!"}))
      .unwrap_err();
    assert_eq!(err, FetchError::Domain("Movie not found!".to_string()));
  }

  #[test]
  fn ordinary_payloads_pass_through_untouched() {
    let object = json!({"page": 1, "results": []});
    assert_eq!(check_in_band_error(object.clone()).unwrap(), object);

    // Arrays are never probed for the quirk.
    let array = json!([{"response": "False"}]);
    assert_eq!(check_in_band_error(array.clone()).unwrap(), array);
  }
}
