//! HTTP fetcher: one GET per invocation, fixed headers, typed failures.
//!
//! No retry logic lives here. Whether and when a request is re-issued is
//! decided by the revalidation policy; the cache store guarantees the
//! invocation count per key.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default timeout for provider requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Why a fetch failed.
///
/// Clone-able so it can travel through shared in-flight futures and be
/// retained in cache entries alongside prior data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
  /// Transport-level failure (DNS, connect, timeout, body read)
  #[error("network error: {0}")]
  Network(String),

  /// Response arrived with a non-success status
  #[error("request failed with status {status}")]
  HttpStatus { status: u16 },

  /// Response body was not valid JSON
  #[error("invalid response body: {0}")]
  Parse(String),

  /// Provider reported a failure inside a 2xx payload
  #[error("provider error: {0}")]
  Domain(String),
}

/// Minimal JSON-over-HTTP fetcher with a fixed bearer token.
#[derive(Clone)]
pub struct Fetcher {
  client: reqwest::Client,
}

impl Fetcher {
  /// Build a fetcher that sends `Authorization: Bearer <token>` on every
  /// request.
  pub fn new(token: &str) -> Result<Self, FetchError> {
    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
      .map_err(|e| FetchError::Network(format!("invalid bearer token: {}", e)))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let client = reqwest::Client::builder()
      .default_headers(headers)
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| FetchError::Network(e.to_string()))?;

    Ok(Self { client })
  }

  /// Issue a single GET and parse the body as JSON.
  ///
  /// Exactly one network call per invocation; non-2xx becomes
  /// [`FetchError::HttpStatus`], a malformed body [`FetchError::Parse`].
  pub async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
    debug!(url, "fetching");

    let response = self
      .client
      .get(url)
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

  #[test]
  fn error_kinds_render_their_cause() {
    assert_eq!(
      FetchError::HttpStatus { status: 404 }.to_string(),
      "request failed with status 404"
    );
    assert_eq!(
      FetchError::Network("connection refused".into()).to_string(),
      "network error: connection refused"
    );
    assert!(FetchError::Parse("expected value".into())
      .to_string()
      .starts_with("invalid response body"));
  }

  #[test]
  fn errors_are_cloneable_and_comparable() {
    let err = FetchError::Domain("no results".into());
    assert_eq!(err.clone(), err);
  }
}
