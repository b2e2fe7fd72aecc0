//! Cache keys for movie provider queries.

use sha2::{Digest, Sha256};

use crate::cache::QueryKey;

/// Identity of a movie query. Derivable from coordinator inputs alone; two
/// equal keys share one cache entry and one in-flight fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MovieQueryKey {
  /// Full-text search, paginated
  Search { term: String, page: u32 },
  /// Popularity-ordered browsing when the search box is empty
  Discover { page: u32 },
  /// Full detail for one movie
  Details { movie_id: u64 },
  /// Video list for one movie
  Videos { movie_id: u64 },
  /// Recommendations for one movie
  Recommendations { movie_id: u64 },
  /// The trending rail from the search-counter collaborator
  Trending,
}

impl MovieQueryKey {
  /// Key for the search box: an empty settled term browses the discovery
  /// listing instead of searching.
  pub fn for_search(term: &str, page: u32) -> Self {
    let term = term.trim();
    if term.is_empty() {
      Self::Discover { page }
    } else {
      Self::Search {
        term: term.to_string(),
        page,
      }
    }
  }
}

impl QueryKey for MovieQueryKey {
  fn cache_hash(&self) -> String {
    let input = match self {
      Self::Search { term, page } => format!("search:{}:{}", term, page),
      Self::Discover { page } => format!("discover:{}", page),
      Self::Details { movie_id } => format!("details:{}", movie_id),
      Self::Videos { movie_id } => format!("videos:{}", movie_id),
      Self::Recommendations { movie_id } => format!("recommendations:{}", movie_id),
      Self::Trending => "trending".to_string(),
    };

    // SHA256 for stable, fixed-length map keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }

  fn description(&self) -> String {
    match self {
      Self::Search { term, page } => format!("search \"{}\" page {}", term, page),
      Self::Discover { page } => format!("discover page {}", page),
      Self::Details { movie_id } => format!("movie {}", movie_id),
      Self::Videos { movie_id } => format!("videos for movie {}", movie_id),
      Self::Recommendations { movie_id } => format!("recommendations for movie {}", movie_id),
      Self::Trending => "trending searches".to_string(),
    }
  }
}
