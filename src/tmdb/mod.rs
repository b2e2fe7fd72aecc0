//! Movie data provider adapter: endpoints, serde models, cache keys, and
//! the cached query coordinators.

mod cached_client;
pub mod client;
pub mod keys;
pub mod models;

pub use cached_client::CachedMovieClient;
pub use client::{TmdbClient, DEFAULT_API_BASE_URL};
pub use keys::MovieQueryKey;
