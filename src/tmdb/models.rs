//! Serde models for the movie data provider's responses.

use serde::{Deserialize, Serialize};

/// Image CDN prefix for poster paths
pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// One movie as it appears in search, discovery, and recommendation lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
  pub id: u64,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub original_title: String,
  #[serde(default)]
  pub overview: String,
  #[serde(default)]
  pub poster_path: Option<String>,
  #[serde(default)]
  pub release_date: String,
  #[serde(default)]
  pub vote_average: f64,
  #[serde(default)]
  pub vote_count: u64,
}

impl Movie {
  /// Full poster URL on the provider's image CDN, if the movie has one.
  pub fn poster_url(&self) -> Option<String> {
    self
      .poster_path
      .as_ref()
      .map(|path| format!("{}{}", POSTER_BASE_URL, path))
  }
}

/// One page of a paginated movie listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoviePage {
  #[serde(default)]
  pub page: u32,
  #[serde(default)]
  pub results: Vec<Movie>,
  #[serde(default)]
  pub total_pages: u32,
  #[serde(default)]
  pub total_results: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
  pub id: u64,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionCountry {
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpokenLanguage {
  pub english_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionCompany {
  pub name: String,
}

/// Full movie detail as shown in the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
  pub id: u64,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub original_title: String,
  #[serde(default)]
  pub overview: String,
  #[serde(default)]
  pub tagline: String,
  #[serde(default)]
  pub status: String,
  #[serde(default)]
  pub homepage: Option<String>,
  #[serde(default)]
  pub poster_path: Option<String>,
  #[serde(default)]
  pub release_date: String,
  /// Runtime in minutes
  #[serde(default)]
  pub runtime: u32,
  #[serde(default)]
  pub budget: u64,
  #[serde(default)]
  pub revenue: u64,
  #[serde(default)]
  pub vote_average: f64,
  #[serde(default)]
  pub vote_count: u64,
  #[serde(default)]
  pub genres: Vec<Genre>,
  #[serde(default)]
  pub production_countries: Vec<ProductionCountry>,
  #[serde(default)]
  pub spoken_languages: Vec<SpokenLanguage>,
  #[serde(default)]
  pub production_companies: Vec<ProductionCompany>,
}

/// One entry of a movie's video list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
  #[serde(default)]
  pub name: String,
  pub key: String,
  pub site: String,
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default)]
  pub official: bool,
}

/// Raw response of the videos endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoList {
  #[serde(default)]
  pub results: Vec<Video>,
}

impl VideoList {
  /// First official YouTube trailer, if the list has one.
  pub fn official_trailer(&self) -> Option<&Video> {
    self
      .results
      .iter()
      .find(|v| v.site == "YouTube" && v.kind == "Trailer" && v.official)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn movie_page_tolerates_missing_fields() {
    let page: MoviePage = serde_json::from_value(json!({
      "results": [{"id": 268, "title": "Batman"}]
    }))
    .unwrap();
    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].title, "Batman");
    assert_eq!(page.page, 0);
  }

  #[test]
  fn poster_url_uses_the_image_cdn() {
    let movie: Movie = serde_json::from_value(json!({
      "id": 268, "title": "Batman", "poster_path": "/abc.jpg"
    }))
    .unwrap();
    assert_eq!(
      movie.poster_url().unwrap(),
      "https://image.tmdb.org/t/p/w500/abc.jpg"
    );
  }

  #[test]
  fn official_trailer_picks_the_first_official_youtube_trailer() {
    let list: VideoList = serde_json::from_value(json!({
      "results": [
        {"name": "Teaser", "key": "t1", "site": "YouTube", "type": "Teaser", "official": true},
        {"name": "Fan cut", "key": "t2", "site": "YouTube", "type": "Trailer", "official": false},
        {"name": "Trailer", "key": "t3", "site": "Vimeo", "type": "Trailer", "official": true},
        {"name": "Official", "key": "t4", "site": "YouTube", "type": "Trailer", "official": true},
        {"name": "Second", "key": "t5", "site": "YouTube", "type": "Trailer", "official": true}
      ]
    }))
    .unwrap();
    assert_eq!(list.official_trailer().unwrap().key, "t4");
  }

  #[test]
  fn list_without_official_trailer_yields_none() {
    let list: VideoList = serde_json::from_value(json!({
      "results": [
        {"name": "Clip", "key": "c1", "site": "YouTube", "type": "Clip", "official": true}
      ]
    }))
    .unwrap();
    assert!(list.official_trailer().is_none());

    let empty: VideoList = serde_json::from_value(json!({})).unwrap();
    assert!(empty.official_trailer().is_none());
  }
}
