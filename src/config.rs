use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::tmdb::DEFAULT_API_BASE_URL;
use crate::trending::DEFAULT_TRENDING_LIMIT;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub tmdb: TmdbConfig,
  /// Search-counter collaborator; trending is disabled when absent
  pub trending: Option<TrendingConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbConfig {
  /// Provider API root
  #[serde(default = "default_base_url")]
  pub base_url: String,
}

impl Default for TmdbConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
    }
  }
}

fn default_base_url() -> String {
  DEFAULT_API_BASE_URL.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendingConfig {
  /// Base URL of the counter service
  pub url: String,
  /// Number of entries on the trending rail
  #[serde(default = "default_trending_limit")]
  pub limit: usize,
}

fn default_trending_limit() -> usize {
  DEFAULT_TRENDING_LIMIT
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./moviedex.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/moviedex/config.yaml
  ///
  /// Every setting has a default, so a missing config file is not an
  /// error; an explicitly given path that does not exist is.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("moviedex.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("moviedex").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the provider API token from environment variables.
  ///
  /// Checks MOVIEDEX_TMDB_TOKEN first, then TMDB_API_TOKEN as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("MOVIEDEX_TMDB_TOKEN")
      .or_else(|_| std::env::var("TMDB_API_TOKEN"))
      .map_err(|_| {
        eyre!(
          "Provider API token not found. Set MOVIEDEX_TMDB_TOKEN or TMDB_API_TOKEN environment variable."
        )
      })
  }
}
