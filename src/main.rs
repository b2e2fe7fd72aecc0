use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use moviedex::cache::CacheStore;
use moviedex::config::Config;
use moviedex::search::{FIRST_PAGE, LAST_PAGE};
use moviedex::tmdb::{CachedMovieClient, TmdbClient};
use moviedex::trending::TrendingClient;

#[derive(Parser, Debug)]
#[command(name = "moviedex")]
#[command(about = "Search the movie catalog from the terminal")]
#[command(version)]
struct Args {
  /// Search term; omit to browse the most popular movies
  term: Option<String>,

  /// Result page (1-50)
  #[arg(short, long, default_value_t = 1)]
  page: u32,

  /// Show details, trailer, and recommendations for a movie id instead of
  /// searching
  #[arg(short, long)]
  movie: Option<u64>,

  /// Also print the trending searches rail
  #[arg(short, long)]
  trending: bool,

  /// Path to config file (default: $XDG_CONFIG_HOME/moviedex/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  let _log_guard = init_logging();

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;
  let token = Config::get_api_token()?;

  let store = CacheStore::new();
  let inner = TmdbClient::new(&config.tmdb.base_url, &token)
    .map_err(|e| eyre!("Failed to create provider client: {}", e))?;
  let trending = config
    .trending
    .as_ref()
    .map(|t| TrendingClient::new(&t.url).map(|c| c.with_limit(t.limit)))
    .transpose()
    .map_err(|e| eyre!("Failed to create trending client: {}", e))?;
  let client = CachedMovieClient::new(inner, store, trending);

  if let Some(movie_id) = args.movie {
    return show_movie(&client, movie_id).await;
  }

  if args.trending {
    show_trending(&client).await;
  }

  let term = args.term.unwrap_or_default();
  let page = args.page.clamp(FIRST_PAGE, LAST_PAGE);
  let result = client.search_movies(&term, page).await;

  if let Some(err) = &result.error {
    eprintln!("Error: {}", err);
  }
  if let Some(movies) = result.data {
    println!("Page {}/{}", movies.page, movies.total_pages.min(LAST_PAGE));
    for movie in movies.results {
      let year = movie.release_date.split('-').next().unwrap_or("");
      println!(
        "{:>9}  {} ({})  {:.1}/10",
        movie.id, movie.title, year, movie.vote_average
      );
    }
  }

  Ok(())
}

async fn show_movie(client: &CachedMovieClient, movie_id: u64) -> Result<()> {
  // Three independent queries; one failing never hides the others.
  let details = client.movie_details(movie_id).await;
  let trailer = client.movie_trailer(movie_id).await;
  let recommendations = client.movie_recommendations(movie_id).await;

  if let Some(err) = &details.error {
    eprintln!("Error: {}", err);
  }
  if let Some(details) = details.data {
    println!("{} ({})", details.title, details.release_date);
    if !details.tagline.is_empty() {
      println!("  {}", details.tagline);
    }
    println!(
      "  {:.1}/10 ({} votes), {} min",
      details.vote_average, details.vote_count, details.runtime
    );
    let genres: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
    if !genres.is_empty() {
      println!("  Genres: {}", genres.join(", "));
    }
    if !details.overview.is_empty() {
      println!("\n{}", details.overview);
    }
  }

  match trailer.data.flatten() {
    Some(video) => println!("\nTrailer: https://www.youtube.com/watch?v={}", video.key),
    None => println!("\nNo official trailer available."),
  }

  if let Some(recommended) = recommendations.data {
    if !recommended.results.is_empty() {
      println!("\nRecommended:");
      for movie in recommended.results.iter().take(10) {
        println!("{:>9}  {}", movie.id, movie.title);
      }
    }
  }

  Ok(())
}

async fn show_trending(client: &CachedMovieClient) {
  let trending = client.trending_movies().await;
  if let Some(err) = &trending.error {
    eprintln!("Trending unavailable: {}", err);
  }
  if let Some(entries) = trending.data {
    println!("Trending searches:");
    for entry in entries {
      println!("{:>3}. {}", entry.rank, entry.poster_url);
    }
    println!();
  }
}

fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
  let file = tracing_appender::rolling::never(std::env::temp_dir(), "moviedex.log");
  let (writer, guard) = tracing_appender::non_blocking(file);
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(writer)
    .with_ansi(false)
    .init();
  guard
}
