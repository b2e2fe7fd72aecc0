//! Debounced search input and bounded pagination.
//!
//! Raw keystrokes never reach the network: a term only settles after the
//! input has been quiet for the configured period, and settling a new term
//! resets the page to 1 before any cache key is derived from the pair.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Quiet period before a raw term settles
pub const QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Inclusive pagination bounds
pub const FIRST_PAGE: u32 = 1;
pub const LAST_PAGE: u32 = 50;

/// Delays propagation of a rapidly-changing search term.
///
/// Every call to [`set_raw_term`](Self::set_raw_term) aborts the pending
/// settle timer and starts a new one, so within a quiet window only the
/// final term survives.
pub struct DebouncedInput {
  raw_term: String,
  quiet_period: Duration,
  tx: mpsc::UnboundedSender<String>,
  pending: Option<JoinHandle<()>>,
}

impl DebouncedInput {
  /// Returns the controller and the receiver on which settled terms
  /// arrive.
  pub fn new(quiet_period: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
      Self {
        raw_term: String::new(),
        quiet_period,
        tx,
        pending: None,
      },
      rx,
    )
  }

  /// The term as typed, updated on every keystroke.
  pub fn raw_term(&self) -> &str {
    &self.raw_term
  }

  /// Record a keystroke and restart the settle timer.
  pub fn set_raw_term(&mut self, term: &str) {
    self.raw_term = term.to_string();
    if let Some(pending) = self.pending.take() {
      pending.abort();
    }

    let tx = self.tx.clone();
    let term = self.raw_term.clone();
    let quiet_period = self.quiet_period;
    self.pending = Some(tokio::spawn(async move {
      tokio::time::sleep(quiet_period).await;
      let _ = tx.send(term);
    }));
  }
}

impl Drop for DebouncedInput {
  fn drop(&mut self) {
    if let Some(pending) = self.pending.take() {
      pending.abort();
    }
  }
}

/// A settled search intent: the pair every search cache key derives from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
  pub term: String,
  pub page: u32,
}

/// Settled-term and pagination state for the search view.
#[derive(Debug, Clone)]
pub struct SearchController {
  settled_term: String,
  page: u32,
}

impl Default for SearchController {
  fn default() -> Self {
    Self::new()
  }
}

impl SearchController {
  pub fn new() -> Self {
    Self {
      settled_term: String::new(),
      page: FIRST_PAGE,
    }
  }

  /// Apply a settled term. A changed term resets the page to the first
  /// page before the query pair is handed out, so a fetch can never
  /// observe a new term with a stale page.
  pub fn settle_term(&mut self, term: String) -> SearchQuery {
    if term != self.settled_term {
      self.page = FIRST_PAGE;
      self.settled_term = term;
    }
    self.query()
  }

  /// Advance one page, clamped to the last page.
  pub fn go_to_next_page(&mut self) -> u32 {
    self.page = (self.page + 1).min(LAST_PAGE);
    self.page
  }

  /// Go back one page, clamped to the first page.
  pub fn go_to_previous_page(&mut self) -> u32 {
    self.page = self.page.saturating_sub(1).max(FIRST_PAGE);
    self.page
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  pub fn settled_term(&self) -> &str {
    &self.settled_term
  }

  /// Current (term, page) pair.
  pub fn query(&self) -> SearchQuery {
    SearchQuery {
      term: self.settled_term.clone(),
      page: self.page.clamp(FIRST_PAGE, LAST_PAGE),
    }
  }
}
