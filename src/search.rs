//! Incremental search session: debounce, stale-response fencing, and the
//! local/remote dispatch split.
//!
//! The session is a pure state machine. The embedding event loop feeds it
//! keystrokes and timestamps, executes the [`SearchJob`]s it emits, and
//! hands the outcomes back through [`SearchSession::apply`]. Nothing here
//! touches the network, which keeps every ordering property testable.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::api::{ApiError, PoetryDb};
use crate::authors::AuthorIndex;
use crate::model::{SearchMode, SearchResult};

/// Queries shorter than this never touch the network.
pub const MIN_QUERY_CHARS: usize = 2;

/// Preview lists are capped regardless of upstream count.
pub const PREVIEW_LIMIT: usize = 5;

/// Quiet period after the last keystroke before a query runs.
pub const QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Single-shot cancellable timer for keystroke debouncing.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Starts (or restarts) the quiet period at `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the pending evaluation is due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true exactly once per scheduled deadline, once it has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// A remote evaluation the session wants run.
///
/// `seq` fences stale completions: the session only admits an outcome whose
/// sequence number is still the latest issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchJob {
    pub seq: u64,
    pub mode: SearchMode,
    pub query: String,
}

/// Executes a remote search job against the preview endpoints.
pub async fn run_search_job(
    client: &PoetryDb,
    job: &SearchJob,
) -> Result<Vec<SearchResult>, ApiError> {
    let poems = match job.mode {
        SearchMode::Title => client.title_preview(&job.query).await?,
        SearchMode::Lines => client.lines_preview(&job.query).await?,
        // Author mode is answered locally and never emitted as a job.
        SearchMode::Author => Vec::new(),
    };
    Ok(poems
        .into_iter()
        .take(PREVIEW_LIMIT)
        .map(SearchResult::from_poem)
        .collect())
}

/// What the widget should currently render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Query too short; prompt for input.
    Idle,
    /// Quiet period or request in flight.
    Loading,
    /// Results available.
    Shown,
    /// Query completed with nothing to show.
    NoResults,
    /// Request failed; message available via `error()`.
    Errored,
}

/// State for one open search widget.
///
/// Created when the widget opens, discarded when it closes; nothing
/// persists across open/close cycles.
pub struct SearchSession {
    authors: Arc<AuthorIndex>,
    query: String,
    mode: SearchMode,
    results: Vec<SearchResult>,
    loading: bool,
    error: Option<String>,
    debounce: Debouncer,
    seq: u64,
}

impl SearchSession {
    pub fn new(authors: Arc<AuthorIndex>) -> Self {
        Self::with_quiet_period(authors, QUIET_PERIOD)
    }

    /// Same machine with a custom quiet period. Tests use a short one.
    pub fn with_quiet_period(authors: Arc<AuthorIndex>, quiet: Duration) -> Self {
        Self {
            authors,
            query: String::new(),
            mode: SearchMode::default(),
            results: Vec::new(),
            loading: false,
            error: None,
            debounce: Debouncer::new(quiet),
            seq: 0,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// True once the query is long enough for "view all results".
    pub fn can_view_all(&self) -> bool {
        self.query.chars().count() >= MIN_QUERY_CHARS
    }

    /// Next instant at which [`SearchSession::poll`] may have work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Errored
        } else if !self.results.is_empty() {
            Phase::Shown
        } else if self.can_view_all() {
            Phase::NoResults
        } else {
            Phase::Idle
        }
    }

    /// Replaces the query text, as of `now`.
    pub fn set_query(&mut self, text: impl Into<String>, now: Instant) {
        self.query = text.into();
        self.evaluate(now);
    }

    pub fn push_char(&mut self, ch: char, now: Instant) {
        self.query.push(ch);
        self.evaluate(now);
    }

    pub fn backspace(&mut self, now: Instant) {
        self.query.pop();
        self.evaluate(now);
    }

    /// Switches the active mode and re-evaluates the current text.
    pub fn set_mode(&mut self, mode: SearchMode, now: Instant) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.results.clear();
        self.evaluate(now);
    }

    /// Clears all widget state (Closed→Open transition, or selection).
    pub fn reset(&mut self) {
        self.query.clear();
        self.results.clear();
        self.loading = false;
        self.error = None;
        self.debounce.cancel();
        // Anything still in flight belongs to the closed widget.
        self.seq += 1;
    }

    fn evaluate(&mut self, now: Instant) {
        // Input changed, so any outstanding evaluation or response is stale.
        self.seq += 1;
        if self.query.chars().count() < MIN_QUERY_CHARS {
            self.results.clear();
            self.loading = false;
            self.debounce.cancel();
            return;
        }
        self.loading = true;
        self.error = None;
        self.debounce.schedule(now);
    }

    /// Drives the debounce clock. Call whenever the deadline may have
    /// passed; returns a job when a remote evaluation is due. Author-mode
    /// evaluations are answered inline from the local index.
    pub fn poll(&mut self, now: Instant) -> Option<SearchJob> {
        if !self.debounce.fire(now) {
            return None;
        }
        self.seq += 1;
        match self.mode {
            SearchMode::Author => {
                self.results = self
                    .authors
                    .filter(&self.query, PREVIEW_LIMIT)
                    .into_iter()
                    .map(SearchResult::author_entry)
                    .collect();
                self.loading = false;
                self.error = None;
                None
            }
            SearchMode::Title | SearchMode::Lines => Some(SearchJob {
                seq: self.seq,
                mode: self.mode,
                query: self.query.clone(),
            }),
        }
    }

    /// Admits the outcome of a dispatched job.
    ///
    /// Outcomes carrying a sequence number other than the latest issued are
    /// dropped: network completion order is not issue order, and a stale
    /// response must never overwrite a newer one.
    pub fn apply(&mut self, seq: u64, outcome: Result<Vec<SearchResult>, String>) {
        if seq != self.seq {
            return;
        }
        self.loading = false;
        match outcome {
            Ok(mut results) => {
                results.truncate(PREVIEW_LIMIT);
                self.results = results;
                self.error = None;
            }
            Err(message) => {
                self.error = Some(message);
                self.results.clear();
            }
        }
    }
}
