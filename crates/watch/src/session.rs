//! Scan overlay session.
//!
//! An [`OverlaySession`] owns everything one overlay opening needs: the
//! loaded website list, the one-shot scan trigger guard, the merged
//! results and every in-flight request. Polls run on a fixed interval and
//! never wait for the previous fetch, so responses can overlap; they are
//! applied in the order they resolve.
//!
//! Closing or dropping the session cancels its token and aborts all tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use deepguard_core::merge::{progress_percent, MergedResults, SiteStatus};
use deepguard_core::results::ScanSummary;

use crate::client::{ResultsSnapshot, ScanApi};
use crate::error::WatchError;

/// Lifecycle of one overlay opening.
#[derive(Debug)]
pub enum SessionState {
    /// Website list not fetched yet.
    Loading,
    /// The website list could not be fetched. Terminal.
    Error(String),
    Ready(ReadyState),
}

/// State shown while the overlay is open and polling.
#[derive(Debug, Default)]
pub struct ReadyState {
    websites: Vec<String>,
    scan_started: bool,
    merged: MergedResults,
    summary: ScanSummary,
}

impl ReadyState {
    pub fn websites(&self) -> &[String] {
        &self.websites
    }

    /// Whether the global scan has been requested in this session.
    pub fn scan_started(&self) -> bool {
        self.scan_started
    }

    pub fn merged(&self) -> &MergedResults {
        &self.merged
    }

    /// Summary from the most recently applied poll.
    pub fn summary(&self) -> &ScanSummary {
        &self.summary
    }

    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.summary.total_scanned, self.websites.len())
    }

    /// Listed sites in order, each with its derived status.
    pub fn site_statuses(&self) -> impl Iterator<Item = (&str, SiteStatus)> + '_ {
        self.websites
            .iter()
            .map(|site| (site.as_str(), self.merged.status_of(site)))
    }

    fn apply(&mut self, snapshot: ResultsSnapshot) {
        self.merged.merge_all(snapshot.all_results);
        self.summary = snapshot.summary;
    }
}

/// Result of one spawned request.
enum TaskOutcome {
    ScanRequested(Result<(), WatchError>),
    Results(Result<ResultsSnapshot, WatchError>),
    Cancelled,
}

/// One open scan overlay.
pub struct OverlaySession<A: ScanApi> {
    api: Arc<A>,
    poll_interval: Duration,
    state: SessionState,
    cancel: CancellationToken,
    tasks: JoinSet<TaskOutcome>,
}

impl<A: ScanApi> OverlaySession<A> {
    pub fn new(api: Arc<A>, poll_interval: Duration) -> Self {
        Self {
            api,
            poll_interval,
            state: SessionState::Loading,
            cancel: CancellationToken::new(),
            tasks: JoinSet::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn ready(&self) -> Option<&ReadyState> {
        match &self.state {
            SessionState::Ready(ready) => Some(ready),
            _ => None,
        }
    }

    /// Token that ends [`run`](Self::run) when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Requests spawned and not yet applied.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Fetch the website list and leave `Loading`.
    ///
    /// On success the session becomes `Ready` and the global scan is
    /// requested in the background. Calling this again after leaving
    /// `Loading` does nothing.
    pub async fn open(&mut self) -> &SessionState {
        if !matches!(self.state, SessionState::Loading) {
            return &self.state;
        }

        match self.api.fetch_websites().await {
            Ok(websites) => {
                tracing::info!(count = websites.len(), "Website list loaded");
                self.state = SessionState::Ready(ReadyState {
                    websites,
                    ..ReadyState::default()
                });
                self.request_scan_once();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load website list");
                self.state = SessionState::Error(e.to_string());
            }
        }

        &self.state
    }

    fn request_scan_once(&mut self) {
        let SessionState::Ready(ready) = &mut self.state else {
            return;
        };
        if ready.scan_started {
            return;
        }
        ready.scan_started = true;

        let api = Arc::clone(&self.api);
        let cancel = self.cancel.clone();
        self.tasks.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => TaskOutcome::Cancelled,
                result = api.start_scan() => TaskOutcome::ScanRequested(result),
            }
        });
    }

    /// Spawn one results fetch without waiting for earlier ones.
    ///
    /// Ignored unless the session is `Ready` and still open.
    pub fn spawn_poll(&mut self) {
        if self.ready().is_none() || self.cancel.is_cancelled() {
            return;
        }

        let api = Arc::clone(&self.api);
        let cancel = self.cancel.clone();
        self.tasks.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => TaskOutcome::Cancelled,
                result = api.fetch_results() => TaskOutcome::Results(result),
            }
        });
    }

    /// Wait for the next request to resolve and apply it.
    ///
    /// Returns `false` once nothing is in flight.
    pub async fn apply_next(&mut self) -> bool {
        match self.tasks.join_next().await {
            Some(joined) => {
                self.apply_outcome(joined);
                true
            }
            None => false,
        }
    }

    /// Poll every interval until the session is cancelled, calling
    /// `on_update` after each applied results response.
    ///
    /// Returns immediately unless the session is `Ready`. All in-flight
    /// requests are stopped before this returns.
    pub async fn run<F>(&mut self, mut on_update: F)
    where
        F: FnMut(&ReadyState),
    {
        if self.ready().is_none() {
            return;
        }

        let cancel = self.cancel.clone();
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(interval_ms = self.poll_interval.as_millis() as u64, "Polling scan results");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.spawn_poll(),
                Some(joined) = self.tasks.join_next() => {
                    if self.apply_outcome(joined) {
                        if let Some(ready) = self.ready() {
                            on_update(ready);
                        }
                    }
                }
            }
        }

        self.close().await;
    }

    /// Cancel the session and wait for every task to stop.
    pub async fn close(&mut self) {
        self.cancel.cancel();
        self.tasks.shutdown().await;
        tracing::debug!("Overlay session closed");
    }

    /// Apply one finished task. Returns `true` when results were merged.
    fn apply_outcome(&mut self, joined: Result<TaskOutcome, JoinError>) -> bool {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => return false,
            Err(e) => {
                tracing::error!(error = %e, "Overlay task panicked");
                return false;
            }
        };

        match outcome {
            TaskOutcome::Results(Ok(snapshot)) => {
                let SessionState::Ready(ready) = &mut self.state else {
                    return false;
                };
                ready.apply(snapshot);
                tracing::debug!(
                    total_scanned = ready.summary.total_scanned,
                    merged = ready.merged.len(),
                    "Applied scan results",
                );
                true
            }
            TaskOutcome::Results(Err(e)) => {
                tracing::warn!(error = %e, "Results poll failed");
                false
            }
            TaskOutcome::ScanRequested(Ok(())) => {
                tracing::info!("Global scan requested");
                false
            }
            TaskOutcome::ScanRequested(Err(e)) => {
                tracing::warn!(error = %e, "Global scan request failed");
                false
            }
            TaskOutcome::Cancelled => false,
        }
    }
}

impl<A: ScanApi> Drop for OverlaySession<A> {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.tasks.abort_all();
    }
}
