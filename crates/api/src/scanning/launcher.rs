//! Single-flight launcher for the background website scanner.
//!
//! A trigger starts the scanner only when no run is in progress. Each
//! started process is watched by a supervisor task that records its exit
//! status; nothing else about the process is tracked or controlled.
//!
//! The latest run is persisted after every change. On startup,
//! [`ScanLauncher::restore`] reloads it so a scanner that outlived the
//! previous server still blocks new triggers. Such a run has no supervisor,
//! so it is checked by pid instead and marked lost once the process is gone.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use deepguard_core::analysis::executor::MediaScanner;
use deepguard_core::analysis::subprocess::process_is_alive;
use deepguard_core::scan_run::{load_scan_run, save_scan_run, ScanRun};
use tokio::process::Child;
use tokio::sync::Mutex;

/// What a trigger did.
#[derive(Debug, Clone)]
pub enum TriggerOutcome {
    /// A new scanner process was started.
    Started(ScanRun),
    /// A run was already in progress; nothing was started.
    AlreadyRunning(ScanRun),
    /// The scanner could not be started. The failure has been logged.
    SpawnFailed(ScanRun),
}

impl TriggerOutcome {
    pub fn run(&self) -> &ScanRun {
        match self {
            Self::Started(run) | Self::AlreadyRunning(run) | Self::SpawnFailed(run) => run,
        }
    }
}

/// The latest run and whether this process is waiting on it.
#[derive(Debug)]
struct Tracked {
    run: ScanRun,
    supervised: bool,
}

pub struct ScanLauncher {
    scanner: Arc<dyn MediaScanner>,
    record_path: Arc<PathBuf>,
    latest: Arc<Mutex<Option<Tracked>>>,
}

impl ScanLauncher {
    pub fn new(scanner: Arc<dyn MediaScanner>, record_path: impl Into<PathBuf>) -> Self {
        Self {
            scanner,
            record_path: Arc::new(record_path.into()),
            latest: Arc::new(Mutex::new(None)),
        }
    }

    /// Reload the run recorded by a previous server process.
    pub async fn restore(&self) {
        let Some(run) = load_scan_run(&self.record_path).await else {
            return;
        };
        tracing::info!(scan_id = %run.id, status = ?run.status, pid = ?run.pid, "Restored scan run record");

        let mut latest = self.latest.lock().await;
        let tracked = latest.insert(Tracked {
            run,
            supervised: false,
        });
        check_unsupervised(tracked, &self.record_path).await;
    }

    /// Start a scan unless one is already running.
    ///
    /// Never fails from the caller's point of view: spawn errors are logged
    /// and recorded on the returned run.
    pub async fn trigger(&self) -> TriggerOutcome {
        // Held across the spawn so concurrent triggers cannot both launch.
        let mut latest = self.latest.lock().await;

        if let Some(tracked) = latest.as_mut() {
            check_unsupervised(tracked, &self.record_path).await;
            if tracked.run.is_running() {
                tracing::info!(scan_id = %tracked.run.id, "Scan already in progress, not launching another");
                return TriggerOutcome::AlreadyRunning(tracked.run.clone());
            }
        }

        match self.scanner.launch() {
            Ok(child) => {
                let run = ScanRun::started(child.id());
                tracing::info!(scan_id = %run.id, pid = ?run.pid, "Global scan started");
                persist(&self.record_path, &run).await;
                *latest = Some(Tracked {
                    run: run.clone(),
                    supervised: true,
                });
                tokio::spawn(supervise(
                    child,
                    run.id,
                    Arc::clone(&self.latest),
                    Arc::clone(&self.record_path),
                ));
                TriggerOutcome::Started(run)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to start global scan");
                let run = ScanRun::spawn_failed(e.to_string());
                persist(&self.record_path, &run).await;
                *latest = Some(Tracked {
                    run: run.clone(),
                    supervised: false,
                });
                TriggerOutcome::SpawnFailed(run)
            }
        }
    }

    /// The most recent run, if any scan has been triggered.
    pub async fn latest(&self) -> Option<ScanRun> {
        let mut latest = self.latest.lock().await;
        let tracked = latest.as_mut()?;
        check_unsupervised(tracked, &self.record_path).await;
        Some(tracked.run.clone())
    }
}

/// Mark a restored run lost once its process no longer exists.
async fn check_unsupervised(tracked: &mut Tracked, record_path: &Path) {
    if tracked.supervised || !tracked.run.is_running() {
        return;
    }
    if tracked.run.pid.is_some_and(process_is_alive) {
        return;
    }

    tracing::warn!(scan_id = %tracked.run.id, pid = ?tracked.run.pid, "Scanner from a previous server is gone");
    tracked.run.mark_lost();
    persist(record_path, &tracked.run).await;
}

/// Write the run record. Failures are logged; the in-memory run stays
/// authoritative for this process.
async fn persist(record_path: &Path, run: &ScanRun) {
    if let Err(e) = save_scan_run(record_path, run).await {
        tracing::error!(scan_id = %run.id, error = %e, "Failed to persist scan run record");
    }
}

/// Wait for the scanner to exit and record the outcome on its run.
async fn supervise(
    mut child: Child,
    scan_id: uuid::Uuid,
    latest: Arc<Mutex<Option<Tracked>>>,
    record_path: Arc<PathBuf>,
) {
    let waited = child.wait().await;

    let mut guard = latest.lock().await;
    let Some(run) = guard
        .as_mut()
        .map(|tracked| &mut tracked.run)
        .filter(|run| run.id == scan_id)
    else {
        return;
    };

    match waited {
        Ok(status) => {
            run.finish(status.code());
            if status.success() {
                tracing::info!(scan_id = %scan_id, "Global scan finished");
            } else {
                tracing::warn!(scan_id = %scan_id, exit_code = ?status.code(), "Global scan exited with failure");
            }
        }
        Err(e) => {
            tracing::error!(scan_id = %scan_id, error = %e, "Failed to wait on scanner process");
            run.fail(e.to_string());
        }
    }

    persist(&record_path, run).await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
