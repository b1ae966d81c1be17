//! Bookkeeping for background scan launches.
//!
//! The scanner itself reports progress only through the results document.
//! A [`ScanRun`] records what the server knows on its side: when a launch
//! happened, which process it started, and how that process ended.
//!
//! The latest run is also kept in a small JSON record on disk. Scanner
//! processes outlive the server, so after a restart the record is the only
//! way to know a scan is still in flight.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Lifecycle of a scan launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRun {
    pub id: Uuid,
    pub status: ScanStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanRun {
    /// A run whose process was started successfully.
    pub fn started(pid: Option<u32>) -> Self {
        Self {
            id: Uuid::now_v7(),
            status: ScanStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            pid,
            exit_code: None,
            error: None,
        }
    }

    /// A run whose process could not be started at all.
    pub fn spawn_failed(error: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            status: ScanStatus::Failed,
            started_at: now,
            finished_at: Some(now),
            pid: None,
            exit_code: None,
            error: Some(error.into()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == ScanStatus::Running
    }

    /// Record the process exit. A missing code means it was killed by a
    /// signal.
    pub fn finish(&mut self, exit_code: Option<i32>) {
        self.finished_at = Some(Utc::now());
        self.exit_code = exit_code;
        self.status = match exit_code {
            Some(0) => ScanStatus::Completed,
            Some(code) => {
                self.error = Some(format!("Scanner exited with code {code}"));
                ScanStatus::Failed
            }
            None => {
                self.error = Some("Scanner terminated by signal".to_string());
                ScanStatus::Failed
            }
        };
    }

    /// Record a failure while waiting on the process.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.finished_at = Some(Utc::now());
        self.status = ScanStatus::Failed;
        self.error = Some(error.into());
    }

    /// Record that the process went away while nobody was waiting on it,
    /// so its exit status is unknown.
    pub fn mark_lost(&mut self) {
        self.fail("Scanner process is no longer running");
    }
}

/// Load the persisted run record.
///
/// A missing, unreadable or malformed record is treated as "no run"; the
/// server must still start.
pub async fn load_scan_run(path: &Path) -> Option<ScanRun> {
    let contents = match tokio::fs::read(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read scan run record");
            return None;
        }
    };

    match serde_json::from_slice(&contents) {
        Ok(run) => Some(run),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed scan run record");
            None
        }
    }
}

/// Persist `run` as the latest record, replacing any previous one.
///
/// Written to a sibling temp file first and renamed into place so a reader
/// never sees a half-written record.
pub async fn save_scan_run(path: &Path, run: &ScanRun) -> Result<(), CoreError> {
    let write_error = |source| CoreError::StorageWrite {
        what: "scan run record",
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_vec_pretty(run).map_err(|e| write_error(e.into()))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }

    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, json).await.map_err(write_error)?;
    tokio::fs::rename(&staging, path).await.map_err(write_error)
}
