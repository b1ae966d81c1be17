//! Capability traits for the external analysis collaborator and the
//! shared process types behind them.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Child;

use crate::verdict::{Verdict, VerdictError};

/// How to run a single-shot subprocess.
#[derive(Debug, Clone, Default)]
pub struct ProcessInput {
    /// Additional environment variables set for the child process.
    pub env_vars: Vec<(String, String)>,
    /// Maximum wall-clock time before the process is killed. `None` waits
    /// indefinitely.
    pub timeout: Option<Duration>,
}

/// Captured output from a completed subprocess.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    pub duration_ms: u64,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Errors that can occur while running an external process.
#[derive(Debug)]
pub enum ProcessError {
    /// The process could not be started.
    Spawn(std::io::Error),
    /// The process exceeded its timeout and was killed.
    Timeout {
        elapsed_ms: u64,
    },
    /// The process ran but exited with a non-zero exit code.
    ExecutionFailed {
        exit_code: i32,
        stderr: String,
    },
    /// An I/O error occurred while waiting on the process.
    IoError(std::io::Error),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "Failed to start process: {err}"),
            Self::Timeout { elapsed_ms } => {
                write!(f, "Process timed out after {elapsed_ms}ms")
            }
            Self::ExecutionFailed { exit_code, stderr } => {
                write!(f, "Process failed with exit code {exit_code}: {stderr}")
            }
            Self::IoError(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn(err) | Self::IoError(err) => Some(err),
            _ => None,
        }
    }
}

/// Failure of a single-image analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The analyzer could not run to a clean exit.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// The analyzer exited cleanly but its output carried no verdict.
    #[error("Unrecognized analyzer output: {0}")]
    Contract(#[from] VerdictError),
}

/// Classifies one stored media file.
#[async_trait]
pub trait MediaAnalyzer: Send + Sync {
    async fn analyze(&self, path: &Path) -> Result<Verdict, AnalysisError>;
}

/// Launches a background scan of the website list.
///
/// The returned child is detached from any request; the caller decides
/// whether to supervise it.
pub trait MediaScanner: Send + Sync {
    fn launch(&self) -> Result<Child, ProcessError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
