//! Script-backed analyzer and scanner.
//!
//! Both run `<interpreter> <script> [args]`, typically `python3` with the
//! classifier scripts that ship next to the server.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use super::executor::{
    AnalysisError, MediaAnalyzer, MediaScanner, ProcessError, ProcessInput,
};
use super::subprocess;
use crate::verdict::{parse_analysis_output, Verdict};

/// Runs the single-image classifier with the stored file path as its sole
/// argument and parses the verdict from stdout.
#[derive(Debug, Clone)]
pub struct ScriptAnalyzer {
    interpreter: String,
    script: PathBuf,
    timeout: Option<Duration>,
}

impl ScriptAnalyzer {
    pub fn new(
        interpreter: impl Into<String>,
        script: impl Into<PathBuf>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MediaAnalyzer for ScriptAnalyzer {
    async fn analyze(&self, path: &Path) -> Result<Verdict, AnalysisError> {
        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(&self.script).arg(path);

        let input = ProcessInput {
            timeout: self.timeout,
            ..ProcessInput::default()
        };
        let output = subprocess::run_command(&mut cmd, input).await?;

        tracing::debug!(
            exit_code = output.exit_code,
            elapsed_ms = output.duration_ms,
            file = %path.display(),
            "Analyzer finished",
        );

        if !output.success() {
            return Err(ProcessError::ExecutionFailed {
                exit_code: output.exit_code,
                stderr: output.stderr,
            }
            .into());
        }

        Ok(parse_analysis_output(&output.stdout)?)
    }
}

/// Launches the website scanner as a detached background process.
///
/// The scanner is told where the website list lives and where to write its
/// results through `WEBSITES_FILE` and `SCAN_RESULTS_PATH`.
#[derive(Debug, Clone)]
pub struct ScriptScanner {
    interpreter: String,
    script: PathBuf,
    websites_file: PathBuf,
    results_path: PathBuf,
}

impl ScriptScanner {
    pub fn new(
        interpreter: impl Into<String>,
        script: impl Into<PathBuf>,
        websites_file: impl Into<PathBuf>,
        results_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
            websites_file: websites_file.into(),
            results_path: results_path.into(),
        }
    }
}

impl MediaScanner for ScriptScanner {
    fn launch(&self) -> Result<Child, ProcessError> {
        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(&self.script);

        let input = ProcessInput {
            env_vars: vec![
                (
                    "WEBSITES_FILE".to_string(),
                    self.websites_file.to_string_lossy().into_owned(),
                ),
                (
                    "SCAN_RESULTS_PATH".to_string(),
                    self.results_path.to_string_lossy().into_owned(),
                ),
            ],
            ..ProcessInput::default()
        };
        subprocess::spawn_detached(&mut cmd, &input)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
