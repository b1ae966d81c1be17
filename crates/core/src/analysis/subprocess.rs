//! Subprocess spawning shared by the analyzer and scanner.
//!
//! [`run_command`] runs a single-shot process to completion and captures
//! its output in full. [`spawn_detached`] starts a long-running process
//! whose output is discarded and returns immediately. [`process_is_alive`]
//! checks on a detached process that outlived the handle that started it.

use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

use super::executor::{ProcessError, ProcessInput, ProcessOutput};

/// Maximum stdout or stderr size captured per stream (10 MiB).
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

fn apply_input(cmd: &mut Command, input: &ProcessInput) {
    for (key, value) in &input.env_vars {
        cmd.env(key, value);
    }
}

/// Spawn `cmd`, capture stdout/stderr, and wait for it to exit.
///
/// The caller sets the program and arguments. A non-zero exit is not an
/// error here; callers inspect [`ProcessOutput::exit_code`]. When
/// `input.timeout` is set and expires, the child is killed.
pub async fn run_command(
    cmd: &mut Command,
    input: ProcessInput,
) -> Result<ProcessOutput, ProcessError> {
    // `kill_on_drop(true)` ensures the child is killed when dropped (e.g. on timeout).
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    apply_input(cmd, &input);

    let start = Instant::now();

    let mut child = cmd.spawn().map_err(ProcessError::Spawn)?;

    // Read the streams in spawned tasks so a chatty child cannot block on a
    // full pipe while we wait on it.
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
    let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

    let status = match input.timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(waited) => waited.map_err(ProcessError::IoError)?,
            Err(_elapsed) => {
                // `child` is dropped on return, which kills the process.
                return Err(ProcessError::Timeout {
                    elapsed_ms: start.elapsed().as_millis() as u64,
                });
            }
        },
        None => child.wait().await.map_err(ProcessError::IoError)?,
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    let stdout_bytes = stdout_task.await.unwrap_or_default();
    let stderr_bytes = stderr_task.await.unwrap_or_default();

    Ok(ProcessOutput {
        stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
        exit_code: status.code().unwrap_or(-1),
        duration_ms,
    })
}

/// Start `cmd` without capturing anything and return the running child.
///
/// The child keeps running if the handle is dropped.
pub fn spawn_detached(cmd: &mut Command, input: &ProcessInput) -> Result<Child, ProcessError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(false);
    apply_input(cmd, input);

    cmd.spawn().map_err(ProcessError::Spawn)
}

/// Whether a process with this pid currently exists.
///
/// A process owned by another user still counts as alive. Pid reuse is not
/// detected.
#[cfg(unix)]
pub fn process_is_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // Pid 0 would address the whole process group.
    if pid <= 0 {
        return false;
    }

    // Safety: signal 0 only runs the existence and permission checks;
    // nothing is delivered.
    let ret = unsafe { libc::kill(pid, 0) };
    ret == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
pub fn process_is_alive(_pid: u32) -> bool {
    false
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
