use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use deepguard_core::analysis::executor::{AnalysisError, ProcessError};
use deepguard_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`AnalysisError`] for domain failures and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce
/// consistent `{ "success": false, "error", "code" }` bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `deepguard_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The external analyzer failed or produced unusable output.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request body exceeded the configured upload limit.
    #[error("Payload too large")]
    PayloadTooLarge,
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::StorageRead { what, path, source } => {
                    tracing::error!(path = %path.display(), error = %source, "Storage read failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "STORAGE_ERROR",
                        format!("Failed to read {what}"),
                    )
                }
                CoreError::StorageWrite { what, path, source } => {
                    tracing::error!(path = %path.display(), error = %source, "Storage write failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "STORAGE_ERROR",
                        format!("Failed to store {what}"),
                    )
                }
            },

            // --- Analyzer failures ---
            AppError::Analysis(analysis) => classify_analysis_error(analysis),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "Uploaded file is too large".to_string(),
            ),
        };

        let body = json!({
            "success": false,
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map an analyzer failure to a status, code and client-safe message.
///
/// Process failures and output mismatches are both 500s but carry distinct
/// codes. Captured stderr is logged, never returned.
fn classify_analysis_error(err: &AnalysisError) -> (StatusCode, &'static str, String) {
    match err {
        AnalysisError::Process(ProcessError::Timeout { elapsed_ms }) => {
            tracing::error!(elapsed_ms, "Analyzer timed out");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ANALYSIS_TIMEOUT",
                "Analysis timed out".to_string(),
            )
        }
        AnalysisError::Process(ProcessError::ExecutionFailed { exit_code, stderr }) => {
            tracing::error!(exit_code, stderr = %stderr, "Analyzer exited with failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ANALYSIS_FAILED",
                "Error executing analysis".to_string(),
            )
        }
        AnalysisError::Process(other) => {
            tracing::error!(error = %other, "Analyzer could not be run");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ANALYSIS_FAILED",
                "Error executing analysis".to_string(),
            )
        }
        AnalysisError::Contract(mismatch) => {
            tracing::error!(error = %mismatch, "Analyzer output did not contain a verdict");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ANALYSIS_PARSE_FAILED",
                "Failed to parse analysis output".to_string(),
            )
        }
    }
}
