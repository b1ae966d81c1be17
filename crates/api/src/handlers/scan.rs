//! Handlers for triggering the background scan and serving its results.

use axum::extract::State;
use axum::Json;
use deepguard_core::results::{load_results_document, ScanResultRecord, ScanSummary};
use deepguard_core::scan_run::ScanRun;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::response::SuccessResponse;
use crate::scanning::launcher::TriggerOutcome;
use crate::state::AppState;

const SCAN_STARTED_MESSAGE: &str = "Global scan started in background";
const SCAN_IN_PROGRESS_MESSAGE: &str = "Scan already in progress";

#[derive(Debug, Serialize)]
pub struct ScanStarted {
    pub message: &'static str,
    pub scan_id: Uuid,
}

/// POST /api/v1/global-scan
///
/// Always acknowledges. A launch failure is logged by the launcher and is
/// visible only through `/global-scan/status`.
pub async fn start_global_scan(State(state): State<AppState>) -> Json<SuccessResponse<ScanStarted>> {
    let outcome = state.scan_launcher.trigger().await;

    let message = match &outcome {
        TriggerOutcome::AlreadyRunning(_) => SCAN_IN_PROGRESS_MESSAGE,
        TriggerOutcome::Started(_) | TriggerOutcome::SpawnFailed(_) => SCAN_STARTED_MESSAGE,
    };

    Json(SuccessResponse::new(ScanStarted {
        message,
        scan_id: outcome.run().id,
    }))
}

#[derive(Debug, Serialize)]
pub struct ScanStatusPayload {
    pub scan: Option<ScanRun>,
}

/// GET /api/v1/global-scan/status
pub async fn scan_status(State(state): State<AppState>) -> Json<SuccessResponse<ScanStatusPayload>> {
    let scan = state.scan_launcher.latest().await;
    Json(SuccessResponse::new(ScanStatusPayload { scan }))
}

/// Results reshaped for the polling client.
///
/// `results` mirrors `all_results` for clients that read the older key.
#[derive(Debug, Serialize)]
pub struct ScanResultsPayload {
    pub all_results: Vec<ScanResultRecord>,
    pub results: Vec<ScanResultRecord>,
    pub summary: ScanSummary,
}

/// GET /api/v1/scan-results
///
/// Missing or malformed documents are served as empty results; only a
/// failing read of an existing file is an error.
pub async fn scan_results(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessResponse<ScanResultsPayload>>> {
    let document = load_results_document(&state.config.scan_results_path).await?;

    Ok(Json(SuccessResponse::new(ScanResultsPayload {
        results: document.all_results.clone(),
        all_results: document.all_results,
        summary: document.summary,
    })))
}
