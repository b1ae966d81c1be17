//! Route definitions for the background website scan.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::scan;
use crate::state::AppState;

/// Scan routes mounted under `/api/v1`.
///
/// ```text
/// POST   /global-scan              -> start_global_scan
/// GET    /global-scan/status       -> scan_status
/// GET    /scan-results             -> scan_results
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/global-scan", post(scan::start_global_scan))
        .route("/global-scan/status", get(scan::scan_status))
        .route("/scan-results", get(scan::scan_results))
}
