pub mod analyze;
pub mod health;
pub mod scan;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /websites                 static website list (GET)
///
/// /global-scan              trigger background scan (POST)
/// /global-scan/status       latest scan run (GET)
/// /scan-results             current results document (GET)
///
/// /analyze                  single-image analysis, multipart `image` (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/websites", get(handlers::websites::list_websites))
        .merge(scan::router())
        .merge(analyze::router())
}
