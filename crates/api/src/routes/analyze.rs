//! Route definitions for single-image analysis.

use axum::routing::post;
use axum::Router;

use crate::handlers::analyze;
use crate::state::AppState;

/// ```text
/// POST   /analyze                  -> analyze_image (multipart field `image`)
/// ```
///
/// The upload body limit is applied in the router builder from
/// configuration.
pub fn router() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze::analyze_image))
}
