use axum::extract::State;
use axum::Json;
use deepguard_core::websites::read_website_list;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::SuccessResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WebsitesPayload {
    pub websites: Vec<String>,
}

/// GET /api/v1/websites
///
/// Re-reads the website list on every call.
pub async fn list_websites(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessResponse<WebsitesPayload>>> {
    let websites = read_website_list(&state.config.websites_file).await?;
    Ok(Json(SuccessResponse::new(WebsitesPayload { websites })))
}
