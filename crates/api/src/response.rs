//! Shared response envelope for API handlers.
//!
//! Every successful API response is a JSON object carrying
//! `"success": true` next to the payload's own fields. Errors use the
//! `"success": false` shape produced by [`AppError`](crate::error::AppError).

use serde::Serialize;

/// `{ "success": true, ...T }` response envelope.
///
/// `T` must serialize as a JSON object; its fields are flattened into the
/// envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(SuccessResponse::new(WebsitesPayload { websites })))
/// ```
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
