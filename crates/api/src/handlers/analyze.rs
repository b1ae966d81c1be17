//! Single-image upload and analysis.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use deepguard_core::uploads::{persist_upload, remove_upload};
use deepguard_core::verdict::Verdict;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::response::SuccessResponse;
use crate::state::AppState;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

pub const NO_IMAGE_MESSAGE: &str = "No image file uploaded";

#[derive(Debug, Serialize)]
pub struct AnalyzePayload {
    pub result: Verdict,
}

/// POST /api/v1/analyze
///
/// Stores the `image` field under the uploads directory, runs the analyzer
/// on it and returns the parsed verdict. Other fields are ignored. When
/// several `image` fields are sent, the first one is used. The field must
/// be a file part; a plain text `image` value or a body that is not
/// multipart at all is treated the same as a missing image.
pub async fn analyze_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<SuccessResponse<AnalyzePayload>>> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Analyze request is not multipart");
        AppError::BadRequest(NO_IMAGE_MESSAGE.into())
    })?;

    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let Some(filename) = field.file_name().map(str::to_string) else {
            return Err(AppError::BadRequest(NO_IMAGE_MESSAGE.into()));
        };
        let data = field.bytes().await.map_err(multipart_error)?;

        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| AppError::BadRequest(NO_IMAGE_MESSAGE.into()))?;

    let stored_path = persist_upload(&state.config.upload_dir, &filename, &data).await?;
    tracing::info!(stored_path = %stored_path.display(), size = data.len(), "Running analysis");

    let outcome = state.analyzer.analyze(&stored_path).await;

    if state.config.delete_uploads {
        remove_upload(&stored_path).await;
    }

    let verdict = outcome?;
    tracing::info!(
        label = %verdict.label,
        confidence = verdict.confidence,
        is_fake = verdict.is_fake,
        "Analysis complete",
    );

    Ok(Json(SuccessResponse::new(AnalyzePayload { result: verdict })))
}

/// Keep the body-limit rejection distinct from malformed multipart input.
fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(err.body_text())
    }
}
