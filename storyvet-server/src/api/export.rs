//! Dataset export endpoint (admin)

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::services::export;
use crate::{ApiError, ApiResult, AppState};

/// GET /api/datasets/:id/export
///
/// Returns the annotated export document as a JSON download. A dataset
/// with no reviewed stories is a 404, not an empty document.
pub async fn export_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<i64>,
) -> ApiResult<Response> {
    let export = export::export_dataset(&state.db, dataset_id).await?;

    let body = serde_json::to_string_pretty(&export.document)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize export: {}", e)))?;

    let headers = [
        (header::CONTENT_TYPE, "application/json".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export.filename),
        ),
    ];

    Ok((headers, body).into_response())
}
