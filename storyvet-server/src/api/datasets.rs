//! Dataset management endpoints (admin)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::services::datasets::{self, DatasetSummary, NewStory};
use crate::{ApiResult, AppState};

/// GET /api/datasets
pub async fn list_datasets(State(state): State<AppState>) -> ApiResult<Json<Vec<DatasetSummary>>> {
    let listed = datasets::list_datasets(&state.db).await?;
    Ok(Json(listed))
}

/// Request body for POST /api/datasets
#[derive(Debug, Deserialize)]
pub struct CreateDatasetRequest {
    pub name: String,
    pub filename: String,
    #[serde(default)]
    pub stories: Vec<NewStory>,
}

#[derive(Debug, Serialize)]
pub struct CreateDatasetResponse {
    pub dataset_id: i64,
    pub story_count: usize,
}

/// POST /api/datasets
///
/// Imports one dataset with its stories. The new dataset starts
/// inactive; activation is a separate call.
pub async fn create_dataset(
    State(state): State<AppState>,
    Json(request): Json<CreateDatasetRequest>,
) -> ApiResult<(StatusCode, Json<CreateDatasetResponse>)> {
    let dataset_id =
        datasets::create_dataset(&state.db, &request.name, &request.filename, &request.stories)
            .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateDatasetResponse {
            dataset_id,
            story_count: request.stories.len(),
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct ActiveDatasetResponse {
    /// `null` when no dataset is configured; callers serve nothing in
    /// that state rather than treating it as an error.
    pub active_dataset_id: Option<i64>,
}

/// GET /api/datasets/active
pub async fn get_active_dataset(
    State(state): State<AppState>,
) -> ApiResult<Json<ActiveDatasetResponse>> {
    let active_dataset_id = datasets::active_dataset_id(&state.db).await?;
    Ok(Json(ActiveDatasetResponse { active_dataset_id }))
}

#[derive(Debug, Serialize)]
pub struct ActivateResponse {
    pub status: String,
    pub dataset_id: i64,
}

/// POST /api/datasets/:id/activate
///
/// Atomically makes the dataset the single active one. 404 if the
/// dataset does not exist.
pub async fn activate_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<i64>,
) -> ApiResult<Json<ActivateResponse>> {
    datasets::activate_dataset(&state.db, dataset_id).await?;

    Ok(Json(ActivateResponse {
        status: "activated".to_string(),
        dataset_id,
    }))
}
