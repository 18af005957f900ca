//! Review session heartbeat endpoint

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::services::sessions;
use crate::{ApiResult, AppState};

/// Request body for POST /api/sessions/heartbeat
#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    pub story_id: i64,
    pub email: String,
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub completed_principles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    pub session_id: String,
}

/// POST /api/sessions/heartbeat
///
/// Marks a (tester, story) review as in progress. Repeated calls
/// refresh the same session.
pub async fn session_heartbeat(
    State(state): State<AppState>,
    Json(request): Json<HeartbeatRequest>,
) -> ApiResult<Json<HeartbeatResponse>> {
    let session_id = sessions::record_heartbeat(
        &state.db,
        request.story_id,
        &request.email,
        request.progress,
        &request.completed_principles,
    )
    .await?;

    Ok(Json(HeartbeatResponse { session_id }))
}
