//! Feedback submission endpoint

use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::services::feedback::{self, FeedbackInput};
use crate::{ApiResult, AppState};

/// Request body for POST /api/feedback
///
/// All fields are optional at the wire level; presence is validated by
/// the submission transaction so a missing field is reported as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub story_id: Option<i64>,
    pub email: Option<String>,
    pub evaluations: Option<BTreeMap<String, String>>,
    pub additional_feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub success: bool,
    pub review_id: i64,
}

/// POST /api/feedback
///
/// Records one tester's complete pass over one story. Returns 201 with
/// the new review id, 400 on any validation failure.
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<(StatusCode, Json<FeedbackResponse>)> {
    let review_id = feedback::submit_feedback(
        &state.db,
        FeedbackInput {
            story_id: request.story_id,
            email: request.email,
            evaluations: request.evaluations,
            additional_feedback: request.additional_feedback,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(FeedbackResponse {
            success: true,
            review_id,
        }),
    ))
}
