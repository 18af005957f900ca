//! Activity feed endpoint for the monitoring dashboard

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::services::activity::{self, LiveSession, RecentReview, TimeWindow};
use crate::{ApiError, ApiResult, AppState};

/// Query parameters for GET /api/activity
#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    /// One of 5m, 30m, 1h, 3h, 6h, 24h, all. Defaults to all.
    pub window: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub recent_reviews: Vec<RecentReview>,
    pub live_sessions: Vec<LiveSession>,
}

/// GET /api/activity
///
/// Completed reviews and in-progress sessions inside the window, most
/// recent first.
pub async fn activity(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<ActivityResponse>> {
    let window = match query.window.as_deref() {
        None => TimeWindow::AllTime,
        Some(key) => TimeWindow::from_key(key)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown time window: {}", key)))?,
    };

    let recent_reviews = activity::recent_reviews(&state.db, window).await?;
    let live_sessions = activity::live_sessions(&state.db, window).await?;

    Ok(Json(ActivityResponse {
        recent_reviews,
        live_sessions,
    }))
}
