//! Statistics endpoints for the admin dashboards

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::services::stats::{self, CriterionStatRow, StoryStatRow};
use crate::{ApiResult, AppState};

/// Query parameters for GET /api/stats/criteria
#[derive(Debug, Deserialize)]
pub struct CriterionStatsQuery {
    pub story_id: Option<i64>,
}

/// GET /api/stats/criteria
///
/// Yes/partial/no counts per (criterion, story) pair, optionally
/// restricted to one story.
pub async fn criterion_stats(
    State(state): State<AppState>,
    Query(query): Query<CriterionStatsQuery>,
) -> ApiResult<Json<Vec<CriterionStatRow>>> {
    let rows = stats::criterion_stats(&state.db, query.story_id).await?;
    Ok(Json(rows))
}

/// Query parameters for GET /api/stats/stories
#[derive(Debug, Deserialize)]
pub struct StoryStatsQuery {
    /// Lowercase external key of a criterion, e.g. "valuable". A key
    /// that resolves to nothing yields an empty result.
    pub principle: Option<String>,
}

/// GET /api/stats/stories
///
/// Per-story aggregates scoped to the active dataset.
pub async fn story_stats(
    State(state): State<AppState>,
    Query(query): Query<StoryStatsQuery>,
) -> ApiResult<Json<Vec<StoryStatRow>>> {
    let rows = stats::story_stats(&state.db, query.principle.as_deref()).await?;
    Ok(Json(rows))
}
