//! Reviewer-facing reads: the servable story batch and the criterion
//! vocabulary.

use axum::{extract::State, Json};
use serde::Serialize;

use storyvet_common::db::models::UserStory;
use storyvet_common::CriterionResolver;

use crate::services::datasets;
use crate::{ApiResult, AppState};

/// GET /api/stories
///
/// All stories of the active dataset, in import order. An empty list
/// when no dataset is active.
pub async fn stories_for_review(State(state): State<AppState>) -> ApiResult<Json<Vec<UserStory>>> {
    let stories = datasets::stories_for_review(&state.db).await?;
    Ok(Json(stories))
}

/// One criterion row with its external filter key
#[derive(Debug, Serialize)]
pub struct CriterionRow {
    pub id: i64,
    pub name: String,
    pub key: String,
    pub description: Option<String>,
}

/// GET /api/criteria
pub async fn list_criteria(State(state): State<AppState>) -> ApiResult<Json<Vec<CriterionRow>>> {
    let rows: Vec<(i64, String, Option<String>)> =
        sqlx::query_as("SELECT id, name, description FROM evaluation_criteria ORDER BY id")
            .fetch_all(&state.db)
            .await
            .map_err(storyvet_common::Error::from)?;

    Ok(Json(
        rows.into_iter()
            .map(|(id, name, description)| CriterionRow {
                id,
                key: CriterionResolver::external_key(&name),
                name,
                description,
            })
            .collect(),
    ))
}
