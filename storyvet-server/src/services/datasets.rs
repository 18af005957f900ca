//! Dataset management
//!
//! A dataset is one imported batch of stories. The `is_active` flag is
//! shared global state: only the atomic flip in `activate_dataset` may
//! set it, so no reader ever observes two active datasets.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use storyvet_common::db::models::{SeedFlags, UserStory};
use storyvet_common::{Error, Result};

/// Id of the currently active dataset. `None` means no dataset is
/// configured: downstream callers serve nothing, they do not error.
pub async fn active_dataset_id(pool: &SqlitePool) -> Result<Option<i64>> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM datasets WHERE is_active = 1 LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(id,)| id))
}

/// Make `dataset_id` the single active dataset.
///
/// Clear-all and set-one run in the same transaction; concurrent readers
/// see either the old active dataset or the new one, never both and
/// never a committed zero. A missing target rolls the clear back too.
pub async fn activate_dataset(pool: &SqlitePool, dataset_id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE datasets SET is_active = 0 WHERE is_active = 1")
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("UPDATE datasets SET is_active = 1 WHERE id = ?")
        .bind(dataset_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Dataset {} not found", dataset_id)));
    }

    tx.commit().await?;

    info!(dataset_id, "Activated dataset");
    Ok(())
}

/// One row of the admin dataset listing
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub id: i64,
    pub name: String,
    pub filename: String,
    pub is_active: bool,
    pub story_count: i64,
}

/// List all datasets with their story counts
pub async fn list_datasets(pool: &SqlitePool) -> Result<Vec<DatasetSummary>> {
    let rows: Vec<(i64, String, String, i64, i64)> = sqlx::query_as(
        r#"
        SELECT d.id, d.name, d.filename, d.is_active, COUNT(us.id)
        FROM datasets d
        LEFT JOIN user_stories us ON us.dataset_id = d.id
        GROUP BY d.id
        ORDER BY d.id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, filename, is_active, story_count)| DatasetSummary {
            id,
            name,
            filename,
            is_active: is_active != 0,
            story_count,
        })
        .collect())
}

/// One story of an incoming dataset
#[derive(Debug, Clone, Deserialize)]
pub struct NewStory {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub source_key: Option<String>,
    #[serde(default)]
    pub epic_name: Option<String>,
    #[serde(default)]
    pub epic_id: Option<String>,
    #[serde(default)]
    pub original_story_id: Option<String>,
    #[serde(default)]
    pub seed_flags: SeedFlags,
}

/// Import one dataset with its stories in a single transaction.
/// The new dataset is not activated; activation is a separate step.
pub async fn create_dataset(
    pool: &SqlitePool,
    name: &str,
    filename: &str,
    stories: &[NewStory],
) -> Result<i64> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("dataset name must not be empty".to_string()));
    }

    let mut tx = pool.begin().await?;

    let result = sqlx::query("INSERT INTO datasets (name, filename) VALUES (?, ?)")
        .bind(name)
        .bind(filename)
        .execute(&mut *tx)
        .await?;
    let dataset_id = result.last_insert_rowid();

    for story in stories {
        let acceptance_criteria = serde_json::to_string(&story.acceptance_criteria)
            .map_err(|e| Error::Internal(format!("Failed to serialize acceptance criteria: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO user_stories (
                dataset_id, title, description, acceptance_criteria,
                source_key, epic_name, epic_id, original_story_id,
                seed_independent, seed_negotiable, seed_valuable,
                seed_estimable, seed_small, seed_testable
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(dataset_id)
        .bind(&story.title)
        .bind(&story.description)
        .bind(&acceptance_criteria)
        .bind(&story.source_key)
        .bind(&story.epic_name)
        .bind(&story.epic_id)
        .bind(&story.original_story_id)
        .bind(story.seed_flags.independent)
        .bind(story.seed_flags.negotiable)
        .bind(story.seed_flags.valuable)
        .bind(story.seed_flags.estimable)
        .bind(story.seed_flags.small)
        .bind(story.seed_flags.testable)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(dataset_id, stories = stories.len(), "Imported dataset");
    Ok(dataset_id)
}

/// The servable batch: all stories of the active dataset, in import
/// order. Empty when no dataset is active.
pub async fn stories_for_review(pool: &SqlitePool) -> Result<Vec<UserStory>> {
    let Some(dataset_id) = active_dataset_id(pool).await? else {
        return Ok(Vec::new());
    };

    type StoryRow = (
        i64,
        i64,
        String,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<i64>,
        Option<i64>,
        Option<i64>,
        Option<i64>,
        Option<i64>,
        Option<i64>,
    );

    let rows: Vec<StoryRow> = sqlx::query_as(
        r#"
        SELECT id, dataset_id, title, description, acceptance_criteria,
               source_key, epic_name, epic_id, original_story_id,
               seed_independent, seed_negotiable, seed_valuable,
               seed_estimable, seed_small, seed_testable
        FROM user_stories
        WHERE dataset_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(dataset_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(
                id,
                dataset_id,
                title,
                description,
                acceptance_criteria,
                source_key,
                epic_name,
                epic_id,
                original_story_id,
                independent,
                negotiable,
                valuable,
                estimable,
                small,
                testable,
            )| UserStory {
                id,
                dataset_id,
                title,
                description,
                acceptance_criteria,
                source_key,
                epic_name,
                epic_id,
                original_story_id,
                seed_flags: SeedFlags {
                    independent: independent.map(|v| v != 0),
                    negotiable: negotiable.map(|v| v != 0),
                    valuable: valuable.map(|v| v != 0),
                    estimable: estimable.map(|v| v != 0),
                    small: small.map(|v| v != 0),
                    testable: testable.map(|v| v != 0),
                },
            },
        )
        .collect())
}
