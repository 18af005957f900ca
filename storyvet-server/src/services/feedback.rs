//! Feedback submission
//!
//! The write path of the whole service: one call records one tester's
//! complete pass over one story. Tester upsert, review insert, and all
//! per-criterion evaluation inserts happen in a single transaction, so a
//! failure anywhere leaves no trace of the call.

use std::collections::BTreeMap;

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use storyvet_common::{CriterionResolver, Rating};

use super::testers::{find_or_create_tester, is_valid_email};

/// One submission: a story, the submitting tester's email, the per-
/// criterion rating words, and optional free-text feedback.
///
/// Fields are optional so presence is checked here, in order, rather than
/// by deserializer rejection.
#[derive(Debug, Clone, Default)]
pub struct FeedbackInput {
    pub story_id: Option<i64>,
    pub email: Option<String>,
    pub evaluations: Option<BTreeMap<String, String>>,
    pub additional_feedback: Option<String>,
}

/// Submission failure modes. Only `Database` is a server-side fault;
/// everything else is a client error local to the call.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("missing required fields")]
    MissingFields,

    #[error("invalid email format")]
    InvalidEmail,

    #[error("unknown criterion: {0}")]
    UnknownCriterion(String),

    #[error("invalid rating: {0}")]
    InvalidRating(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<storyvet_common::Error> for SubmitError {
    fn from(err: storyvet_common::Error) -> Self {
        match err {
            storyvet_common::Error::Database(e) => SubmitError::Database(e),
            other => SubmitError::Database(sqlx::Error::Protocol(other.to_string())),
        }
    }
}

/// Record one submission. Returns the new review id.
///
/// Cheap validation runs before any storage access. The transactional
/// body is all-or-nothing: an unknown criterion name or rating word in
/// evaluation N undoes the tester upsert, the review insert, and the
/// evaluations 0..N that already went in. Dropping the transaction on the
/// error path rolls back and returns the connection to the pool.
pub async fn submit_feedback(pool: &SqlitePool, input: FeedbackInput) -> Result<i64, SubmitError> {
    let (Some(story_id), Some(email), Some(evaluations)) =
        (input.story_id, input.email, input.evaluations)
    else {
        return Err(SubmitError::MissingFields);
    };

    if !is_valid_email(&email) {
        return Err(SubmitError::InvalidEmail);
    }

    let additional_feedback = input.additional_feedback.unwrap_or_default();

    let mut tx = pool.begin().await?;

    let (tester_id, tester_created) = find_or_create_tester(&mut tx, &email).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO reviews (story_id, tester_id, additional_feedback, submitted_at)
        VALUES (?, ?, ?, datetime('now'))
        "#,
    )
    .bind(story_id)
    .bind(tester_id)
    .bind(&additional_feedback)
    .execute(&mut *tx)
    .await?;
    let review_id = result.last_insert_rowid();

    let resolver = CriterionResolver::load(&mut *tx).await?;

    for (criterion_name, rating_word) in &evaluations {
        let Some(criterion_id) = resolver.name_to_id(criterion_name) else {
            return Err(SubmitError::UnknownCriterion(criterion_name.clone()));
        };
        let Some(rating) = Rating::from_word(rating_word) else {
            return Err(SubmitError::InvalidRating(rating_word.clone()));
        };

        sqlx::query(
            "INSERT INTO criterion_evaluations (review_id, criterion_id, rating) VALUES (?, ?, ?)",
        )
        .bind(review_id)
        .bind(criterion_id)
        .bind(rating.as_i64())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(
        review_id,
        tester_id,
        story_id,
        tester_created,
        evaluations = evaluations.len(),
        "Recorded feedback submission"
    );

    Ok(review_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        storyvet_common::db::create_tables(&pool).await.unwrap();
        storyvet_common::db::seed_evaluation_criteria(&pool)
            .await
            .unwrap();

        sqlx::query("INSERT INTO datasets (name, filename, is_active) VALUES ('batch-1', 'batch1.json', 1)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO user_stories (dataset_id, title) VALUES (1, 'As a user I log in')")
            .execute(&pool)
            .await
            .unwrap();

        pool
    }

    fn full_evaluations() -> BTreeMap<String, String> {
        [
            ("Independent", "yes"),
            ("Negotiable", "partial"),
            ("Valuable", "no"),
            ("Estimable", "yes"),
            ("Small", "yes"),
            ("Testable", "partial"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn input(story_id: i64, email: &str, evaluations: BTreeMap<String, String>) -> FeedbackInput {
        FeedbackInput {
            story_id: Some(story_id),
            email: Some(email.to_string()),
            evaluations: Some(evaluations),
            additional_feedback: Some("ok".to_string()),
        }
    }

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_creates_review_and_evaluations() {
        let pool = setup_test_db().await;

        let review_id = submit_feedback(&pool, input(1, "a@x.com", full_evaluations()))
            .await
            .unwrap();

        assert_eq!(count(&pool, "reviews").await, 1);
        assert_eq!(count(&pool, "criterion_evaluations").await, 6);
        assert_eq!(count(&pool, "testers").await, 1);

        // Stored ratings follow the yes/partial/no -> 5/3/1 mapping
        let rating: i64 = sqlx::query_scalar(
            "SELECT ce.rating FROM criterion_evaluations ce
             JOIN evaluation_criteria ec ON ec.id = ce.criterion_id
             WHERE ce.review_id = ? AND ec.name = 'Independent'",
        )
        .bind(review_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(rating, 5);
    }

    #[tokio::test]
    async fn test_missing_fields_rejected_before_storage() {
        let pool = setup_test_db().await;

        let result = submit_feedback(
            &pool,
            FeedbackInput {
                story_id: Some(1),
                email: None,
                evaluations: Some(full_evaluations()),
                additional_feedback: None,
            },
        )
        .await;

        assert!(matches!(result, Err(SubmitError::MissingFields)));
        assert_eq!(count(&pool, "reviews").await, 0);
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let pool = setup_test_db().await;

        let result = submit_feedback(&pool, input(1, "not-an-email", full_evaluations())).await;

        assert!(matches!(result, Err(SubmitError::InvalidEmail)));
        assert_eq!(count(&pool, "testers").await, 0);
    }

    #[tokio::test]
    async fn test_unknown_criterion_rolls_back_everything() {
        let pool = setup_test_db().await;

        // Valid criteria first, then one unknown name. The valid inserts
        // must be undone along with the review and the tester.
        let mut evaluations = full_evaluations();
        evaluations.insert("Zealous".to_string(), "yes".to_string());

        let result = submit_feedback(&pool, input(1, "a@x.com", evaluations)).await;

        match result {
            Err(SubmitError::UnknownCriterion(name)) => assert_eq!(name, "Zealous"),
            other => panic!("expected UnknownCriterion, got {:?}", other),
        }
        assert_eq!(count(&pool, "reviews").await, 0);
        assert_eq!(count(&pool, "criterion_evaluations").await, 0);
        assert_eq!(count(&pool, "testers").await, 0);
    }

    #[tokio::test]
    async fn test_invalid_rating_word_rolls_back_everything() {
        let pool = setup_test_db().await;

        let mut evaluations = full_evaluations();
        evaluations.insert("Testable".to_string(), "maybe".to_string());

        let result = submit_feedback(&pool, input(1, "a@x.com", evaluations)).await;

        assert!(matches!(result, Err(SubmitError::InvalidRating(_))));
        assert_eq!(count(&pool, "reviews").await, 0);
        assert_eq!(count(&pool, "criterion_evaluations").await, 0);
    }

    #[tokio::test]
    async fn test_tester_reused_across_submissions() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO user_stories (dataset_id, title) VALUES (1, 'Second story')")
            .execute(&pool)
            .await
            .unwrap();

        submit_feedback(&pool, input(1, "a@x.com", full_evaluations()))
            .await
            .unwrap();
        submit_feedback(&pool, input(2, "a@x.com", full_evaluations()))
            .await
            .unwrap();

        assert_eq!(count(&pool, "testers").await, 1);

        let tester_ids: Vec<(i64,)> = sqlx::query_as("SELECT DISTINCT tester_id FROM reviews")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(tester_ids.len(), 1);
    }

    #[tokio::test]
    async fn test_tester_name_defaults_to_local_part() {
        let pool = setup_test_db().await;

        submit_feedback(&pool, input(1, "grace.h@example.org", full_evaluations()))
            .await
            .unwrap();

        let name: Option<String> = sqlx::query_scalar("SELECT name FROM testers WHERE email = ?")
            .bind("grace.h@example.org")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("grace.h"));
    }

    #[tokio::test]
    async fn test_duplicate_reviews_permitted() {
        // Two submissions for the same (tester, story) both go through;
        // deduplication is deliberately not part of the write path.
        let pool = setup_test_db().await;

        submit_feedback(&pool, input(1, "a@x.com", full_evaluations()))
            .await
            .unwrap();
        submit_feedback(&pool, input(1, "a@x.com", full_evaluations()))
            .await
            .unwrap();

        assert_eq!(count(&pool, "reviews").await, 2);
        assert_eq!(count(&pool, "criterion_evaluations").await, 12);
    }
}
