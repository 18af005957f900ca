//! Statistics aggregation
//!
//! Read-side rollups over the evaluation data for the admin dashboards.
//! Both queries return an empty vector when nothing matches; zero data is
//! a normal state, not an error.

use serde::Serialize;
use sqlx::SqlitePool;

use storyvet_common::{CriterionResolver, Result};

use super::datasets;

/// Per-criterion counts for one (criterion, story) pair.
///
/// `id` is a synthetic display identifier, unique within one response but
/// not stable across calls.
#[derive(Debug, Clone, Serialize)]
pub struct CriterionStatRow {
    pub id: String,
    pub criterion_id: i64,
    pub criterion: String,
    pub story_id: Option<i64>,
    pub story_title: Option<String>,
    pub yes_count: i64,
    pub partial_count: i64,
    pub no_count: i64,
    pub total_reviews: i64,
}

const CRITERION_STATS_SQL: &str = r#"
SELECT ec.id, ec.name, ev.story_id, ev.title,
       COALESCE(SUM(CASE WHEN ev.rating = 5 THEN 1 ELSE 0 END), 0),
       COALESCE(SUM(CASE WHEN ev.rating = 3 THEN 1 ELSE 0 END), 0),
       COALESCE(SUM(CASE WHEN ev.rating = 1 THEN 1 ELSE 0 END), 0),
       COUNT(ev.rating)
FROM evaluation_criteria ec
LEFT JOIN (
    SELECT ce.criterion_id AS criterion_id, ce.rating AS rating,
           r.story_id AS story_id, us.title AS title
    FROM criterion_evaluations ce
    JOIN reviews r ON r.id = ce.review_id
    JOIN user_stories us ON us.id = r.story_id
) ev ON ev.criterion_id = ec.id
GROUP BY ec.id, ev.story_id
ORDER BY ev.title ASC, ec.id ASC
"#;

const CRITERION_STATS_FILTERED_SQL: &str = r#"
SELECT ec.id, ec.name, ev.story_id, ev.title,
       COALESCE(SUM(CASE WHEN ev.rating = 5 THEN 1 ELSE 0 END), 0),
       COALESCE(SUM(CASE WHEN ev.rating = 3 THEN 1 ELSE 0 END), 0),
       COALESCE(SUM(CASE WHEN ev.rating = 1 THEN 1 ELSE 0 END), 0),
       COUNT(ev.rating)
FROM evaluation_criteria ec
LEFT JOIN (
    SELECT ce.criterion_id AS criterion_id, ce.rating AS rating,
           r.story_id AS story_id, us.title AS title
    FROM criterion_evaluations ce
    JOIN reviews r ON r.id = ce.review_id
    JOIN user_stories us ON us.id = r.story_id
    WHERE r.story_id = ?
) ev ON ev.criterion_id = ec.id
GROUP BY ec.id, ev.story_id
ORDER BY ev.title ASC, ec.id ASC
"#;

/// Yes/partial/no counts per (criterion, story) pair, optionally
/// restricted to one story.
///
/// The outer join keeps every criterion visible: one with no matching
/// evaluations yet appears once, with zero counts and no story.
pub async fn criterion_stats(
    pool: &SqlitePool,
    story_id: Option<i64>,
) -> Result<Vec<CriterionStatRow>> {
    type Row = (i64, String, Option<i64>, Option<String>, i64, i64, i64, i64);

    let rows: Vec<Row> = match story_id {
        Some(id) => {
            sqlx::query_as(CRITERION_STATS_FILTERED_SQL)
                .bind(id)
                .fetch_all(pool)
                .await?
        }
        None => sqlx::query_as(CRITERION_STATS_SQL).fetch_all(pool).await?,
    };

    Ok(rows
        .into_iter()
        .enumerate()
        .map(
            |(index, (criterion_id, criterion, row_story, story_title, yes, partial, no, total))| {
                let story_label = row_story
                    .or(story_id)
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "all".to_string());

                CriterionStatRow {
                    id: format!(
                        "{}-{}-{}",
                        CriterionResolver::external_key(&criterion),
                        story_label,
                        index
                    ),
                    criterion_id,
                    criterion,
                    story_id: row_story,
                    story_title,
                    yes_count: yes,
                    partial_count: partial,
                    no_count: no,
                    total_reviews: total,
                }
            },
        )
        .collect())
}

/// Per-story aggregates for one (story, criterion) pair
#[derive(Debug, Clone, Serialize)]
pub struct StoryStatRow {
    pub story_id: i64,
    pub story_title: String,
    pub criterion_id: i64,
    pub criterion: String,
    pub average_rating: f64,
    pub total_reviews: i64,
    pub meets_criteria: i64,
}

const STORY_STATS_SQL: &str = r#"
SELECT us.id, us.title, ec.id, ec.name,
       COALESCE(AVG(ce.rating), 0.0),
       COUNT(ce.rating),
       COALESCE(SUM(CASE WHEN ce.rating >= 4 THEN 1 ELSE 0 END), 0)
FROM user_stories us
CROSS JOIN evaluation_criteria ec
LEFT JOIN reviews r ON r.story_id = us.id
LEFT JOIN criterion_evaluations ce
       ON ce.review_id = r.id AND ce.criterion_id = ec.id
WHERE us.dataset_id = ?
GROUP BY us.id, ec.id
ORDER BY us.title ASC, ec.name ASC
"#;

const STORY_STATS_FILTERED_SQL: &str = r#"
SELECT us.id, us.title, ec.id, ec.name,
       COALESCE(AVG(ce.rating), 0.0),
       COUNT(ce.rating),
       COALESCE(SUM(CASE WHEN ce.rating >= 4 THEN 1 ELSE 0 END), 0)
FROM user_stories us
CROSS JOIN evaluation_criteria ec
LEFT JOIN reviews r ON r.story_id = us.id
LEFT JOIN criterion_evaluations ce
       ON ce.review_id = r.id AND ce.criterion_id = ec.id
WHERE us.dataset_id = ? AND ec.id = ?
GROUP BY us.id, ec.id
ORDER BY us.title ASC, ec.name ASC
"#;

/// Average rating, review count, and meets-criteria count for every
/// (story, criterion) pair of the active dataset.
///
/// `principle` is the lowercase external key of a criterion; a key that
/// resolves to nothing yields an empty result, not an error. No active
/// dataset also yields an empty result.
///
/// Meets-criteria counts ratings >= 4. With the 1/3/5 scale that is
/// equivalent to rating == 5; the threshold is kept as observed.
pub async fn story_stats(pool: &SqlitePool, principle: Option<&str>) -> Result<Vec<StoryStatRow>> {
    let Some(dataset_id) = datasets::active_dataset_id(pool).await? else {
        return Ok(Vec::new());
    };

    let criterion_id = match principle {
        Some(key) => {
            let resolver = CriterionResolver::load(pool).await?;
            match resolver.id_for_external_key(key) {
                Some(id) => Some(id),
                None => return Ok(Vec::new()),
            }
        }
        None => None,
    };

    type Row = (i64, String, i64, String, f64, i64, i64);

    let rows: Vec<Row> = match criterion_id {
        Some(id) => {
            sqlx::query_as(STORY_STATS_FILTERED_SQL)
                .bind(dataset_id)
                .bind(id)
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query_as(STORY_STATS_SQL)
                .bind(dataset_id)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows
        .into_iter()
        .map(
            |(story_id, story_title, criterion_id, criterion, average, total, meets)| StoryStatRow {
                story_id,
                story_title,
                criterion_id,
                criterion,
                average_rating: average,
                total_reviews: total,
                meets_criteria: meets,
            },
        )
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::feedback::{submit_feedback, FeedbackInput};
    use sqlx::sqlite::SqlitePoolOptions;
    use std::collections::BTreeMap;

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
        sqlx::query("INSERT INTO user_stories (dataset_id, title) VALUES (1, 'Log in')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO user_stories (dataset_id, title) VALUES (1, 'Check out')")
            .execute(&pool)
            .await
            .unwrap();

        pool
    }

    async fn submit(pool: &SqlitePool, story_id: i64, email: &str, words: [(&str, &str); 6]) {
        let evaluations: BTreeMap<String, String> = words
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        submit_feedback(
            pool,
            FeedbackInput {
                story_id: Some(story_id),
                email: Some(email.to_string()),
                evaluations: Some(evaluations),
                additional_feedback: None,
            },
        )
        .await
        .unwrap();
    }

    const ALL_YES: [(&str, &str); 6] = [
        ("Independent", "yes"),
        ("Negotiable", "yes"),
        ("Valuable", "yes"),
        ("Estimable", "yes"),
        ("Small", "yes"),
        ("Testable", "yes"),
    ];

    #[tokio::test]
    async fn test_criterion_stats_empty_data() {
        let pool = setup_test_db().await;

        let stats = criterion_stats(&pool, None).await.unwrap();

        // Every seeded criterion still appears, with zero counts
        assert_eq!(stats.len(), 6);
        assert!(stats.iter().all(|row| row.total_reviews == 0));
        assert!(stats.iter().all(|row| row.story_id.is_none()));
    }

    #[tokio::test]
    async fn test_criterion_stats_counts_by_rating() {
        let pool = setup_test_db().await;
        submit(
            &pool,
            1,
            "a@x.com",
            [
                ("Independent", "yes"),
                ("Negotiable", "partial"),
                ("Valuable", "no"),
                ("Estimable", "yes"),
                ("Small", "yes"),
                ("Testable", "partial"),
            ],
        )
        .await;

        let stats = criterion_stats(&pool, Some(1)).await.unwrap();

        let independent = stats.iter().find(|r| r.criterion == "Independent").unwrap();
        assert_eq!(independent.yes_count, 1);
        assert_eq!(independent.partial_count, 0);
        assert_eq!(independent.no_count, 0);
        assert_eq!(independent.total_reviews, 1);

        let negotiable = stats.iter().find(|r| r.criterion == "Negotiable").unwrap();
        assert_eq!(negotiable.partial_count, 1);
        assert_eq!(negotiable.total_reviews, 1);
    }

    #[tokio::test]
    async fn test_criterion_stats_story_filter() {
        let pool = setup_test_db().await;
        submit(&pool, 1, "a@x.com", ALL_YES).await;
        submit(&pool, 2, "b@x.com", ALL_YES).await;

        let stats = criterion_stats(&pool, Some(2)).await.unwrap();

        // Only story 2 rows carry counts
        assert!(stats
            .iter()
            .filter(|r| r.total_reviews > 0)
            .all(|r| r.story_id == Some(2)));
    }

    #[tokio::test]
    async fn test_criterion_stats_display_ids_unique() {
        let pool = setup_test_db().await;
        submit(&pool, 1, "a@x.com", ALL_YES).await;
        submit(&pool, 2, "b@x.com", ALL_YES).await;

        let stats = criterion_stats(&pool, None).await.unwrap();
        let mut ids: Vec<&str> = stats.iter().map(|r| r.id.as_str()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[tokio::test]
    async fn test_story_stats_empty_data() {
        let pool = setup_test_db().await;

        let stats = story_stats(&pool, None).await.unwrap();

        // Every (story, criterion) pair of the active dataset appears
        assert_eq!(stats.len(), 12);
        assert!(stats.iter().all(|row| row.total_reviews == 0));
        assert!(stats.iter().all(|row| row.average_rating == 0.0));
    }

    #[tokio::test]
    async fn test_story_stats_averages_and_threshold() {
        let pool = setup_test_db().await;
        submit(&pool, 1, "a@x.com", ALL_YES).await;
        submit(
            &pool,
            1,
            "b@x.com",
            [
                ("Independent", "no"),
                ("Negotiable", "yes"),
                ("Valuable", "yes"),
                ("Estimable", "yes"),
                ("Small", "yes"),
                ("Testable", "yes"),
            ],
        )
        .await;

        let stats = story_stats(&pool, Some("independent")).await.unwrap();

        // Filtered to one criterion: one row per story of the dataset
        assert_eq!(stats.len(), 2);
        let row = stats.iter().find(|r| r.story_id == 1).unwrap();
        assert_eq!(row.total_reviews, 2);
        assert_eq!(row.average_rating, 3.0); // (5 + 1) / 2
        assert_eq!(row.meets_criteria, 1); // only the rating of 5 clears >= 4
    }

    #[tokio::test]
    async fn test_story_stats_unknown_principle_is_empty() {
        let pool = setup_test_db().await;
        submit(&pool, 1, "a@x.com", ALL_YES).await;

        let stats = story_stats(&pool, Some("bogus")).await.unwrap();
        assert!(stats.is_empty());
    }

    #[tokio::test]
    async fn test_story_stats_without_active_dataset_is_empty() {
        let pool = setup_test_db().await;
        sqlx::query("UPDATE datasets SET is_active = 0")
            .execute(&pool)
            .await
            .unwrap();

        let stats = story_stats(&pool, None).await.unwrap();
        assert!(stats.is_empty());
    }
}
