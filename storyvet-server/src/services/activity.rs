//! Recent and in-progress review activity
//!
//! Supporting reads for the monitoring dashboard: completed reviews and
//! live sessions joined with tester display name and story title, inside
//! a relative time window.

use serde::Serialize;
use sqlx::SqlitePool;

use storyvet_common::db::models::parse_string_list;
use storyvet_common::Result;

/// Relative time window for the activity feed. "All time" is
/// approximated as one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    FiveMinutes,
    ThirtyMinutes,
    OneHour,
    ThreeHours,
    SixHours,
    TwentyFourHours,
    AllTime,
}

impl TimeWindow {
    /// Parse the external window key used in query strings
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "5m" => Some(Self::FiveMinutes),
            "30m" => Some(Self::ThirtyMinutes),
            "1h" => Some(Self::OneHour),
            "3h" => Some(Self::ThreeHours),
            "6h" => Some(Self::SixHours),
            "24h" => Some(Self::TwentyFourHours),
            "all" => Some(Self::AllTime),
            _ => None,
        }
    }

    /// SQLite datetime modifier for the window start
    fn sql_modifier(&self) -> &'static str {
        match self {
            Self::FiveMinutes => "-5 minutes",
            Self::ThirtyMinutes => "-30 minutes",
            Self::OneHour => "-1 hour",
            Self::ThreeHours => "-3 hours",
            Self::SixHours => "-6 hours",
            Self::TwentyFourHours => "-24 hours",
            Self::AllTime => "-1 year",
        }
    }
}

/// One completed review in the feed
#[derive(Debug, Clone, Serialize)]
pub struct RecentReview {
    pub review_id: i64,
    pub tester: String,
    pub story_title: String,
    pub additional_feedback: String,
    pub submitted_at: String,
}

/// Completed reviews inside the window, most recent first
pub async fn recent_reviews(pool: &SqlitePool, window: TimeWindow) -> Result<Vec<RecentReview>> {
    let rows: Vec<(i64, String, String, String, String)> = sqlx::query_as(
        r#"
        SELECT r.id, COALESCE(NULLIF(t.name, ''), t.email), us.title,
               r.additional_feedback, r.submitted_at
        FROM reviews r
        JOIN testers t ON t.id = r.tester_id
        JOIN user_stories us ON us.id = r.story_id
        WHERE r.submitted_at >= datetime('now', ?)
        ORDER BY r.submitted_at DESC, r.id DESC
        "#,
    )
    .bind(window.sql_modifier())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(review_id, tester, story_title, additional_feedback, submitted_at)| RecentReview {
                review_id,
                tester,
                story_title,
                additional_feedback,
                submitted_at,
            },
        )
        .collect())
}

/// One in-progress (not yet submitted) review session in the feed
#[derive(Debug, Clone, Serialize)]
pub struct LiveSession {
    pub session_id: String,
    pub tester: String,
    pub story_title: String,
    pub progress: i64,
    pub completed_principles: Vec<String>,
    pub started_at: String,
    pub last_activity: String,
}

/// In-progress sessions active inside the window, most recent first
pub async fn live_sessions(pool: &SqlitePool, window: TimeWindow) -> Result<Vec<LiveSession>> {
    let rows: Vec<(String, String, String, i64, Option<String>, String, String)> = sqlx::query_as(
        r#"
        SELECT s.id, COALESCE(NULLIF(t.name, ''), t.email), us.title,
               s.progress, s.completed_principles, s.started_at, s.last_activity
        FROM active_review_sessions s
        JOIN testers t ON t.id = s.tester_id
        JOIN user_stories us ON us.id = s.story_id
        WHERE s.last_activity >= datetime('now', ?)
        ORDER BY s.last_activity DESC, s.id DESC
        "#,
    )
    .bind(window.sql_modifier())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(session_id, tester, story_title, progress, completed, started_at, last_activity)| {
                LiveSession {
                    session_id,
                    tester,
                    story_title,
                    progress,
                    completed_principles: parse_string_list(
                        "completed_principles",
                        completed.as_deref(),
                    ),
                    started_at,
                    last_activity,
                }
            },
        )
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::feedback::{submit_feedback, FeedbackInput};
    use std::collections::BTreeMap;

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
        sqlx::query("INSERT INTO user_stories (dataset_id, title) VALUES (1, 'Log in')")
            .execute(&pool)
            .await
            .unwrap();

        pool
    }

    #[test]
    fn test_window_keys() {
        assert_eq!(TimeWindow::from_key("5m"), Some(TimeWindow::FiveMinutes));
        assert_eq!(TimeWindow::from_key("24h"), Some(TimeWindow::TwentyFourHours));
        assert_eq!(TimeWindow::from_key("all"), Some(TimeWindow::AllTime));
        assert_eq!(TimeWindow::from_key("2d"), None);
        assert_eq!(TimeWindow::from_key(""), None);
    }

    #[tokio::test]
    async fn test_recent_reviews_empty() {
        let pool = setup_test_db().await;
        let reviews = recent_reviews(&pool, TimeWindow::AllTime).await.unwrap();
        assert!(reviews.is_empty());
    }

    #[tokio::test]
    async fn test_recent_reviews_shows_display_name_and_title() {
        let pool = setup_test_db().await;
        let evaluations: BTreeMap<String, String> =
            [("Independent".to_string(), "yes".to_string())].into();
        submit_feedback(
            &pool,
            FeedbackInput {
                story_id: Some(1),
                email: Some("grace@x.com".to_string()),
                evaluations: Some(evaluations),
                additional_feedback: Some("solid".to_string()),
            },
        )
        .await
        .unwrap();

        let reviews = recent_reviews(&pool, TimeWindow::FiveMinutes).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].tester, "grace");
        assert_eq!(reviews[0].story_title, "Log in");
        assert_eq!(reviews[0].additional_feedback, "solid");
    }

    #[tokio::test]
    async fn test_window_excludes_old_reviews() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO testers (email, name) VALUES ('a@x.com', 'a')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO reviews (story_id, tester_id, submitted_at)
             VALUES (1, 1, datetime('now', '-2 hours'))",
        )
        .execute(&pool)
        .await
        .unwrap();

        let recent = recent_reviews(&pool, TimeWindow::OneHour).await.unwrap();
        assert!(recent.is_empty());

        let wider = recent_reviews(&pool, TimeWindow::ThreeHours).await.unwrap();
        assert_eq!(wider.len(), 1);
    }

    #[tokio::test]
    async fn test_live_sessions_degraded_principles_parse() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO testers (email, name) VALUES ('a@x.com', 'a')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO active_review_sessions (id, tester_id, story_id, progress, completed_principles)
             VALUES ('s-1', 1, 1, 3, 'not json')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let sessions = live_sessions(&pool, TimeWindow::AllTime).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].completed_principles.is_empty());
        assert_eq!(sessions[0].progress, 3);
    }
}
