//! In-progress review sessions
//!
//! The reviewing client heartbeats while a tester works through a story,
//! so the admin view can show not-yet-submitted activity. One session per
//! (tester, story); a later heartbeat refreshes the existing row.

use sqlx::SqlitePool;
use uuid::Uuid;

use storyvet_common::{Error, Result};

use super::testers::{find_or_create_tester, is_valid_email};

/// Record a heartbeat for one tester working on one story.
///
/// Creates the tester lazily, like the submission path does, so a session
/// can exist before its first submitted review. Returns the session id.
pub async fn record_heartbeat(
    pool: &SqlitePool,
    story_id: i64,
    email: &str,
    progress: i64,
    completed_principles: &[String],
) -> Result<String> {
    if !is_valid_email(email) {
        return Err(Error::InvalidInput("invalid email format".to_string()));
    }

    let completed = serde_json::to_string(completed_principles)
        .map_err(|e| Error::Internal(format!("Failed to serialize completed principles: {}", e)))?;

    let mut tx = pool.begin().await?;

    let (tester_id, _) = find_or_create_tester(&mut tx, email).await?;

    sqlx::query(
        r#"
        INSERT INTO active_review_sessions (id, tester_id, story_id, progress, completed_principles)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (tester_id, story_id) DO UPDATE SET
            last_activity = CURRENT_TIMESTAMP,
            progress = excluded.progress,
            completed_principles = excluded.completed_principles
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(tester_id)
    .bind(story_id)
    .bind(progress)
    .bind(&completed)
    .execute(&mut *tx)
    .await?;

    let (session_id,): (String,) = sqlx::query_as(
        "SELECT id FROM active_review_sessions WHERE tester_id = ? AND story_id = ?",
    )
    .bind(tester_id)
    .bind(story_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(session_id)
}
