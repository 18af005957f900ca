//! Database initialization
//!
//! Creates the database on first run and brings an existing one up to the
//! expected schema. All statements are idempotent, so startup can run the
//! whole sequence unconditionally.

use crate::criteria::INVEST_PRINCIPLES;
use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers while a submission commits
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_tables(&pool).await?;
    seed_evaluation_criteria(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_testers_table(pool).await?;
    create_datasets_table(pool).await?;
    create_user_stories_table(pool).await?;
    create_evaluation_criteria_table(pool).await?;
    create_reviews_table(pool).await?;
    create_criterion_evaluations_table(pool).await?;
    create_active_review_sessions_table(pool).await?;

    Ok(())
}

/// Create the testers table
///
/// Testers are created lazily on first feedback submission and never
/// deleted. The email is the only external identity.
pub async fn create_testers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS testers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            name TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the datasets table
///
/// At most one dataset has is_active = 1; the activation operation
/// enforces this, not a schema constraint.
pub async fn create_datasets_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS datasets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            filename TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 0,
            uploaded_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the user_stories table
///
/// Stories are immutable after import. acceptance_criteria holds a JSON
/// string array; the seed_* flags are pre-computed heuristics carried
/// from the source data, distinct from tester ratings.
pub async fn create_user_stories_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_stories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dataset_id INTEGER NOT NULL REFERENCES datasets(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            acceptance_criteria TEXT,
            source_key TEXT,
            epic_name TEXT,
            epic_id TEXT,
            original_story_id TEXT,
            seed_independent INTEGER,
            seed_negotiable INTEGER,
            seed_valuable INTEGER,
            seed_estimable INTEGER,
            seed_small INTEGER,
            seed_testable INTEGER,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_user_stories_dataset ON user_stories(dataset_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the evaluation_criteria table
pub async fn create_evaluation_criteria_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS evaluation_criteria (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the reviews table
pub async fn create_reviews_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            story_id INTEGER NOT NULL REFERENCES user_stories(id) ON DELETE CASCADE,
            tester_id INTEGER NOT NULL REFERENCES testers(id) ON DELETE CASCADE,
            additional_feedback TEXT NOT NULL DEFAULT '',
            submitted_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_story ON reviews(story_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_tester ON reviews(tester_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_submitted_at ON reviews(submitted_at)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the criterion_evaluations table
///
/// One row per criterion per review. Ratings use the three-point scale.
pub async fn create_criterion_evaluations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS criterion_evaluations (
            review_id INTEGER NOT NULL REFERENCES reviews(id) ON DELETE CASCADE,
            criterion_id INTEGER NOT NULL REFERENCES evaluation_criteria(id) ON DELETE CASCADE,
            rating INTEGER NOT NULL CHECK (rating IN (1, 3, 5)),
            PRIMARY KEY (review_id, criterion_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_criterion_evaluations_criterion ON criterion_evaluations(criterion_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the active_review_sessions table
///
/// Tracks in-progress, not-yet-submitted reviews for the live admin view.
/// One session per (tester, story); heartbeats update the existing row.
pub async fn create_active_review_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS active_review_sessions (
            id TEXT PRIMARY KEY,
            tester_id INTEGER NOT NULL REFERENCES testers(id) ON DELETE CASCADE,
            story_id INTEGER NOT NULL REFERENCES user_stories(id) ON DELETE CASCADE,
            started_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            last_activity TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            progress INTEGER NOT NULL DEFAULT 0,
            completed_principles TEXT,
            UNIQUE (tester_id, story_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_active_sessions_activity ON active_review_sessions(last_activity)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Seed the six INVEST principles (idempotent)
pub async fn seed_evaluation_criteria(pool: &SqlitePool) -> Result<()> {
    for (name, description) in INVEST_PRINCIPLES {
        sqlx::query("INSERT OR IGNORE INTO evaluation_criteria (name, description) VALUES (?, ?)")
            .bind(name)
            .bind(description)
            .execute(pool)
            .await?;
    }

    Ok(())
}
