//! StoryVet server library
//!
//! Testers score user stories from the active dataset against the six
//! INVEST principles; admins manage datasets, watch review activity, and
//! export annotated data.

pub mod api;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::{middleware, Router};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    // Admin routes (dataset management and export) sit behind the admin
    // gate. The gate currently allows everyone; see api::admin.
    let admin = Router::new()
        .route("/api/datasets", get(api::list_datasets).post(api::create_dataset))
        .route("/api/datasets/active", get(api::get_active_dataset))
        .route("/api/datasets/:id/activate", post(api::activate_dataset))
        .route("/api/datasets/:id/export", get(api::export_dataset))
        .layer(middleware::from_fn(api::admin_gate));

    // Reviewer and monitoring routes
    let public = Router::new()
        .route("/api/feedback", post(api::submit_feedback))
        .route("/api/stories", get(api::stories_for_review))
        .route("/api/criteria", get(api::list_criteria))
        .route("/api/stats/criteria", get(api::criterion_stats))
        .route("/api/stats/stories", get(api::story_stats))
        .route("/api/activity", get(api::activity))
        .route("/api/sessions/heartbeat", post(api::session_heartbeat))
        .merge(api::health_routes());

    Router::new()
        .merge(admin)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
