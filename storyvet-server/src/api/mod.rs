//! HTTP API handlers for the StoryVet server

pub mod activity;
pub mod admin;
pub mod datasets;
pub mod export;
pub mod feedback;
pub mod health;
pub mod review;
pub mod sessions;
pub mod stats;

pub use activity::activity;
pub use admin::admin_gate;
pub use datasets::{activate_dataset, create_dataset, get_active_dataset, list_datasets};
pub use export::export_dataset;
pub use feedback::submit_feedback;
pub use health::health_routes;
pub use review::{list_criteria, stories_for_review};
pub use sessions::session_heartbeat;
pub use stats::{criterion_stats, story_stats};
