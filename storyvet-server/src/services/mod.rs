//! Storage-facing operations
//!
//! Each module owns one operation group over the shared pool. Handlers in
//! `api/` stay thin and delegate here.

pub mod activity;
pub mod datasets;
pub mod export;
pub mod feedback;
pub mod sessions;
pub mod stats;
pub mod testers;
