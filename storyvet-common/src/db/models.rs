//! Database models

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tester {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: i64,
    pub name: String,
    pub filename: String,
    pub is_active: bool,
}

/// One imported user story. acceptance_criteria is kept in its stored
/// form (a JSON string array) and parsed defensively where needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStory {
    pub id: i64,
    pub dataset_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub acceptance_criteria: Option<String>,
    pub source_key: Option<String>,
    pub epic_name: Option<String>,
    pub epic_id: Option<String>,
    pub original_story_id: Option<String>,
    pub seed_flags: SeedFlags,
}

/// Pre-computed per-principle heuristic flags carried from the source
/// data. These are hints, not tester ratings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedFlags {
    pub independent: Option<bool>,
    pub negotiable: Option<bool>,
    pub valuable: Option<bool>,
    pub estimable: Option<bool>,
    pub small: Option<bool>,
    pub testable: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationCriterion {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub story_id: i64,
    pub tester_id: i64,
    pub additional_feedback: String,
    pub submitted_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionEvaluation {
    pub review_id: i64,
    pub criterion_id: i64,
    pub rating: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveReviewSession {
    pub id: String,
    pub tester_id: i64,
    pub story_id: i64,
    pub started_at: String,
    pub last_activity: String,
    pub progress: i64,
    pub completed_principles: Vec<String>,
}

/// Parse a JSON string-array column (acceptance criteria, completed
/// principles). A malformed value degrades to an empty list with a logged
/// warning; it never fails the surrounding read.
pub fn parse_string_list(field: &str, raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    if raw.trim().is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(list) => list,
        Err(e) => {
            warn!("Failed to parse {} as a JSON list, treating as empty: {}", field, e);
            Vec::new()
        }
    }
}
