//! Export assembler
//!
//! Turns the flat evaluation rows of one dataset into the nested
//! source -> epic -> story -> assessor document consumed downstream. The
//! query orders rows so one forward pass can group them.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use sqlx::SqlitePool;

use storyvet_common::db::models::parse_string_list;
use storyvet_common::ratings::verdict_word;
use storyvet_common::{Error, Result};

/// Top-level export value: one entry per source key
pub type ExportDocument = BTreeMap<String, SourceEntry>;

#[derive(Debug, Serialize)]
pub struct SourceEntry {
    pub epics: Vec<EpicEntry>,
}

#[derive(Debug, Serialize)]
pub struct EpicEntry {
    pub epic: String,
    pub id: String,
    pub user_stories: Vec<StoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct StoryEntry {
    pub user_story: String,
    pub description: String,
    pub acceptance_criteria: Vec<String>,
    pub id: String,
    pub annotation: Annotation,
    /// Internal story id used for grouping; the exported `id` above may
    /// be the upstream identifier instead.
    #[serde(skip)]
    internal_id: i64,
}

#[derive(Debug, Serialize)]
pub struct Annotation {
    pub assessors: Vec<AssessorEntry>,
}

#[derive(Debug, Serialize)]
pub struct AssessorEntry {
    pub id: String,
    pub feedback: String,
    pub criteria: BTreeMap<String, String>,
}

/// Assembled export plus the filename to suggest for download
#[derive(Debug)]
pub struct ExportResult {
    pub filename: String,
    pub document: ExportDocument,
}

const EXPORT_ROWS_SQL: &str = r#"
SELECT COALESCE(us.source_key, ''), COALESCE(us.epic_name, ''), us.epic_id,
       us.id, us.title, COALESCE(us.description, ''),
       us.acceptance_criteria, us.original_story_id,
       r.id, COALESCE(r.additional_feedback, ''), t.email,
       ec.name, ce.rating
FROM user_stories us
JOIN reviews r ON r.story_id = us.id
JOIN testers t ON t.id = r.tester_id
JOIN criterion_evaluations ce ON ce.review_id = r.id
JOIN evaluation_criteria ec ON ec.id = ce.criterion_id
WHERE us.dataset_id = ?
ORDER BY us.source_key ASC, us.epic_name ASC, us.id ASC, r.id ASC, ce.criterion_id ASC
"#;

/// Assemble the annotated export for one dataset.
///
/// A missing dataset and a dataset without any reviewed stories are both
/// not-found conditions; an empty document is never produced.
pub async fn export_dataset(pool: &SqlitePool, dataset_id: i64) -> Result<ExportResult> {
    let dataset: Option<(String,)> = sqlx::query_as("SELECT filename FROM datasets WHERE id = ?")
        .bind(dataset_id)
        .fetch_optional(pool)
        .await?;
    let Some((stored_filename,)) = dataset else {
        return Err(Error::NotFound(format!("Dataset {} not found", dataset_id)));
    };

    type Row = (
        String,
        String,
        Option<String>,
        i64,
        String,
        String,
        Option<String>,
        Option<String>,
        i64,
        String,
        String,
        String,
        i64,
    );

    let rows: Vec<Row> = sqlx::query_as(EXPORT_ROWS_SQL)
        .bind(dataset_id)
        .fetch_all(pool)
        .await?;

    if rows.is_empty() {
        return Err(Error::NotFound("no reviewed stories found".to_string()));
    }

    let mut document = ExportDocument::new();

    for (
        source_key,
        epic_name,
        epic_id,
        story_id,
        title,
        description,
        acceptance_criteria,
        original_story_id,
        _review_id,
        feedback,
        tester_email,
        criterion_name,
        rating,
    ) in rows
    {
        let source = document
            .entry(source_key)
            .or_insert_with(|| SourceEntry { epics: Vec::new() });

        let epic = match source.epics.iter_mut().find(|e| e.epic == epic_name) {
            Some(existing) => existing,
            None => {
                source.epics.push(EpicEntry {
                    id: epic_id.unwrap_or_else(|| epic_name.clone()),
                    epic: epic_name,
                    user_stories: Vec::new(),
                });
                source.epics.last_mut().unwrap()
            }
        };

        let story = match epic
            .user_stories
            .iter_mut()
            .find(|s| s.internal_id == story_id)
        {
            Some(existing) => existing,
            None => {
                epic.user_stories.push(StoryEntry {
                    user_story: title,
                    description,
                    acceptance_criteria: parse_string_list(
                        "acceptance_criteria",
                        acceptance_criteria.as_deref(),
                    ),
                    id: original_story_id.unwrap_or_else(|| story_id.to_string()),
                    annotation: Annotation {
                        assessors: Vec::new(),
                    },
                    internal_id: story_id,
                });
                epic.user_stories.last_mut().unwrap()
            }
        };

        let assessor = match story
            .annotation
            .assessors
            .iter_mut()
            .find(|a| a.id == tester_email)
        {
            Some(existing) => existing,
            None => {
                story.annotation.assessors.push(AssessorEntry {
                    id: tester_email,
                    feedback,
                    criteria: BTreeMap::new(),
                });
                story.annotation.assessors.last_mut().unwrap()
            }
        };

        assessor
            .criteria
            .insert(criterion_name, verdict_word(rating).to_string());
    }

    Ok(ExportResult {
        filename: export_filename(dataset_id, &stored_filename),
        document,
    })
}

/// Suggested download filename: the stored dataset filename with its
/// extension stripped, or a `dataset_<id>` fallback.
fn export_filename(dataset_id: i64, stored_filename: &str) -> String {
    let stem = Path::new(stored_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("dataset_{}", dataset_id));

    format!("{}_annotated.json", stem)
}
