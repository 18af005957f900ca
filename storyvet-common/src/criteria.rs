//! Criterion vocabulary resolver
//!
//! Single source of truth for valid INVEST principle names. The resolver
//! is a read-only snapshot of the `evaluation_criteria` rows; the
//! criterion set is static after seeding, so a snapshot per operation is
//! sufficient.

use std::collections::HashMap;

use crate::Result;

/// The six INVEST principles, in seeding order
pub const INVEST_PRINCIPLES: [(&str, &str); 6] = [
    ("Independent", "The story can be developed and delivered on its own."),
    ("Negotiable", "The story leaves room for discussion of details."),
    ("Valuable", "The story delivers value to a stakeholder."),
    ("Estimable", "The team can estimate the effort the story needs."),
    ("Small", "The story is small enough to fit in one iteration."),
    ("Testable", "The story can be verified by concrete tests."),
];

/// Read-only snapshot of the criterion vocabulary
#[derive(Debug, Clone)]
pub struct CriterionResolver {
    by_name: HashMap<String, i64>,
}

impl CriterionResolver {
    /// Build a resolver from `(id, name)` rows
    pub fn new(rows: Vec<(i64, String)>) -> Self {
        let by_name = rows.into_iter().map(|(id, name)| (name, id)).collect();
        Self { by_name }
    }

    /// Load the snapshot from storage. Accepts a pool or an open
    /// transaction, so the submission path can resolve names inside its
    /// own transaction.
    pub async fn load<'e, E>(executor: E) -> Result<Self>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT id, name FROM evaluation_criteria ORDER BY id",
        )
        .fetch_all(executor)
        .await?;

        Ok(Self::new(rows))
    }

    /// Resolve a canonical criterion name. Exact, case-sensitive match.
    pub fn name_to_id(&self, name: &str) -> Option<i64> {
        self.by_name.get(name).copied()
    }

    /// External string identifier used in filters and URLs
    pub fn external_key(name: &str) -> String {
        name.to_lowercase()
    }

    /// Resolve an external (lowercase) key back to a criterion id
    pub fn id_for_external_key(&self, key: &str) -> Option<i64> {
        self.by_name
            .iter()
            .find(|(name, _)| name.to_lowercase() == key)
            .map(|(_, id)| *id)
    }
}
