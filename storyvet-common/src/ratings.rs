//! The three-point rating scale used when scoring a story against a
//! criterion, and the verdict words used on export.
//!
//! Testers answer yes / partial / no; the answers are stored as 5 / 3 / 1.

use serde::{Deserialize, Serialize};

/// A tester's answer for one criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Yes,
    Partial,
    No,
}

impl Rating {
    /// Parse a submitted rating word. Case-insensitive.
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "yes" => Some(Self::Yes),
            "partial" => Some(Self::Partial),
            "no" => Some(Self::No),
            _ => None,
        }
    }

    /// Numeric value stored in `criterion_evaluations.rating`
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Yes => 5,
            Self::Partial => 3,
            Self::No => 1,
        }
    }
}

/// Map a stored rating to its export verdict word.
///
/// Ratings 1 and 2 both land in the "False" bucket, and anything outside
/// the known values reads as "Unknown". Stored ratings are constrained to
/// 1/3/5, so the extra branches only matter for data written by hand.
pub fn verdict_word(rating: i64) -> &'static str {
    match rating {
        5 => "True",
        3 => "Maybe",
        1 | 2 => "False",
        _ => "Unknown",
    }
}
