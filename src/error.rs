// 🚨 Engine Errors - Fatal vs recoverable conditions
//
// Fatal errors abort the run before any standings exist.
// Recoverable errors never abort; they become diagnostics issues.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which free-text field failed category lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryField {
    Equipment,
    Division,
}

impl CategoryField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryField::Equipment => "equipment",
            CategoryField::Division => "division",
        }
    }
}

impl std::fmt::Display for CategoryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A category synonym is missing from the tables (fatal)
    #[error("Unrecognized {field} '{value}' for competitor '{competitor}'")]
    UnrecognizedCategory {
        field: CategoryField,
        value: String,
        competitor: String,
    },

    /// Category tables are inconsistent (fatal)
    #[error("Invalid category tables: {0}")]
    InvalidTables(String),

    /// More than one roster entry matched the competitor; first one wins
    #[error("Ambiguous club mapping for '{competitor}': {}", clubs.join(", "))]
    AmbiguousClubMapping {
        competitor: String,
        clubs: Vec<String>,
    },

    /// Score missing and cannot be computed
    #[error("Insufficient data to score '{competitor}': {reason}")]
    InsufficientDataForScore { competitor: String, reason: String },

    /// No roster entry and no team hint
    #[error("No club found for '{competitor}'")]
    UnresolvedClub { competitor: String },
}

impl EngineError {
    /// Fatal errors halt the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::UnrecognizedCategory { .. } | EngineError::InvalidTables(_)
        )
    }

    /// Competitor the error refers to, if any
    pub fn competitor(&self) -> Option<&str> {
        match self {
            EngineError::UnrecognizedCategory { competitor, .. }
            | EngineError::AmbiguousClubMapping { competitor, .. }
            | EngineError::InsufficientDataForScore { competitor, .. }
            | EngineError::UnresolvedClub { competitor } => Some(competitor),
            EngineError::InvalidTables(_) => None,
        }
    }
}
