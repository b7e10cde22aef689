//! Queue schema
//!
//! Which columns an uploaded sheet must carry, where the status lives, and
//! which column labels a record in lists.

use serde::{Deserialize, Serialize};

/// Columns every question sheet must carry
pub const DEFAULT_REQUIRED_FIELDS: &[&str] = &[
    "subject",
    "chapter",
    "q_idx",
    "question",
    "content",
    "ex1",
    "ex2",
    "ex3",
    "ex4",
    "solve_gpt",
    "관련 주제",
    "관련 주제 스크립트",
];

/// Column holding the disposition
pub const DEFAULT_STATUS_COLUMN: &str = "status";

/// Column used to label records in lists
pub const DEFAULT_IDENTIFIER_FIELD: &str = "q_idx";

/// Sheet layout expected by [`ReviewQueue::load_with_schema`](crate::ReviewQueue::load_with_schema)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSchema {
    /// Columns that must be present
    pub required_fields: Vec<String>,
    /// Status column name (added on export when the upload lacked it)
    pub status_column: String,
    /// External identifier shown next to positions, if any
    pub identifier_field: Option<String>,
}

impl QueueSchema {
    /// Create default schema
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With required fields
    #[must_use]
    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// With identifier field
    #[inline]
    #[must_use]
    pub fn with_identifier_field(mut self, field: Option<String>) -> Self {
        self.identifier_field = field;
        self
    }
}

impl Default for QueueSchema {
    fn default() -> Self {
        Self {
            required_fields: DEFAULT_REQUIRED_FIELDS.iter().map(|s| (*s).to_string()).collect(),
            status_column: DEFAULT_STATUS_COLUMN.to_string(),
            identifier_field: Some(DEFAULT_IDENTIFIER_FIELD.to_string()),
        }
    }
}
