//! Error types for the review queue
//!
//! Load failures (`Schema`, `UnknownStatus`, `EmptyQueue`) are fatal to the
//! operation that raised them. Navigation failures (`OutOfRange`,
//! `InvalidInput`, `InvalidPageSize`, `UnknownRecord`) are the reviewer's
//! mistakes and are reported as warnings with no state change.

use crate::record::{RecordId, Status};

/// How a failure should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Bad input, recovered locally
    Warning,
    /// Operation could not run at all
    Error,
}

/// Review queue errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Required content columns are absent
    #[error("missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// Status column holds a value we cannot map to a disposition
    #[error("row {row}: unrecognized status '{value}'")]
    UnknownStatus { row: usize, value: String },

    /// No records to operate on
    #[error("the queue has no records")]
    EmptyQueue,

    /// 1-based position outside `1..=len`
    #[error("record number {position} is out of range (1-{len})")]
    OutOfRange { position: i64, len: usize },

    /// Record id that was removed or never belonged to this queue
    #[error("record {0} is no longer in the queue")]
    UnknownRecord(RecordId),

    /// Navigation input is not an integer
    #[error("'{input}' is not a record number")]
    InvalidInput { input: String },

    /// Pagination with a zero page size
    #[error("page size must be at least 1")]
    InvalidPageSize,

    /// Status change not permitted by the state machine
    #[error("cannot move a record from {from} to {to}")]
    IllegalTransition { from: Status, to: Status },

    /// Queue could not be materialized as a table
    #[error("export failed: {0}")]
    Export(String),
}

impl QueueError {
    /// Presentation severity
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            QueueError::OutOfRange { .. }
            | QueueError::UnknownRecord(_)
            | QueueError::InvalidInput { .. }
            | QueueError::InvalidPageSize => Severity::Warning,
            QueueError::Schema { .. }
            | QueueError::UnknownStatus { .. }
            | QueueError::EmptyQueue
            | QueueError::IllegalTransition { .. }
            | QueueError::Export(_) => Severity::Error,
        }
    }

    /// Check if the session can carry on with its current queue
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.severity() == Severity::Warning
    }
}

/// Result type alias for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_lists_columns() {
        let err = QueueError::Schema {
            missing: vec!["question".to_string(), "ex1".to_string()],
        };
        assert_eq!(err.to_string(), "missing required columns: question, ex1");
        assert_eq!(err.severity(), Severity::Error);
    }

    #[test]
    fn navigation_errors_are_warnings() {
        assert!(QueueError::OutOfRange { position: 0, len: 3 }.is_recoverable());
        assert!(QueueError::InvalidInput {
            input: "abc".to_string()
        }
        .is_recoverable());
        assert!(QueueError::UnknownRecord(RecordId::new()).is_recoverable());
        assert!(!QueueError::EmptyQueue.is_recoverable());
    }
}
