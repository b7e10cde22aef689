//! Error types for tabular payloads

/// Errors raised while building, editing or (de)serialising tables
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Row width differs from the header width
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Same column name appears twice in a header
    #[error("duplicate column: '{0}'")]
    DuplicateColumn(String),

    /// Column name not present in the table
    #[error("unknown column: '{0}'")]
    UnknownColumn(String),

    /// Row index outside the table
    #[error("row {row} is out of range (table has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },

    /// Payload could not be decoded or encoded
    #[error("malformed table payload: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Result type alias for table operations
pub type TableResult<T> = Result<T, TableError>;
