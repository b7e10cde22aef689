//! Error types for sessions and configuration

use crate::notice::NoticeLevel;
use quire_queue::{QueueError, Severity};
use quire_sandbox::SandboxError;
use quire_table::TableError;
use std::path::PathBuf;

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for [`QuireConfig`](crate::QuireConfig)
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parse but make no sense
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Session command failures
///
/// Command handlers turn these into [`Notice`](crate::Notice)s; they never
/// escape the session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    /// Sandbox worker thread panicked or was cancelled
    #[error("sandbox worker stopped: {0}")]
    Worker(String),

    /// Text generation collaborator failed
    #[error("text generation failed: {0}")]
    Generation(String),

    /// Review command before any upload
    #[error("no question sheet is loaded")]
    NoQueue,

    /// Analysis command that needs the merged table before a merge
    #[error("merge the uploaded tables first")]
    NotMerged,

    /// Upload name not known to the session
    #[error("no uploaded table named '{0}'")]
    UnknownUpload(String),

    /// Merge requested with nothing uploaded
    #[error("there are no uploaded tables to merge")]
    NothingToMerge,

    /// Free-text request left blank
    #[error("the question is empty")]
    EmptyQuestion,
}

impl SessionError {
    /// Notice level for this failure
    #[must_use]
    pub fn level(&self) -> NoticeLevel {
        match self {
            SessionError::Queue(err) if err.severity() == Severity::Warning => NoticeLevel::Warning,
            SessionError::NoQueue
            | SessionError::NotMerged
            | SessionError::NothingToMerge
            | SessionError::EmptyQuestion => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        }
    }
}

/// Result type alias for session internals
pub type SessionResult<T> = Result<T, SessionError>;
