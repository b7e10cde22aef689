//! quire Session
//!
//! Explicit session objects for the two workflows. Front ends translate user
//! actions into handler calls; every handler reports back with a [`Notice`]
//! and leaves the session unchanged when it fails.
//!
//! - [`ReviewSession`]: upload a question sheet, page through it, approve or
//!   hold records, export
//! - [`AnalysisSession`]: edit and merge uploads, then summarize, answer and
//!   chart the merged table through a [`TextGenerator`] and the sandbox
//! - [`QuireConfig`]: TOML configuration for both
//!
//! # Example
//!
//! ```rust
//! use quire_session::{ReviewCommand, ReviewSession};
//! use quire_table::{Cell, Table};
//!
//! let mut config = quire_session::ReviewConfig::new().with_required_fields(["q_idx", "question"]);
//! config.page_size = 5;
//! let mut session = ReviewSession::new(config);
//!
//! let sheet = Table::from_rows(["q_idx", "question"], vec![
//!     vec![Cell::Int(7), Cell::text("2 + 2?")],
//!     vec![Cell::Int(8), Cell::text("3 + 3?")],
//! ]).unwrap();
//! assert!(!session.upload_table(&sheet).is_failure());
//!
//! session.handle(ReviewCommand::Approve);
//! assert_eq!(session.view().unwrap().position, 2);
//! assert_eq!(session.list().unwrap().entries[0].label, "1 / Q_IDX: 7 [approved]");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod analysis;
mod config;
mod download;
mod error;
mod fence;
mod generator;
mod notice;
mod prompt;
mod review;

pub use analysis::{AnalysisSession, Visualization};
pub use config::{AnalysisConfig, QuireConfig, ReviewConfig, SandboxConfig};
pub use download::Download;
pub use error::{ConfigError, SessionError, SessionResult};
pub use fence::extract_code;
pub use generator::{CannedGenerator, GenerationError, Prompt, TextGenerator};
pub use notice::{Notice, NoticeLevel};
pub use review::{ListEntry, ListView, RecordView, ReviewCommand, ReviewSession};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
