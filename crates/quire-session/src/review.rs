//! Review workflow session
//!
//! Holds the loaded queue and the list page between commands. Every command
//! returns a [`Notice`]; a failed command leaves the session as it was.

use crate::config::ReviewConfig;
use crate::download::{encode, Download};
use crate::error::{SessionError, SessionResult};
use crate::notice::Notice;
use quire_queue::{Direction, Disposition, RecordId, ReviewQueue, Status, StatusCounts};
use quire_table::{Cell, Table, TableLoader, TableWriter};
use serde::{Deserialize, Serialize};

/// Reviewer command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewCommand {
    /// Previous record (no-op at the first)
    Previous,
    /// Next record (no-op at the last)
    Next,
    /// Jump to a typed 1-based position
    Goto(String),
    /// Approve the current record
    Approve,
    /// Hold the current record
    Hold,
    /// Delete the current record
    Remove,
    /// Earlier list page
    PreviousPage,
    /// Later list page
    NextPage,
    /// Jump to a record picked from the list
    Open(RecordId),
}

/// Record under the cursor, ready to display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordView {
    pub id: RecordId,
    /// 1-based
    pub position: usize,
    pub total: usize,
    pub status: Status,
    /// Content columns in upload order
    pub fields: Vec<(String, Cell)>,
}

impl RecordView {
    /// Value of a content column
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Cell> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }
}

/// One clickable list entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub id: RecordId,
    pub position: usize,
    pub label: String,
    /// Entry is the record under the cursor
    pub current: bool,
}

/// List page, ready to display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListView {
    pub number: usize,
    pub total_pages: usize,
    pub entries: Vec<ListEntry>,
}

/// Review workflow state
#[derive(Debug, Clone)]
pub struct ReviewSession {
    config: ReviewConfig,
    queue: Option<ReviewQueue>,
    /// Requested list page (1-based), clamped when read
    list_page: usize,
}

impl Default for ReviewSession {
    fn default() -> Self {
        Self::new(ReviewConfig::default())
    }
}

impl ReviewSession {
    /// Create session with the given settings
    #[must_use]
    pub fn new(config: ReviewConfig) -> Self {
        Self {
            config,
            queue: None,
            list_page: 1,
        }
    }

    /// Settings in force
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Loaded queue, if any
    #[inline]
    #[must_use]
    pub fn queue(&self) -> Option<&ReviewQueue> {
        self.queue.as_ref()
    }

    /// Parse an uploaded payload and load it
    pub fn upload(&mut self, loader: &dyn TableLoader, bytes: &[u8]) -> Notice {
        match loader.parse(bytes) {
            Ok(table) => self.upload_table(&table),
            Err(err) => {
                tracing::warn!("Upload rejected: {}", err);
                SessionError::from(err).into()
            }
        }
    }

    /// Load a table as the new queue
    ///
    /// A rejected table keeps the previous queue in place.
    pub fn upload_table(&mut self, table: &Table) -> Notice {
        match ReviewQueue::load_with_schema(table, self.config.schema()) {
            Ok(queue) => {
                let counts = queue.counts();
                self.queue = Some(queue);
                self.list_page = 1;
                Notice::success(format!(
                    "Loaded {} questions ({} left to review)",
                    counts.total(),
                    counts.unset
                ))
            }
            Err(err) => {
                tracing::warn!("Upload rejected: {}", err);
                SessionError::from(err).into()
            }
        }
    }

    /// Apply a reviewer command
    pub fn handle(&mut self, command: ReviewCommand) -> Notice {
        tracing::debug!("Review command: {:?}", command);
        match self.apply(command) {
            Ok(notice) => notice,
            Err(err) => {
                tracing::warn!("Review command failed: {}", err);
                err.into()
            }
        }
    }

    fn apply(&mut self, command: ReviewCommand) -> SessionResult<Notice> {
        let page_size = self.config.page_size;
        let queue = self.queue.as_mut().ok_or(SessionError::NoQueue)?;
        let notice = match command {
            ReviewCommand::Previous => {
                let position = queue.advance(Direction::Previous)?;
                Notice::info(format!("Question {position} / {}", queue.len()))
            }
            ReviewCommand::Next => {
                let position = queue.advance(Direction::Next)?;
                Notice::info(format!("Question {position} / {}", queue.len()))
            }
            ReviewCommand::Goto(input) => {
                queue.goto(&input)?;
                let position = queue.current_position()?;
                Notice::info(format!("Question {position} / {}", queue.len()))
            }
            ReviewCommand::Approve => {
                let position = queue.current_position()?;
                queue.mark(position, Disposition::Approved)?;
                Notice::success(format!("Question {position} approved"))
            }
            ReviewCommand::Hold => {
                let position = queue.current_position()?;
                queue.mark(position, Disposition::Held)?;
                Notice::info(format!("Question {position} put on hold"))
            }
            ReviewCommand::Remove => {
                let position = queue.current_position()?;
                queue.remove(position)?;
                Notice::info(format!(
                    "Question {position} removed, {} left",
                    queue.len()
                ))
            }
            ReviewCommand::PreviousPage | ReviewCommand::NextPage => {
                let page = queue.paginate(self.list_page, page_size)?;
                let number = match command {
                    ReviewCommand::PreviousPage if page.has_previous() => page.number - 1,
                    ReviewCommand::NextPage if page.has_next() => page.number + 1,
                    _ => page.number,
                };
                let total_pages = page.total_pages;
                self.list_page = number;
                Notice::info(format!("Page {number} / {total_pages}"))
            }
            ReviewCommand::Open(id) => {
                let position = queue.goto_record(id)?;
                Notice::info(format!("Question {position} / {}", queue.len()))
            }
        };
        Ok(notice)
    }

    /// Record under the cursor
    #[must_use]
    pub fn view(&self) -> Option<RecordView> {
        let queue = self.queue.as_ref()?;
        let record = queue.current().ok()?;
        let position = queue.current_position().ok()?;
        Some(RecordView {
            id: record.id(),
            position,
            total: queue.len(),
            status: record.status(),
            fields: queue
                .columns()
                .iter()
                .cloned()
                .zip(record.values().iter().cloned())
                .collect(),
        })
    }

    /// Current list page
    #[must_use]
    pub fn list(&self) -> Option<ListView> {
        let queue = self.queue.as_ref()?;
        let page = queue.paginate(self.list_page, self.config.page_size).ok()?;
        let current = queue.current().ok().map(quire_queue::Record::id);
        Some(ListView {
            number: page.number,
            total_pages: page.total_pages,
            entries: page
                .entries
                .iter()
                .map(|entry| ListEntry {
                    id: entry.record.id(),
                    position: entry.position,
                    label: queue.entry_label(entry),
                    current: current == Some(entry.record.id()),
                })
                .collect(),
        })
    }

    /// Per-status counts of the loaded queue
    #[must_use]
    pub fn counts(&self) -> Option<StatusCounts> {
        self.queue.as_ref().map(ReviewQueue::counts)
    }

    /// Encode the queue, or one status subset of it, for download
    ///
    /// # Errors
    /// Returns the failure as a notice when nothing is loaded or encoding fails
    pub fn export(
        &self,
        writer: &dyn TableWriter,
        status: Option<Status>,
    ) -> Result<Download, Notice> {
        self.try_export(writer, status).map_err(|err| {
            tracing::warn!("Export failed: {}", err);
            Notice::from(err)
        })
    }

    fn try_export(
        &self,
        writer: &dyn TableWriter,
        status: Option<Status>,
    ) -> SessionResult<Download> {
        let queue = self.queue.as_ref().ok_or(SessionError::NoQueue)?;
        let table = queue.export(status)?;
        let stem = match status {
            None => self.config.export_file_stem.clone(),
            Some(status) => format!("{}_{}", self.config.export_file_stem, status.label()),
        };
        encode(writer, &table, &stem, &self.config.export_sheet)
    }

    /// Drop the queue and start over
    pub fn reset(&mut self) -> Notice {
        self.queue = None;
        self.list_page = 1;
        tracing::info!("Review session reset");
        Notice::info("Session cleared")
    }
}
