//! Review queue
//!
//! An ordered set of records with one disposition each and a cursor on the
//! record being reviewed.
//!
//! # Invariants
//! - Order is upload order and never changes on status mutation.
//! - Each record carries exactly one [`Status`]; approved/held lists are
//!   derived with [`ReviewQueue::filter`], never stored alongside.
//! - While the queue is non-empty the cursor indexes an existing record.
//!
//! Positions in the public API are 1-based.

use crate::error::{QueueError, QueueResult};
use crate::page::{Page, PageEntry};
use crate::record::{Disposition, Record, RecordId, Status};
use crate::schema::QueueSchema;
use crate::state_machine::validate_transition;
use quire_table::{Cell, Table};

/// Paging direction for [`ReviewQueue::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards position 1
    Previous,
    /// Towards the end
    Next,
}

/// Per-status record counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub unset: usize,
    pub approved: usize,
    pub held: usize,
}

impl StatusCounts {
    /// Total records
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.unset + self.approved + self.held
    }
}

/// The review queue
#[derive(Debug, Clone)]
pub struct ReviewQueue {
    schema: QueueSchema,
    /// Content columns (status excluded), in upload order
    columns: Vec<String>,
    records: Vec<Record>,
    /// 0-based index of the displayed record
    cursor: usize,
}

impl ReviewQueue {
    /// Load with the default question-sheet schema
    ///
    /// # Errors
    /// See [`ReviewQueue::load_with_schema`]
    pub fn load(table: &Table) -> QueueResult<Self> {
        Self::load_with_schema(table, QueueSchema::default())
    }

    /// Build a queue from an uploaded table
    ///
    /// Existing status values are kept so a partially reviewed sheet can be
    /// resumed. The cursor starts on the first unset record, or the first
    /// record when everything is already disposed.
    ///
    /// # Errors
    /// - `Schema` if required columns are missing
    /// - `EmptyQueue` if the table has no rows
    /// - `UnknownStatus` if a status cell cannot be mapped
    pub fn load_with_schema(table: &Table, schema: QueueSchema) -> QueueResult<Self> {
        let missing: Vec<String> = schema
            .required_fields
            .iter()
            .filter(|f| !table.has_column(f))
            .cloned()
            .collect();
        if !missing.is_empty() {
            tracing::warn!("Upload rejected, missing columns: {:?}", missing);
            return Err(QueueError::Schema { missing });
        }
        if table.is_empty() {
            return Err(QueueError::EmptyQueue);
        }

        let status_idx = table.column_index(&schema.status_column);
        let columns: Vec<String> = table
            .columns()
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != status_idx)
            .map(|(_, c)| c.clone())
            .collect();

        let mut records = Vec::with_capacity(table.len());
        for (row_idx, row) in table.rows().iter().enumerate() {
            let status = match status_idx {
                Some(i) => Status::parse_cell(&row[i]).ok_or_else(|| QueueError::UnknownStatus {
                    row: row_idx + 1,
                    value: row[i].as_text(),
                })?,
                None => Status::Unset,
            };
            let values = row
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != status_idx)
                .map(|(_, c)| c.clone())
                .collect();
            records.push(Record::new(values, status));
        }

        let cursor = records
            .iter()
            .position(|r| r.status() == Status::Unset)
            .unwrap_or(0);

        let queue = Self {
            schema,
            columns,
            records,
            cursor,
        };
        let counts = queue.counts();
        tracing::info!(
            "Loaded review queue: {} records ({} pending, {} approved, {} held)",
            counts.total(),
            counts.unset,
            counts.approved,
            counts.held
        );
        Ok(queue)
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the queue has no records
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Content columns (status excluded)
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Schema the queue was loaded with
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &QueueSchema {
        &self.schema
    }

    /// All records in order
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Record at a 1-based position
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Record> {
        position.checked_sub(1).and_then(|i| self.records.get(i))
    }

    /// 1-based position of a record
    #[must_use]
    pub fn position_of(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id).map(|i| i + 1)
    }

    /// Value of a named column on a record
    #[must_use]
    pub fn value<'a>(&self, record: &'a Record, column: &str) -> Option<&'a Cell> {
        let idx = self.columns.iter().position(|c| c == column)?;
        record.values().get(idx)
    }

    /// Record under the cursor
    ///
    /// # Errors
    /// Returns `EmptyQueue` if there are no records
    pub fn current(&self) -> QueueResult<&Record> {
        self.records.get(self.cursor).ok_or(QueueError::EmptyQueue)
    }

    /// 1-based cursor position
    ///
    /// # Errors
    /// Returns `EmptyQueue` if there are no records
    pub fn current_position(&self) -> QueueResult<usize> {
        self.current().map(|_| self.cursor + 1)
    }

    /// Jump to a position typed by the reviewer
    ///
    /// # Errors
    /// - `InvalidInput` if `input` is not an integer
    /// - `OutOfRange` if it is not within `1..=len`
    pub fn goto(&mut self, input: &str) -> QueueResult<()> {
        let trimmed = input.trim();
        let position = trimmed.parse::<i64>().map_err(|_| {
            tracing::warn!("Rejected navigation input: {:?}", input);
            QueueError::InvalidInput {
                input: trimmed.to_string(),
            }
        })?;
        self.goto_position(position)
    }

    /// Jump to a 1-based position
    ///
    /// # Errors
    /// - `EmptyQueue` if there are no records
    /// - `OutOfRange` if `position` is not within `1..=len`
    pub fn goto_position(&mut self, position: i64) -> QueueResult<()> {
        let idx = self.index_of(position)?;
        self.cursor = idx;
        tracing::debug!("Cursor moved to {}", idx + 1);
        Ok(())
    }

    /// Jump to a record by identity
    ///
    /// # Errors
    /// Returns `UnknownRecord` if the record is no longer in the queue
    pub fn goto_record(&mut self, id: RecordId) -> QueueResult<usize> {
        let position = self
            .position_of(id)
            .ok_or(QueueError::UnknownRecord(id))?;
        self.cursor = position - 1;
        Ok(position)
    }

    /// Step one record along the full sequence
    ///
    /// Clamped at both ends: paging past the boundary is a no-op.
    ///
    /// # Errors
    /// Returns `EmptyQueue` if there are no records
    pub fn advance(&mut self, direction: Direction) -> QueueResult<usize> {
        if self.records.is_empty() {
            return Err(QueueError::EmptyQueue);
        }
        self.cursor = match direction {
            Direction::Previous => self.cursor.saturating_sub(1),
            Direction::Next => (self.cursor + 1).min(self.records.len() - 1),
        };
        tracing::debug!("Cursor moved to {}", self.cursor + 1);
        Ok(self.cursor + 1)
    }

    /// Dispose of the record at `position` and auto-advance
    ///
    /// The cursor moves to the next unset record after `position`; when none
    /// is left it rests on the last record. Returns the new 1-based cursor
    /// position.
    ///
    /// # Errors
    /// - `EmptyQueue` if there are no records
    /// - `OutOfRange` if `position` is not within `1..=len`
    pub fn mark(&mut self, position: usize, disposition: Disposition) -> QueueResult<usize> {
        let idx = self.index_of(to_signed(position))?;
        let target = Status::from(disposition);
        validate_transition(self.records[idx].status(), target)?;
        self.records[idx].set_status(target);

        self.cursor = self
            .next_unset_index(idx)
            .unwrap_or(self.records.len() - 1);
        tracing::info!(
            "Record {} marked {}, cursor at {}",
            position,
            target,
            self.cursor + 1
        );
        Ok(self.cursor + 1)
    }

    /// Dispose of the record under the cursor
    ///
    /// # Errors
    /// Returns `EmptyQueue` if there are no records
    pub fn mark_current(&mut self, disposition: Disposition) -> QueueResult<usize> {
        let position = self.current_position()?;
        self.mark(position, disposition)
    }

    /// 1-based position of the first unset record after `position`
    #[must_use]
    pub fn next_unset_after(&self, position: usize) -> Option<usize> {
        let idx = position.checked_sub(1)?;
        self.next_unset_index(idx).map(|i| i + 1)
    }

    /// Records with the given status, in queue order
    #[must_use]
    pub fn filter(&self, status: Status) -> Vec<&Record> {
        self.records.iter().filter(|r| r.status() == status).collect()
    }

    /// Per-status counts
    #[must_use]
    pub fn counts(&self) -> StatusCounts {
        self.records
            .iter()
            .fold(StatusCounts::default(), |mut acc, r| {
                match r.status() {
                    Status::Unset => acc.unset += 1,
                    Status::Approved => acc.approved += 1,
                    Status::Held => acc.held += 1,
                }
                acc
            })
    }

    /// Delete the record at `position`
    ///
    /// Later records shift down one position; record identities are
    /// unaffected. The cursor stays on the record it was showing, or, if that
    /// record was deleted, on whichever record now holds its position.
    ///
    /// # Errors
    /// - `EmptyQueue` if there are no records
    /// - `OutOfRange` if `position` is not within `1..=len`
    pub fn remove(&mut self, position: usize) -> QueueResult<Record> {
        let idx = self.index_of(to_signed(position))?;
        let removed = self.records.remove(idx);

        if idx < self.cursor {
            self.cursor -= 1;
        } else if self.cursor >= self.records.len() {
            self.cursor = self.records.len().saturating_sub(1);
        }
        tracing::info!("Removed record {} ({} left)", position, self.records.len());
        Ok(removed)
    }

    /// One window of the full sequence
    ///
    /// `page` is 1-based and clamped to `1..=total_pages`. An empty queue
    /// has a single empty page.
    ///
    /// # Errors
    /// Returns `InvalidPageSize` when `page_size` is zero
    pub fn paginate(&self, page: usize, page_size: usize) -> QueueResult<Page<'_>> {
        if page_size == 0 {
            return Err(QueueError::InvalidPageSize);
        }
        let total_pages = self.records.len().div_ceil(page_size).max(1);
        let number = page.clamp(1, total_pages);
        let start = (number - 1) * page_size;
        let end = (start + page_size).min(self.records.len());

        let entries = self.records[start..end]
            .iter()
            .enumerate()
            .map(|(offset, record)| PageEntry {
                position: start + offset + 1,
                record,
            })
            .collect();

        Ok(Page {
            number,
            total_pages,
            entries,
        })
    }

    /// List label for a page entry: `"{pos} / Q_IDX: {id} [{status}]"`
    #[must_use]
    pub fn entry_label(&self, entry: &PageEntry<'_>) -> String {
        let status = entry.record.status().label();
        match self
            .schema
            .identifier_field
            .as_deref()
            .and_then(|f| self.value(entry.record, f))
        {
            Some(ident) => format!("{} / Q_IDX: {} [{}]", entry.position, ident, status),
            None => format!("{} [{}]", entry.position, status),
        }
    }

    /// Materialize the queue as a table, optionally filtered by status
    ///
    /// Content columns keep their upload order; the status column comes last.
    ///
    /// # Errors
    /// Returns `Export` if the table cannot be assembled
    pub fn export(&self, status: Option<Status>) -> QueueResult<Table> {
        let mut header = self.columns.clone();
        header.push(self.schema.status_column.clone());

        let rows = self
            .records
            .iter()
            .filter(|r| status.map_or(true, |s| r.status() == s))
            .map(|r| {
                let mut row = r.values().to_vec();
                row.push(Cell::text(r.status().as_export_str()));
                row
            })
            .collect();

        let table =
            Table::from_rows(header, rows).map_err(|e| QueueError::Export(e.to_string()))?;
        tracing::info!(
            "Exported {} records (filter: {:?})",
            table.len(),
            status
        );
        Ok(table)
    }

    fn index_of(&self, position: i64) -> QueueResult<usize> {
        if self.records.is_empty() {
            return Err(QueueError::EmptyQueue);
        }
        let len = self.records.len();
        usize::try_from(position)
            .ok()
            .filter(|p| (1..=len).contains(p))
            .map(|p| p - 1)
            .ok_or_else(|| {
                tracing::warn!("Position {} outside 1..={}", position, len);
                QueueError::OutOfRange { position, len }
            })
    }

    fn next_unset_index(&self, after: usize) -> Option<usize> {
        self.records
            .iter()
            .enumerate()
            .skip(after + 1)
            .find(|(_, r)| r.status() == Status::Unset)
            .map(|(i, _)| i)
    }
}

fn to_signed(position: usize) -> i64 {
    i64::try_from(position).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_table::Table;

    fn schema() -> QueueSchema {
        QueueSchema::default()
            .with_required_fields(["question"])
            .with_identifier_field(Some("q_idx".to_string()))
    }

    fn table(statuses: Option<&[&str]>, n: usize) -> Table {
        let mut columns = vec!["q_idx", "question"];
        if statuses.is_some() {
            columns.push("status");
        }
        let rows = (0..n)
            .map(|i| {
                let mut row = vec![
                    Cell::Int(i64::try_from(i).unwrap() + 100),
                    Cell::text(format!("q{}", i + 1)),
                ];
                if let Some(s) = statuses {
                    row.push(Cell::text(s[i]));
                }
                row
            })
            .collect();
        Table::from_rows(columns, rows).unwrap()
    }

    fn question(queue: &ReviewQueue, record: &Record) -> String {
        queue.value(record, "question").unwrap().as_text()
    }

    #[test]
    fn load_adds_unset_status() {
        let queue = ReviewQueue::load_with_schema(&table(None, 3), schema()).unwrap();
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.counts().unset, 3);
        assert_eq!(queue.current_position().unwrap(), 1);
    }

    #[test]
    fn load_resumes_at_first_pending() {
        let t = table(Some(&["approved", "held", "", "approved"]), 4);
        let queue = ReviewQueue::load_with_schema(&t, schema()).unwrap();
        assert_eq!(queue.current_position().unwrap(), 3);
        assert_eq!(queue.counts().approved, 2);
    }

    #[test]
    fn load_all_disposed_starts_at_first() {
        let t = table(Some(&["approved", "held"]), 2);
        let queue = ReviewQueue::load_with_schema(&t, schema()).unwrap();
        assert_eq!(queue.current_position().unwrap(), 1);
    }

    #[test]
    fn load_rejects_missing_columns() {
        let t = Table::from_rows(["q_idx"], vec![vec![Cell::Int(1)]]).unwrap();
        let err = ReviewQueue::load_with_schema(&t, schema()).unwrap_err();
        assert_eq!(
            err,
            QueueError::Schema {
                missing: vec!["question".to_string()]
            }
        );
    }

    #[test]
    fn load_rejects_empty_table() {
        let err = ReviewQueue::load_with_schema(&table(None, 0), schema()).unwrap_err();
        assert_eq!(err, QueueError::EmptyQueue);
    }

    #[test]
    fn load_rejects_unknown_status() {
        let t = table(Some(&["", "later"]), 2);
        let err = ReviewQueue::load_with_schema(&t, schema()).unwrap_err();
        assert_eq!(
            err,
            QueueError::UnknownStatus {
                row: 2,
                value: "later".to_string()
            }
        );
    }

    #[test]
    fn goto_parses_and_bounds_checks() {
        let mut queue = ReviewQueue::load_with_schema(&table(None, 3), schema()).unwrap();
        queue.goto(" 2 ").unwrap();
        assert_eq!(question(&queue, queue.current().unwrap()), "q2");

        assert!(matches!(queue.goto("abc"), Err(QueueError::InvalidInput { .. })));
        assert!(matches!(queue.goto("0"), Err(QueueError::OutOfRange { .. })));
        assert!(matches!(queue.goto("4"), Err(QueueError::OutOfRange { .. })));
        assert!(matches!(queue.goto("-1"), Err(QueueError::OutOfRange { .. })));
        assert_eq!(queue.current_position().unwrap(), 2);
    }

    #[test]
    fn advance_clamps() {
        let mut queue = ReviewQueue::load_with_schema(&table(None, 2), schema()).unwrap();
        assert_eq!(queue.advance(Direction::Previous).unwrap(), 1);
        assert_eq!(queue.advance(Direction::Next).unwrap(), 2);
        assert_eq!(queue.advance(Direction::Next).unwrap(), 2);
    }

    #[test]
    fn mark_skips_disposed_records() {
        let t = table(Some(&["", "held", "", ""]), 4);
        let mut queue = ReviewQueue::load_with_schema(&t, schema()).unwrap();
        assert_eq!(queue.mark(1, Disposition::Approved).unwrap(), 3);
        assert_eq!(queue.mark(4, Disposition::Held).unwrap(), 4);
    }

    #[test]
    fn mark_without_pending_after_goes_to_end() {
        let t = table(Some(&["", "", "approved"]), 3);
        let mut queue = ReviewQueue::load_with_schema(&t, schema()).unwrap();
        assert_eq!(queue.mark(2, Disposition::Held).unwrap(), 3);
    }

    #[test]
    fn remove_keeps_cursor_on_same_record() {
        let mut queue = ReviewQueue::load_with_schema(&table(None, 4), schema()).unwrap();
        queue.goto_position(3).unwrap();
        let shown = queue.current().unwrap().id();

        queue.remove(1).unwrap();
        assert_eq!(queue.current().unwrap().id(), shown);
        assert_eq!(queue.current_position().unwrap(), 2);
    }

    #[test]
    fn goto_removed_record_is_a_warning() {
        let mut queue = ReviewQueue::load_with_schema(&table(None, 3), schema()).unwrap();
        let gone = queue.remove(2).unwrap().id();
        let kept = queue.get(2).unwrap().id();
        queue.goto_position(1).unwrap();

        let err = queue.goto_record(gone).unwrap_err();
        assert_eq!(err, QueueError::UnknownRecord(gone));
        assert!(err.is_recoverable());
        assert_eq!(queue.current_position().unwrap(), 1);
        assert_eq!(queue.goto_record(kept).unwrap(), 2);
    }

    #[test]
    fn remove_current_moves_to_successor() {
        let mut queue = ReviewQueue::load_with_schema(&table(None, 3), schema()).unwrap();
        queue.goto_position(3).unwrap();
        queue.remove(3).unwrap();
        assert_eq!(queue.current_position().unwrap(), 2);

        queue.remove(1).unwrap();
        queue.remove(1).unwrap();
        assert!(queue.is_empty());
        assert_eq!(queue.current().unwrap_err(), QueueError::EmptyQueue);
        assert_eq!(queue.remove(1).unwrap_err(), QueueError::EmptyQueue);
    }

    #[test]
    fn paginate_clamps_page() {
        let queue = ReviewQueue::load_with_schema(&table(None, 23), schema()).unwrap();
        let page = queue.paginate(9, 10).unwrap();
        assert_eq!(page.number, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.entries.len(), 3);
        assert_eq!(page.entries[0].position, 21);

        let first = queue.paginate(0, 10).unwrap();
        assert_eq!(first.number, 1);
        assert_eq!(first.entries.len(), 10);

        assert_eq!(queue.paginate(1, 0).unwrap_err(), QueueError::InvalidPageSize);
    }

    #[test]
    fn entry_label_uses_identifier() {
        let mut queue = ReviewQueue::load_with_schema(&table(None, 2), schema()).unwrap();
        queue.mark(2, Disposition::Held).unwrap();
        let page = queue.paginate(1, 10).unwrap();
        assert_eq!(queue.entry_label(&page.entries[0]), "1 / Q_IDX: 100 [unreviewed]");
        assert_eq!(queue.entry_label(&page.entries[1]), "2 / Q_IDX: 101 [held]");
    }

    #[test]
    fn export_appends_status_column() {
        let mut queue = ReviewQueue::load_with_schema(&table(None, 2), schema()).unwrap();
        queue.mark(1, Disposition::Approved).unwrap();

        let all = queue.export(None).unwrap();
        assert_eq!(all.columns().last().map(String::as_str), Some("status"));
        assert_eq!(all.cell(0, "status"), Some(&Cell::text("approved")));
        assert_eq!(all.cell(1, "status"), Some(&Cell::text("")));

        let approved = queue.export(Some(Status::Approved)).unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved.cell(0, "question"), Some(&Cell::text("q1")));
    }
}
