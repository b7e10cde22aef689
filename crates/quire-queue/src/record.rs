//! Records and dispositions
//!
//! A record is one reviewable row. Its identity is generated at load time and
//! never derived from its position, so references survive removal of other
//! rows.

use quire_table::Cell;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Stable record identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Ulid);

impl RecordId {
    /// Generate new record ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Review outcome of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Not reviewed yet ("pending")
    #[default]
    Unset,
    /// Reviewed and accepted
    Approved,
    /// Parked for a later look
    Held,
}

impl Status {
    /// Text written to the status column on export
    #[inline]
    #[must_use]
    pub fn as_export_str(&self) -> &'static str {
        match self {
            Status::Unset => "",
            Status::Approved => "approved",
            Status::Held => "held",
        }
    }

    /// Label shown in record lists
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Status::Unset => "unreviewed",
            Status::Approved => "approved",
            Status::Held => "held",
        }
    }

    /// Parse a status cell from an uploaded sheet
    ///
    /// Accepts the canonical export values, "pending"/"unset", and the
    /// labels written by earlier Korean-language sheets. Returns `None` for
    /// anything else.
    #[must_use]
    pub fn parse_cell(cell: &Cell) -> Option<Self> {
        if matches!(cell, Cell::Empty) {
            return Some(Status::Unset);
        }
        let text = cell.as_text();
        match text.trim().to_lowercase().as_str() {
            "" | "pending" | "unset" | "미검수" => Some(Status::Unset),
            "approved" | "검수 완료" => Some(Status::Approved),
            "held" | "hold" | "보류" => Some(Status::Held),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Reviewer action on a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Accept
    Approved,
    /// Park
    Held,
}

impl From<Disposition> for Status {
    fn from(value: Disposition) -> Self {
        match value {
            Disposition::Approved => Status::Approved,
            Disposition::Held => Status::Held,
        }
    }
}

/// One reviewable row
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: RecordId,
    values: Vec<Cell>,
    status: Status,
}

impl Record {
    pub(crate) fn new(values: Vec<Cell>, status: Status) -> Self {
        Self {
            id: RecordId::new(),
            values,
            status,
        }
    }

    /// Stable identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Current disposition
    #[inline]
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Content cells, aligned with the queue's column list
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    #[inline]
    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_status_labels() {
        assert_eq!(Status::parse_cell(&Cell::Empty), Some(Status::Unset));
        assert_eq!(Status::parse_cell(&Cell::text("")), Some(Status::Unset));
        assert_eq!(Status::parse_cell(&Cell::text("Pending")), Some(Status::Unset));
        assert_eq!(Status::parse_cell(&Cell::text("approved")), Some(Status::Approved));
        assert_eq!(Status::parse_cell(&Cell::text("검수 완료")), Some(Status::Approved));
        assert_eq!(Status::parse_cell(&Cell::text(" HELD ")), Some(Status::Held));
        assert_eq!(Status::parse_cell(&Cell::text("보류")), Some(Status::Held));
        assert_eq!(Status::parse_cell(&Cell::text("maybe")), None);
        assert_eq!(Status::parse_cell(&Cell::Int(1)), None);
    }

    #[test]
    fn export_values_parse_back() {
        for status in [Status::Unset, Status::Approved, Status::Held] {
            let cell = Cell::text(status.as_export_str());
            assert_eq!(Status::parse_cell(&cell), Some(status));
        }
    }

    #[test]
    fn record_ids_are_unique() {
        let a = Record::new(vec![], Status::Unset);
        let b = Record::new(vec![], Status::Unset);
        assert_ne!(a.id(), b.id());
    }
}
