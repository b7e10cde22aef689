//! Spreadsheet collaborator contracts
//!
//! Spreadsheet parsing and writing are black boxes to the rest of the
//! workspace. Anything that can turn bytes into a [`Table`] (and back, with a
//! single named sheet) plugs in here. [`JsonTableCodec`] is the in-tree
//! implementation used by the CLI and tests.

use crate::cell::Cell;
use crate::error::TableResult;
use crate::table::Table;
use serde::{Deserialize, Serialize};

/// Turns an uploaded payload into a table
pub trait TableLoader: Send + Sync {
    /// Parse payload bytes
    ///
    /// # Errors
    /// Returns a `TableError` when the payload is malformed
    fn parse(&self, bytes: &[u8]) -> TableResult<Table>;
}

/// Turns a table into a downloadable payload with one named sheet
pub trait TableWriter: Send + Sync {
    /// Serialize a table under `sheet_name`
    ///
    /// # Errors
    /// Returns a `TableError` when encoding fails
    fn serialize(&self, table: &Table, sheet_name: &str) -> TableResult<Vec<u8>>;

    /// File extension for produced payloads (without dot)
    fn extension(&self) -> &'static str;
}

/// Wire shape of a JSON sheet
#[derive(Debug, Serialize, Deserialize)]
struct SheetDocument {
    #[serde(default)]
    sheet: Option<String>,
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Cell>>,
}

/// JSON sheet codec: `{"sheet": "...", "columns": [...], "rows": [[...]]}`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTableCodec;

impl JsonTableCodec {
    /// Create codec
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Sheet name stored in a payload, if any
    ///
    /// # Errors
    /// Returns `Codec` if the payload is not a sheet document
    pub fn sheet_name(bytes: &[u8]) -> TableResult<Option<String>> {
        let doc: SheetDocument = serde_json::from_slice(bytes)?;
        Ok(doc.sheet)
    }
}

impl TableLoader for JsonTableCodec {
    fn parse(&self, bytes: &[u8]) -> TableResult<Table> {
        let doc: SheetDocument = serde_json::from_slice(bytes)?;
        Table::from_rows(doc.columns, doc.rows)
    }
}

impl TableWriter for JsonTableCodec {
    fn serialize(&self, table: &Table, sheet_name: &str) -> TableResult<Vec<u8>> {
        let doc = SheetDocument {
            sheet: Some(sheet_name.to_string()),
            columns: table.columns().to_vec(),
            rows: table.rows().to_vec(),
        };
        Ok(serde_json::to_vec_pretty(&doc)?)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
