//! Downloadable payloads

use crate::error::SessionResult;
use quire_table::{Table, TableWriter};

/// Encoded table ready to hand to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub(crate) fn encode(
    writer: &dyn TableWriter,
    table: &Table,
    file_stem: &str,
    sheet: &str,
) -> SessionResult<Download> {
    let bytes = writer.serialize(table, sheet)?;
    let file_name = format!("{file_stem}.{}", writer.extension());
    tracing::info!("Encoded {} rows as {}", table.len(), file_name);
    Ok(Download { file_name, bytes })
}
