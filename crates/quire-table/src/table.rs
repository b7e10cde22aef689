//! Rectangular tables
//!
//! The in-memory form of one spreadsheet sheet: a header and rows of cells.
//! Every row is exactly as wide as the header; that invariant is checked on
//! every insertion so downstream code can index without bounds surprises.

use crate::cell::Cell;
use crate::error::{TableError, TableResult};
use std::collections::BTreeSet;

/// One sheet of named columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table with the given header
    ///
    /// # Errors
    /// Returns `DuplicateColumn` if a name repeats
    pub fn new<I, S>(columns: I) -> TableResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = BTreeSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Create a table from a header and rows
    ///
    /// # Errors
    /// Returns `DuplicateColumn` or `RaggedRow`
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Cell>>) -> TableResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append a row
    ///
    /// # Errors
    /// Returns `RaggedRow` if the row width differs from the header
    pub fn push_row(&mut self, row: Vec<Cell>) -> TableResult<()> {
        if row.len() != self.columns.len() {
            return Err(TableError::RaggedRow {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names in header order
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Consume the table into header and rows
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Cell>>) {
        (self.columns, self.rows)
    }

    /// Number of rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name
    #[inline]
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Check if a column exists
    #[inline]
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell at `row` in column `name`
    #[must_use]
    pub fn cell(&self, row: usize, name: &str) -> Option<&Cell> {
        let col = self.column_index(name)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// All cells of one column
    ///
    /// # Errors
    /// Returns `UnknownColumn`
    pub fn column(&self, name: &str) -> TableResult<Vec<Cell>> {
        let col = self
            .column_index(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))?;
        Ok(self.rows.iter().map(|r| r[col].clone()).collect())
    }

    /// Remove columns by name
    ///
    /// # Errors
    /// Returns `UnknownColumn` for the first name not in the header; the
    /// table is left untouched in that case.
    pub fn drop_columns(&mut self, names: &[String]) -> TableResult<()> {
        let mut doomed = BTreeSet::new();
        for name in names {
            let idx = self
                .column_index(name)
                .ok_or_else(|| TableError::UnknownColumn(name.clone()))?;
            doomed.insert(idx);
        }

        let keep = |i: &usize| !doomed.contains(i);
        self.columns = self
            .columns
            .drain(..)
            .enumerate()
            .filter(|(i, _)| keep(i))
            .map(|(_, c)| c)
            .collect();
        for row in &mut self.rows {
            *row = row
                .drain(..)
                .enumerate()
                .filter(|(i, _)| keep(i))
                .map(|(_, c)| c)
                .collect();
        }
        Ok(())
    }

    /// Remove rows by 0-based index
    ///
    /// # Errors
    /// Returns `RowOutOfRange` for the first bad index; the table is left
    /// untouched in that case.
    pub fn drop_rows(&mut self, indices: &[usize]) -> TableResult<()> {
        let len = self.rows.len();
        if let Some(&row) = indices.iter().find(|&&i| i >= len) {
            return Err(TableError::RowOutOfRange { row, len });
        }
        let doomed: BTreeSet<usize> = indices.iter().copied().collect();
        self.rows = self
            .rows
            .drain(..)
            .enumerate()
            .filter(|(i, _)| !doomed.contains(i))
            .map(|(_, r)| r)
            .collect();
        Ok(())
    }

    /// Stack tables vertically
    ///
    /// The header is the union of all headers in first-seen order; cells a
    /// source table lacks become `Empty`. Rows are renumbered from zero.
    #[must_use]
    pub fn concat<'a, I>(tables: I) -> Self
    where
        I: IntoIterator<Item = &'a Table>,
    {
        let tables: Vec<&Table> = tables.into_iter().collect();
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for name in &table.columns {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(tables.iter().map(|t| t.len()).sum());
        for table in &tables {
            let mapping: Vec<Option<usize>> =
                columns.iter().map(|c| table.column_index(c)).collect();
            for row in &table.rows {
                rows.push(
                    mapping
                        .iter()
                        .map(|m| m.map_or(Cell::Empty, |i| row[i].clone()))
                        .collect(),
                );
            }
        }

        Self { columns, rows }
    }

    /// Render as comma-separated text, header first
    ///
    /// Fields holding a comma, quote or line break are quoted with inner
    /// quotes doubled. Lines end with `\n`.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        push_csv_line(&mut out, self.columns.iter().map(String::as_str));
        for row in &self.rows {
            let texts: Vec<String> = row.iter().map(Cell::as_text).collect();
            push_csv_line(&mut out, texts.iter().map(String::as_str));
        }
        out
    }
}

fn push_csv_line<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Table {
        Table::from_rows(
            ["a", "b", "c"],
            vec![
                vec![Cell::Int(1), Cell::text("x"), Cell::Empty],
                vec![Cell::Int(2), Cell::text("y"), Cell::Bool(true)],
                vec![Cell::Int(3), Cell::text("z"), Cell::Float(0.5)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn rejects_ragged_rows() {
        let mut table = Table::new(["a", "b"]).unwrap();
        let err = table.push_row(vec![Cell::Int(1)]).unwrap_err();
        assert!(matches!(
            err,
            TableError::RaggedRow {
                expected: 2,
                found: 1,
                ..
            }
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn rejects_duplicate_header() {
        assert!(matches!(
            Table::new(["a", "a"]),
            Err(TableError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn drop_columns_keeps_order() {
        let mut table = sample();
        table.drop_columns(&["b".to_string()]).unwrap();
        assert_eq!(table.columns(), &["a".to_string(), "c".to_string()]);
        assert_eq!(table.rows()[1], vec![Cell::Int(2), Cell::Bool(true)]);
    }

    #[test]
    fn drop_unknown_column_is_atomic() {
        let mut table = sample();
        let err = table
            .drop_columns(&["a".to_string(), "nope".to_string()])
            .unwrap_err();
        assert!(matches!(err, TableError::UnknownColumn(name) if name == "nope"));
        assert_eq!(table.columns().len(), 3);
    }

    #[test]
    fn drop_rows_by_index() {
        let mut table = sample();
        table.drop_rows(&[0, 2]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, "b"), Some(&Cell::text("y")));

        assert!(matches!(
            table.drop_rows(&[5]),
            Err(TableError::RowOutOfRange { row: 5, len: 1 })
        ));
    }

    #[test]
    fn concat_unions_headers() {
        let left = Table::from_rows(["a", "b"], vec![vec![Cell::Int(1), Cell::text("x")]]).unwrap();
        let right = Table::from_rows(["b", "d"], vec![vec![Cell::text("y"), Cell::Int(9)]]).unwrap();

        let merged = Table::concat([&left, &right]);
        assert_eq!(
            merged.columns(),
            &["a".to_string(), "b".to_string(), "d".to_string()]
        );
        assert_eq!(
            merged.rows(),
            &[
                vec![Cell::Int(1), Cell::text("x"), Cell::Empty],
                vec![Cell::Empty, Cell::text("y"), Cell::Int(9)],
            ]
        );
    }

    #[test]
    fn column_values() {
        let table = sample();
        assert_eq!(
            table.column("a").unwrap(),
            vec![Cell::Int(1), Cell::Int(2), Cell::Int(3)]
        );
        assert!(table.column("zz").is_err());
    }

    #[test]
    fn csv_quotes_awkward_fields() {
        let table = Table::from_rows(
            ["name", "note"],
            vec![
                vec![Cell::text("pen"), Cell::text("blue, fine")],
                vec![Cell::text("ink"), Cell::text("say \"hi\"")],
                vec![Cell::Float(2.0), Cell::Empty],
            ],
        )
        .unwrap();
        assert_eq!(
            table.to_csv(),
            "name,note\npen,\"blue, fine\"\nink,\"say \"\"hi\"\"\"\n2.0,\n"
        );
    }
}
