//! Data frame model
//!
//! Column-major frames and labelled series over [`Cell`] values, with the
//! group-by and aggregation subset generated analysis code relies on.

use crate::error::{type_error, FaultResult, RuntimeFault};
use quire_table::{Cell, Table};
use std::cmp::Ordering;

/// Aggregations shared by series and group-by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Agg {
    Sum,
    Mean,
    Min,
    Max,
    Count,
    Size,
    Nunique,
}

impl Agg {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sum" => Self::Sum,
            "mean" => Self::Mean,
            "min" => Self::Min,
            "max" => Self::Max,
            "count" => Self::Count,
            "size" => Self::Size,
            "nunique" => Self::Nunique,
            _ => return None,
        })
    }

    /// Whether the aggregation only applies to numeric columns of a frame
    fn numeric_only(self) -> bool {
        matches!(self, Self::Sum | Self::Mean | Self::Min | Self::Max)
    }
}

pub(crate) fn aggregate<'a>(agg: Agg, cells: impl IntoIterator<Item = &'a Cell>) -> FaultResult<Cell> {
    let cells: Vec<&Cell> = cells.into_iter().collect();
    let present: Vec<&Cell> = cells
        .iter()
        .copied()
        .filter(|c| !matches!(c, Cell::Empty))
        .collect();

    match agg {
        Agg::Size => Ok(Cell::Int(count_to_i64(cells.len()))),
        Agg::Count => Ok(Cell::Int(count_to_i64(present.len()))),
        Agg::Nunique => {
            let mut seen: Vec<&Cell> = Vec::new();
            for c in &present {
                if !seen.iter().any(|s| s.same_key(c)) {
                    seen.push(c);
                }
            }
            Ok(Cell::Int(count_to_i64(seen.len())))
        }
        Agg::Sum => {
            let mut int_sum: Option<i64> = Some(0);
            let mut float_sum = 0.0;
            for c in &present {
                match c {
                    Cell::Int(i) => {
                        int_sum = int_sum.and_then(|s| s.checked_add(*i));
                        #[allow(clippy::cast_precision_loss)]
                        {
                            float_sum += *i as f64;
                        }
                    }
                    Cell::Bool(b) => {
                        int_sum = int_sum.and_then(|s| s.checked_add(i64::from(*b)));
                        float_sum += if *b { 1.0 } else { 0.0 };
                    }
                    Cell::Float(f) => {
                        int_sum = None;
                        float_sum += f;
                    }
                    _ => return Err(type_error("cannot sum non-numeric values")),
                }
            }
            let all_int = present.iter().all(|c| matches!(c, Cell::Int(_) | Cell::Bool(_)));
            match (all_int, int_sum) {
                (true, Some(s)) => Ok(Cell::Int(s)),
                (true, None) => Err(RuntimeFault::Overflow),
                (false, _) => Ok(Cell::Float(float_sum)),
            }
        }
        Agg::Mean => {
            if present.is_empty() {
                return Ok(Cell::Empty);
            }
            let mut total = 0.0;
            for c in &present {
                total += numeric(c)?;
            }
            #[allow(clippy::cast_precision_loss)]
            Ok(Cell::Float(total / present.len() as f64))
        }
        Agg::Min | Agg::Max => {
            let pick = present.into_iter().reduce(|best, c| {
                let ord = c.sort_cmp(best);
                let better = if agg == Agg::Min {
                    ord == Ordering::Less
                } else {
                    ord == Ordering::Greater
                };
                if better {
                    c
                } else {
                    best
                }
            });
            Ok(pick.cloned().unwrap_or(Cell::Empty))
        }
    }
}

fn numeric(cell: &Cell) -> FaultResult<f64> {
    match cell {
        Cell::Int(_) | Cell::Float(_) | Cell::Bool(_) => cell
            .as_f64()
            .ok_or_else(|| type_error("expected a number")),
        other => Err(type_error(format!("'{other}' is not numeric"))),
    }
}

fn count_to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn default_index(len: usize) -> Vec<Cell> {
    (0..len).map(|i| Cell::Int(count_to_i64(i))).collect()
}

fn is_numeric_column(cells: &[Cell]) -> bool {
    cells
        .iter()
        .all(|c| matches!(c, Cell::Empty | Cell::Int(_) | Cell::Float(_) | Cell::Bool(_)))
}

fn check_mask(mask: &[bool], len: usize) -> FaultResult<()> {
    if mask.len() == len {
        Ok(())
    } else {
        Err(RuntimeFault::Index(format!(
            "boolean mask of length {} does not match length {}",
            mask.len(),
            len
        )))
    }
}

fn mask_positions(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter(|(_, keep)| **keep)
        .map(|(i, _)| i)
        .collect()
}

/// Stable sort with empty cells last in either direction
fn sorted_positions(keys: &[&[Cell]], len: usize, ascending: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.sort_by(|&a, &b| {
        for column in keys {
            let (x, y) = (&column[a], &column[b]);
            let ord = match (x, y) {
                (Cell::Empty, Cell::Empty) => Ordering::Equal,
                (Cell::Empty, _) => return Ordering::Greater,
                (_, Cell::Empty) => return Ordering::Less,
                _ if ascending => x.sort_cmp(y),
                _ => y.sort_cmp(x),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    order
}

/// A labelled column of values
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Series {
    pub(crate) name: Option<String>,
    pub(crate) index_name: Option<String>,
    pub(crate) index: Vec<Cell>,
    pub(crate) values: Vec<Cell>,
}

impl Series {
    pub(crate) fn new(name: Option<String>, values: Vec<Cell>) -> Self {
        Self {
            name,
            index_name: None,
            index: default_index(values.len()),
            values,
        }
    }

    pub(crate) fn with_index(name: Option<String>, index: Vec<Cell>, values: Vec<Cell>) -> Self {
        Self {
            name,
            index_name: None,
            index,
            values,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn renamed(&self, name: Option<String>) -> Self {
        Self {
            name,
            ..self.clone()
        }
    }

    pub(crate) fn with_values(&self, values: Vec<Cell>) -> Self {
        Self {
            name: self.name.clone(),
            index_name: self.index_name.clone(),
            index: self.index.clone(),
            values,
        }
    }

    pub(crate) fn take(&self, rows: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            index_name: self.index_name.clone(),
            index: rows.iter().map(|&r| self.index[r].clone()).collect(),
            values: rows.iter().map(|&r| self.values[r].clone()).collect(),
        }
    }

    pub(crate) fn filter(&self, mask: &[bool]) -> FaultResult<Self> {
        check_mask(mask, self.len())?;
        Ok(self.take(&mask_positions(mask)))
    }

    pub(crate) fn head(&self, n: usize) -> Self {
        let rows: Vec<usize> = (0..n.min(self.len())).collect();
        self.take(&rows)
    }

    pub(crate) fn tail(&self, n: usize) -> Self {
        let start = self.len().saturating_sub(n);
        let rows: Vec<usize> = (start..self.len()).collect();
        self.take(&rows)
    }

    pub(crate) fn sort_values(&self, ascending: bool) -> Self {
        let order = sorted_positions(&[self.values.as_slice()], self.len(), ascending);
        self.take(&order)
    }

    pub(crate) fn sort_index(&self, ascending: bool) -> Self {
        let order = sorted_positions(&[self.index.as_slice()], self.len(), ascending);
        self.take(&order)
    }

    /// Distinct non-empty values in first-seen order
    pub(crate) fn unique(&self) -> Vec<Cell> {
        let mut seen: Vec<Cell> = Vec::new();
        for v in &self.values {
            if !seen.iter().any(|s| s.same_key(v)) {
                seen.push(v.clone());
            }
        }
        seen
    }

    /// Occurrence counts, most frequent first
    pub(crate) fn value_counts(&self) -> Self {
        let mut counts: Vec<(Cell, i64)> = Vec::new();
        for v in self.values.iter().filter(|v| !matches!(v, Cell::Empty)) {
            match counts.iter_mut().find(|(k, _)| k.same_key(v)) {
                Some((_, n)) => *n += 1,
                None => counts.push((v.clone(), 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        let (index, values): (Vec<Cell>, Vec<Cell>) =
            counts.into_iter().map(|(k, n)| (k, Cell::Int(n))).unzip();
        Self {
            name: Some("count".to_string()),
            index_name: self.name.clone(),
            index,
            values,
        }
    }

    pub(crate) fn aggregate(&self, agg: Agg) -> FaultResult<Cell> {
        aggregate(agg, &self.values)
    }

    /// Value at an index label
    pub(crate) fn at_label(&self, label: &Cell) -> Option<&Cell> {
        self.index
            .iter()
            .position(|i| i.same_key(label))
            .map(|p| &self.values[p])
    }

    /// Convert to numbers; unparseable values become empty when `coerce`
    pub(crate) fn to_numeric(&self, coerce: bool) -> FaultResult<Self> {
        let values = self
            .values
            .iter()
            .map(|c| to_numeric_cell(c, coerce))
            .collect::<FaultResult<Vec<_>>>()?;
        Ok(self.with_values(values))
    }

    pub(crate) fn bools(&self) -> FaultResult<Vec<bool>> {
        self.values
            .iter()
            .map(|c| match c {
                Cell::Bool(b) => Ok(*b),
                other => Err(type_error(format!(
                    "expected a boolean mask, found '{other}'"
                ))),
            })
            .collect()
    }

    pub(crate) fn is_numeric(&self) -> bool {
        is_numeric_column(&self.values)
    }

    pub(crate) fn render(&self) -> String {
        let mut lines: Vec<String> = self
            .index
            .iter()
            .zip(self.values.iter())
            .map(|(i, v)| format!("{i}    {v}"))
            .collect();
        if let Some(name) = &self.name {
            lines.push(format!("Name: {name}"));
        }
        lines.join("\n")
    }
}

pub(crate) fn to_numeric_cell(cell: &Cell, coerce: bool) -> FaultResult<Cell> {
    Ok(match cell {
        Cell::Text(s) => {
            let t = s.trim().replace(',', "");
            if let Ok(i) = t.parse::<i64>() {
                Cell::Int(i)
            } else if let Ok(f) = t.parse::<f64>() {
                Cell::Float(f)
            } else if coerce {
                Cell::Empty
            } else {
                return Err(RuntimeFault::Value(format!(
                    "unable to parse string \"{s}\""
                )));
            }
        }
        Cell::Bool(b) => Cell::Int(i64::from(*b)),
        other => other.clone(),
    })
}

/// A table of named columns with a row index
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Frame {
    pub(crate) columns: Vec<String>,
    /// One vector per column
    pub(crate) data: Vec<Vec<Cell>>,
    pub(crate) index: Vec<Cell>,
    pub(crate) index_name: Option<String>,
}

impl Frame {
    pub(crate) fn from_table(table: &Table) -> Self {
        let width = table.columns().len();
        let mut data = vec![Vec::with_capacity(table.len()); width];
        for row in table.rows() {
            for (col, cell) in row.iter().enumerate() {
                data[col].push(cell.clone());
            }
        }
        Self {
            columns: table.columns().to_vec(),
            data,
            index: default_index(table.len()),
            index_name: None,
        }
    }

    pub(crate) fn to_table(&self) -> FaultResult<Table> {
        let rows = (0..self.len())
            .map(|r| self.data.iter().map(|col| col[r].clone()).collect())
            .collect();
        Table::from_rows(self.columns.iter().cloned(), rows)
            .map_err(|e| RuntimeFault::Value(e.to_string()))
    }

    pub(crate) fn from_columns(columns: Vec<(String, Vec<Cell>)>) -> FaultResult<Self> {
        let len = columns.first().map_or(0, |(_, v)| v.len());
        if columns.iter().any(|(_, v)| v.len() != len) {
            return Err(RuntimeFault::Value(
                "all arrays must be of the same length".to_string(),
            ));
        }
        let (names, data) = columns.into_iter().unzip();
        Ok(Self {
            columns: names,
            data,
            index: default_index(len),
            index_name: None,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub(crate) fn column(&self, name: &str) -> FaultResult<Series> {
        let pos = self
            .position(name)
            .ok_or_else(|| RuntimeFault::Key(format!("'{name}'")))?;
        Ok(Series {
            name: Some(name.to_string()),
            index_name: self.index_name.clone(),
            index: self.index.clone(),
            values: self.data[pos].clone(),
        })
    }

    pub(crate) fn select(&self, names: &[String]) -> FaultResult<Self> {
        let mut data = Vec::with_capacity(names.len());
        for name in names {
            let pos = self
                .position(name)
                .ok_or_else(|| RuntimeFault::Key(format!("'{name}'")))?;
            data.push(self.data[pos].clone());
        }
        Ok(Self {
            columns: names.to_vec(),
            data,
            index: self.index.clone(),
            index_name: self.index_name.clone(),
        })
    }

    pub(crate) fn take(&self, rows: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            data: self
                .data
                .iter()
                .map(|col| rows.iter().map(|&r| col[r].clone()).collect())
                .collect(),
            index: rows.iter().map(|&r| self.index[r].clone()).collect(),
            index_name: self.index_name.clone(),
        }
    }

    pub(crate) fn filter(&self, mask: &[bool]) -> FaultResult<Self> {
        check_mask(mask, self.len())?;
        Ok(self.take(&mask_positions(mask)))
    }

    /// Assign or replace a column
    pub(crate) fn set_column(&mut self, name: &str, values: Vec<Cell>) -> FaultResult<()> {
        if self.columns.is_empty() && self.index.is_empty() {
            self.index = default_index(values.len());
        }
        if values.len() != self.len() {
            return Err(RuntimeFault::Value(format!(
                "length of values ({}) does not match length of index ({})",
                values.len(),
                self.len()
            )));
        }
        match self.position(name) {
            Some(pos) => self.data[pos] = values,
            None => {
                self.columns.push(name.to_string());
                self.data.push(values);
            }
        }
        Ok(())
    }

    pub(crate) fn head(&self, n: usize) -> Self {
        let rows: Vec<usize> = (0..n.min(self.len())).collect();
        self.take(&rows)
    }

    pub(crate) fn tail(&self, n: usize) -> Self {
        let start = self.len().saturating_sub(n);
        let rows: Vec<usize> = (start..self.len()).collect();
        self.take(&rows)
    }

    pub(crate) fn sort_values(&self, by: &[String], ascending: bool) -> FaultResult<Self> {
        let mut keys: Vec<&[Cell]> = Vec::with_capacity(by.len());
        for name in by {
            let pos = self
                .position(name)
                .ok_or_else(|| RuntimeFault::Key(format!("'{name}'")))?;
            keys.push(self.data[pos].as_slice());
        }
        let order = sorted_positions(&keys, self.len(), ascending);
        Ok(self.take(&order))
    }

    /// Drop rows with an empty cell in any of `subset` (all columns if `None`)
    pub(crate) fn dropna(&self, subset: Option<&[String]>) -> FaultResult<Self> {
        let positions: Vec<usize> = match subset {
            Some(names) => names
                .iter()
                .map(|n| {
                    self.position(n)
                        .ok_or_else(|| RuntimeFault::Key(format!("'{n}'")))
                })
                .collect::<FaultResult<_>>()?,
            None => (0..self.columns.len()).collect(),
        };
        let mask: Vec<bool> = (0..self.len())
            .map(|r| {
                positions
                    .iter()
                    .all(|&c| !matches!(self.data[c][r], Cell::Empty))
            })
            .collect();
        self.filter(&mask)
    }

    pub(crate) fn fillna(&self, value: &Cell) -> Self {
        let mut filled = self.clone();
        for col in &mut filled.data {
            for cell in col.iter_mut().filter(|c| matches!(c, Cell::Empty)) {
                *cell = value.clone();
            }
        }
        filled
    }

    /// Move the index into a leading column
    pub(crate) fn reset_index(&self) -> Self {
        let name = self
            .index_name
            .clone()
            .unwrap_or_else(|| "index".to_string());
        let mut columns = vec![name];
        columns.extend(self.columns.iter().cloned());
        let mut data = vec![self.index.clone()];
        data.extend(self.data.iter().cloned());
        Self {
            columns,
            data,
            index: default_index(self.len()),
            index_name: None,
        }
    }

    pub(crate) fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(self.data.iter())
            .filter(|(_, col)| is_numeric_column(col))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub(crate) fn groupby(&self, key: &str) -> FaultResult<GroupBy> {
        let pos = self
            .position(key)
            .ok_or_else(|| RuntimeFault::Key(format!("'{key}'")))?;
        let mut groups: Vec<(Cell, Vec<usize>)> = Vec::new();
        for (row, cell) in self.data[pos].iter().enumerate() {
            if matches!(cell, Cell::Empty) {
                continue;
            }
            match groups.iter_mut().find(|(k, _)| k.same_key(cell)) {
                Some((_, rows)) => rows.push(row),
                None => groups.push((cell.clone(), vec![row])),
            }
        }
        groups.sort_by(|a, b| a.0.sort_cmp(&b.0));
        Ok(GroupBy {
            frame: self.clone(),
            key: key.to_string(),
            groups,
            selection: None,
        })
    }

    pub(crate) fn render(&self) -> String {
        let mut lines = vec![format!("    {}", self.columns.join("  "))];
        for r in 0..self.len() {
            let cells: Vec<String> = self.data.iter().map(|col| col[r].to_string()).collect();
            lines.push(format!("{}   {}", self.index[r], cells.join("  ")));
        }
        lines.join("\n")
    }
}

/// Column selection on a group-by
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Selection {
    Column(String),
    Columns(Vec<String>),
}

/// Aggregation result
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Grouped {
    Series(Series),
    Frame(Frame),
}

/// Rows of a frame partitioned by one key column, groups in key order
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GroupBy {
    frame: Frame,
    key: String,
    groups: Vec<(Cell, Vec<usize>)>,
    selection: Option<Selection>,
}

impl GroupBy {
    pub(crate) fn select(&self, selection: Selection) -> FaultResult<Self> {
        let names: &[String] = match &selection {
            Selection::Column(name) => std::slice::from_ref(name),
            Selection::Columns(names) => names,
        };
        if let Some(missing) = names.iter().find(|n| self.frame.position(n).is_none()) {
            return Err(RuntimeFault::Key(format!("'{missing}'")));
        }
        Ok(Self {
            selection: Some(selection),
            ..self.clone()
        })
    }

    pub(crate) fn aggregate(&self, agg: Agg) -> FaultResult<Grouped> {
        let index: Vec<Cell> = self.groups.iter().map(|(k, _)| k.clone()).collect();

        if agg == Agg::Size {
            let values = self
                .groups
                .iter()
                .map(|(_, rows)| Cell::Int(count_to_i64(rows.len())))
                .collect();
            let mut series = Series::with_index(None, index, values);
            series.index_name = Some(self.key.clone());
            return Ok(Grouped::Series(series));
        }

        let columns: Vec<String> = match &self.selection {
            Some(Selection::Column(name)) => vec![name.clone()],
            Some(Selection::Columns(names)) => names.clone(),
            None => {
                let candidates = if agg.numeric_only() {
                    self.frame.numeric_columns()
                } else {
                    self.frame.columns.clone()
                };
                candidates.into_iter().filter(|c| *c != self.key).collect()
            }
        };

        let mut data = Vec::with_capacity(columns.len());
        for name in &columns {
            let pos = self
                .frame
                .position(name)
                .ok_or_else(|| RuntimeFault::Key(format!("'{name}'")))?;
            let col = &self.frame.data[pos];
            let values = self
                .groups
                .iter()
                .map(|(_, rows)| aggregate(agg, rows.iter().map(|&r| &col[r])))
                .collect::<FaultResult<Vec<_>>>()?;
            data.push(values);
        }

        if let Some(Selection::Column(name)) = &self.selection {
            let values = data.pop().unwrap_or_default();
            let mut series = Series::with_index(Some(name.clone()), index, values);
            series.index_name = Some(self.key.clone());
            return Ok(Grouped::Series(series));
        }

        Ok(Grouped::Frame(Frame {
            columns,
            data,
            index,
            index_name: Some(self.key.clone()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sales() -> Frame {
        Frame::from_columns(vec![
            (
                "region".to_string(),
                vec![
                    Cell::text("north"),
                    Cell::text("south"),
                    Cell::text("north"),
                    Cell::Empty,
                ],
            ),
            (
                "units".to_string(),
                vec![Cell::Int(10), Cell::Int(4), Cell::Int(7), Cell::Int(1)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn groupby_sums_in_key_order() {
        let grouped = sales()
            .groupby("region")
            .unwrap()
            .select(Selection::Column("units".to_string()))
            .unwrap()
            .aggregate(Agg::Sum)
            .unwrap();
        let Grouped::Series(series) = grouped else {
            panic!("expected a series");
        };
        assert_eq!(series.index, vec![Cell::text("north"), Cell::text("south")]);
        assert_eq!(series.values, vec![Cell::Int(17), Cell::Int(4)]);
        assert_eq!(series.index_name.as_deref(), Some("region"));
    }

    #[test]
    fn groupby_frame_skips_text_for_numeric_aggs() {
        let Grouped::Frame(frame) = sales().groupby("region").unwrap().aggregate(Agg::Mean).unwrap()
        else {
            panic!("expected a frame");
        };
        assert_eq!(frame.columns, vec!["units".to_string()]);
        assert_eq!(frame.data[0], vec![Cell::Float(8.5), Cell::Float(4.0)]);
    }

    #[test]
    fn sort_puts_empty_last() {
        let sorted = sales()
            .sort_values(&["region".to_string()], false)
            .unwrap();
        assert_eq!(
            sorted.data[0],
            vec![
                Cell::text("south"),
                Cell::text("north"),
                Cell::text("north"),
                Cell::Empty
            ]
        );
        assert_eq!(sorted.index[0], Cell::Int(1));
    }

    #[test]
    fn value_counts_most_frequent_first() {
        let counts = sales().column("region").unwrap().value_counts();
        assert_eq!(counts.index, vec![Cell::text("north"), Cell::text("south")]);
        assert_eq!(counts.values, vec![Cell::Int(2), Cell::Int(1)]);
    }

    #[test]
    fn aggregates() {
        let cells = [Cell::Int(2), Cell::Float(0.5), Cell::Empty];
        assert_eq!(aggregate(Agg::Sum, &cells).unwrap(), Cell::Float(2.5));
        assert_eq!(aggregate(Agg::Count, &cells).unwrap(), Cell::Int(2));
        assert_eq!(aggregate(Agg::Size, &cells).unwrap(), Cell::Int(3));
        assert_eq!(aggregate(Agg::Max, &cells).unwrap(), Cell::Int(2));
        assert!(aggregate(Agg::Sum, &[Cell::text("a")]).is_err());
        assert_eq!(
            aggregate(Agg::Sum, &[Cell::Int(i64::MAX), Cell::Int(1)]),
            Err(RuntimeFault::Overflow)
        );
    }

    #[test]
    fn set_column_checks_length() {
        let mut frame = sales();
        assert!(frame.set_column("price", vec![Cell::Int(1)]).is_err());
        frame
            .set_column("price", vec![Cell::Float(1.0); 4])
            .unwrap();
        assert_eq!(frame.columns.len(), 3);
    }

    #[test]
    fn dropna_and_reset_index() {
        let frame = sales().dropna(None).unwrap();
        assert_eq!(frame.len(), 3);
        let reset = frame.reset_index();
        assert_eq!(reset.columns[0], "index");
    }

    #[test]
    fn table_round_trip() {
        let table = Table::from_rows(
            ["a", "b"],
            vec![vec![Cell::Int(1), Cell::text("x")]],
        )
        .unwrap();
        assert_eq!(Frame::from_table(&table).to_table().unwrap(), table);
    }
}
