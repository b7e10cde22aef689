//! Cell values
//!
//! A cell is one scalar of a spreadsheet row. Spreadsheet codecs hand us
//! empty cells, booleans, integers, floats and text; nothing else.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single spreadsheet value
///
/// Serialised untagged: `null`, `true`, `42`, `4.5`, `"text"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Cell {
    /// Blank cell
    #[default]
    Empty,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// Text
    Text(String),
}

impl Cell {
    /// Create a text cell
    #[inline]
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Check if cell is blank (`Empty` or whitespace-only text)
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the cell, if it has one
    ///
    /// Booleans count as 0/1, numeric-looking text is parsed.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Empty => None,
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            #[allow(clippy::cast_precision_loss)]
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Text view of the cell (blank for `Empty`)
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            other => other.to_string(),
        }
    }

    /// Rank of the variant in the sort order
    fn rank(&self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Bool(_) => 1,
            Cell::Int(_) | Cell::Float(_) => 2,
            Cell::Text(_) => 3,
        }
    }

    /// Total order used for sorting and grouping
    ///
    /// Empty < Bool < numbers (compared numerically) < Text.
    #[must_use]
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Cell::Bool(a), Cell::Bool(b)) => a.cmp(b),
            (Cell::Int(a), Cell::Int(b)) => a.cmp(b),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            (a, b) if a.rank() == 2 && b.rank() == 2 => {
                let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
                x.total_cmp(&y)
            }
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    /// Grouping equality: numbers compare by value across Int/Float
    #[must_use]
    pub fn same_key(&self, other: &Self) -> bool {
        self.sort_cmp(other) == Ordering::Equal
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => write!(f, ""),
            Cell::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(x) => {
                if x.fract() == 0.0 && x.is_finite() && x.abs() < 1e16 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Cell::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_json_shape() {
        let cells = vec![
            Cell::Empty,
            Cell::Bool(true),
            Cell::Int(3),
            Cell::Float(2.5),
            Cell::text("x"),
        ];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"[null,true,3,2.5,"x"]"#);

        let back: Vec<Cell> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cells);
    }

    #[test]
    fn sort_order_across_variants() {
        let mut cells = vec![
            Cell::text("b"),
            Cell::Float(1.5),
            Cell::Empty,
            Cell::Int(1),
            Cell::Bool(false),
            Cell::text("a"),
        ];
        cells.sort_by(Cell::sort_cmp);
        assert_eq!(
            cells,
            vec![
                Cell::Empty,
                Cell::Bool(false),
                Cell::Int(1),
                Cell::Float(1.5),
                Cell::text("a"),
                Cell::text("b"),
            ]
        );
    }

    #[test]
    fn numbers_group_by_value() {
        assert!(Cell::Int(2).same_key(&Cell::Float(2.0)));
        assert!(!Cell::Int(2).same_key(&Cell::text("2")));
    }

    #[test]
    fn display_matches_spreadsheet_text() {
        assert_eq!(Cell::Float(3.0).to_string(), "3.0");
        assert_eq!(Cell::Bool(true).to_string(), "True");
        assert_eq!(Cell::Empty.as_text(), "");
        assert!(Cell::text("  ").is_blank());
    }
}
