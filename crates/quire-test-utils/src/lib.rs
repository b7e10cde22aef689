//! Testing utilities for quire workspace
//!
//! Question-sheet fixtures shared by the queue, session and CLI tests.

#![allow(missing_docs)]

use quire_table::{Cell, Table};

/// Columns every question sheet carries, in upload order
pub const QUESTION_COLUMNS: &[&str] = &[
    "subject",
    "chapter",
    "q_idx",
    "question",
    "content",
    "ex1",
    "ex2",
    "ex3",
    "ex4",
    "solve_gpt",
    "관련 주제",
    "관련 주제 스크립트",
];

/// One fully populated question row
pub fn question_row(n: usize) -> Vec<Cell> {
    let idx = i64::try_from(n).unwrap_or(i64::MAX);
    vec![
        Cell::text("math"),
        Cell::text(format!("ch{}", n % 3 + 1)),
        Cell::Int(1000 + idx),
        Cell::text(format!("Question {n}")),
        Cell::text(format!("Body of question {n}")),
        Cell::text("A"),
        Cell::text("B"),
        Cell::text("C"),
        Cell::text("D"),
        Cell::text(format!("Solution {n}")),
        Cell::text(format!("topic-{}", n % 4)),
        Cell::text("script"),
    ]
}

/// Question sheet with `n` rows and no status column
pub fn question_table(n: usize) -> Table {
    let rows = (1..=n).map(question_row).collect();
    Table::from_rows(QUESTION_COLUMNS.iter().copied(), rows).unwrap()
}

/// Question sheet carrying a status column with the given raw values
pub fn question_table_with_status(statuses: &[&str]) -> Table {
    let mut columns: Vec<&str> = QUESTION_COLUMNS.to_vec();
    columns.push("status");
    let rows = statuses
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let mut row = question_row(i + 1);
            row.push(Cell::text(*s));
            row
        })
        .collect();
    Table::from_rows(columns, rows).unwrap()
}

/// Small numeric table for analysis tests
pub fn sales_table() -> Table {
    Table::from_rows(
        ["region", "product", "units", "price"],
        vec![
            vec![Cell::text("north"), Cell::text("pen"), Cell::Int(10), Cell::Float(1.5)],
            vec![Cell::text("south"), Cell::text("pen"), Cell::Int(4), Cell::Float(1.5)],
            vec![Cell::text("north"), Cell::text("ink"), Cell::Int(7), Cell::Float(3.0)],
            vec![Cell::text("east"), Cell::text("pad"), Cell::Int(2), Cell::Float(2.25)],
        ],
    )
    .unwrap()
}
