//! quire Table
//!
//! Tabular payloads exchanged with the spreadsheet collaborators.
//!
//! # Core Concepts
//!
//! - [`Cell`]: one scalar value (empty, bool, int, float, text)
//! - [`Table`]: a rectangular sheet of named columns
//! - [`TableLoader`] / [`TableWriter`]: the contracts an upload parser and a
//!   download writer fulfil
//!
//! # Example
//!
//! ```rust
//! use quire_table::{Cell, JsonTableCodec, Table, TableLoader, TableWriter};
//!
//! let table = Table::from_rows(["q_idx", "question"], vec![
//!     vec![Cell::Int(1), Cell::text("What is 2 + 2?")],
//! ]).unwrap();
//!
//! let codec = JsonTableCodec::new();
//! let bytes = codec.serialize(&table, "questions").unwrap();
//! assert_eq!(codec.parse(&bytes).unwrap(), table);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod cell;
mod codec;
mod error;
mod table;

pub use cell::Cell;
pub use codec::{JsonTableCodec, TableLoader, TableWriter};
pub use error::{TableError, TableResult};
pub use table::Table;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
