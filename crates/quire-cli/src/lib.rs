//! quire CLI
//!
//! The `quire` binary: an interactive review loop over stdin plus batch
//! commands for merging sheets and checking or running chart programs.
//! Sheets are JSON sheet documents (see [`quire_table::JsonTableCodec`]).

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cli;
pub mod commands;
pub mod repl;

pub use cli::build_cli;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
