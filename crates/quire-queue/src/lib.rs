//! quire Queue
//!
//! Review queue state machine for uploaded question sheets.
//!
//! # Core Concepts
//!
//! - [`Record`]: one reviewable row with a stable [`RecordId`] and a [`Status`]
//! - [`ReviewQueue`]: ordered records plus the cursor on the one being reviewed
//! - [`Page`]: a fixed-size window over the full sequence for list display
//!
//! # Example
//!
//! ```rust
//! use quire_queue::{Disposition, QueueSchema, ReviewQueue, Status};
//! use quire_table::{Cell, Table};
//!
//! let table = Table::from_rows(["question"], vec![
//!     vec![Cell::text("a")],
//!     vec![Cell::text("b")],
//! ]).unwrap();
//! let schema = QueueSchema::new().with_required_fields(["question"]);
//! let mut queue = ReviewQueue::load_with_schema(&table, schema).unwrap();
//!
//! assert_eq!(queue.mark(1, Disposition::Approved).unwrap(), 2);
//! assert_eq!(queue.filter(Status::Approved).len(), 1);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod page;
mod queue;
mod record;
mod schema;
pub mod state_machine;

pub use error::{QueueError, QueueResult, Severity};
pub use page::{Page, PageEntry};
pub use queue::{Direction, ReviewQueue, StatusCounts};
pub use record::{Disposition, Record, RecordId, Status};
pub use schema::{
    QueueSchema, DEFAULT_IDENTIFIER_FIELD, DEFAULT_REQUIRED_FIELDS, DEFAULT_STATUS_COLUMN,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
