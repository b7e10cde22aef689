//! quire Sandbox
//!
//! Runs model-generated chart code without trusting it.
//!
//! # Core Concepts
//!
//! - [`validate`] / [`inspect`]: structural denylist check over the
//!   tree-sitter Python syntax tree; unparseable input fails closed
//! - [`Sandbox`]: validate-then-execute with [`ExecutionLimits`]; execution
//!   walks the syntax tree in a restricted interpreter that only knows the
//!   bound names and an allow-list of builtins
//! - [`Bindings`]: the table and namespaces a program may touch
//! - [`Chart`]: the figure snapshot a successful run hands to the renderer
//!
//! # Example
//!
//! ```rust
//! use quire_sandbox::{Bindings, Sandbox};
//! use quire_table::{Cell, Table};
//!
//! let table = Table::from_rows(["region", "units"], vec![
//!     vec![Cell::text("north"), Cell::Int(10)],
//!     vec![Cell::text("south"), Cell::Int(4)],
//! ]).unwrap();
//!
//! let code = "plt.bar(df['region'], df['units'])\nplt.title('Units')";
//! let run = Sandbox::new().execute(code, &Bindings::standard(table)).unwrap();
//! let chart = run.outcome.chart().unwrap();
//! assert_eq!(chart.axes[0].title.as_deref(), Some("Units"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod executor;
mod frame;
mod interp;
mod limits;
mod plot;
mod policy;
mod validate;
mod value;

pub use error::{RuntimeFault, SandboxError, SandboxResult, TimeoutCause};
pub use executor::{
    Binding, Bindings, Execution, Outcome, Sandbox, DATA_NAME, DEFAULT_MODULE_ALIASES,
    PLOTTING_NAME, TABLE_NAME,
};
pub use limits::ExecutionLimits;
pub use plot::{Chart, ChartAxes, Trace, TraceKind};
pub use policy::{Finding, FindingCategory};
pub use validate::{check, inspect, validate, ValidatedProgram};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
