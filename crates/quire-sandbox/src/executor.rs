//! Validate-then-execute front door
//!
//! [`Sandbox::execute`] checks source with [`crate::check`], runs it in the
//! restricted interpreter against the given [`Bindings`] and reports the
//! chart (if any) the program left behind.

use crate::error::{SandboxError, SandboxResult};
use crate::interp::Interpreter;
use crate::limits::ExecutionLimits;
use crate::plot::Chart;
use crate::validate::{check, ValidatedProgram};
use indexmap::IndexMap;
use quire_table::{Cell, Table};
use serde::{Deserialize, Serialize};

/// Name the plotting namespace is bound to by [`Bindings::standard`]
pub const PLOTTING_NAME: &str = "plt";

/// Name the data namespace is bound to by [`Bindings::standard`]
pub const DATA_NAME: &str = "pd";

/// Name the data table is bound to by [`Bindings::standard`]
pub const TABLE_NAME: &str = "df";

/// Module paths importable by default, and the binding each resolves to
pub const DEFAULT_MODULE_ALIASES: &[(&str, &str)] = &[
    ("matplotlib.pyplot", PLOTTING_NAME),
    ("matplotlib", PLOTTING_NAME),
    ("pandas", DATA_NAME),
];

/// A value made available to the program
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A data frame built from the table; the program sees its own copy
    Table(Table),
    /// The `plt` namespace
    Plotting,
    /// The `pd` namespace
    Data,
    /// A scalar
    Scalar(Cell),
}

/// Ordered name → binding map; order decides which chart wins
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    entries: IndexMap<String, Binding>,
}

impl Bindings {
    /// Create empty bindings
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `df`, `plt` and `pd`, in that order
    #[must_use]
    pub fn standard(table: Table) -> Self {
        Self::new()
            .with_table(TABLE_NAME, table)
            .with_plotting(PLOTTING_NAME)
            .with_data(DATA_NAME)
    }

    /// With a data table
    #[must_use]
    pub fn with_table(mut self, name: impl Into<String>, table: Table) -> Self {
        self.entries.insert(name.into(), Binding::Table(table));
        self
    }

    /// With the plotting namespace
    #[must_use]
    pub fn with_plotting(mut self, name: impl Into<String>) -> Self {
        self.entries.insert(name.into(), Binding::Plotting);
        self
    }

    /// With the data namespace
    #[must_use]
    pub fn with_data(mut self, name: impl Into<String>) -> Self {
        self.entries.insert(name.into(), Binding::Data);
        self
    }

    /// With a scalar
    #[must_use]
    pub fn with_scalar(mut self, name: impl Into<String>, value: Cell) -> Self {
        self.entries.insert(name.into(), Binding::Scalar(value));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// A figure with at least one trace
    Chart {
        /// Binding or name the figure was reached through
        source: String,
        chart: Chart,
    },
    /// Ran cleanly, drew nothing
    NoArtifact,
}

impl Outcome {
    /// The chart, if one was produced
    #[must_use]
    pub fn chart(&self) -> Option<&Chart> {
        match self {
            Outcome::Chart { chart, .. } => Some(chart),
            Outcome::NoArtifact => None,
        }
    }
}

/// Successful execution report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub outcome: Outcome,
    /// Text written with `print`
    pub printed: String,
    /// Steps charged against the budget
    pub steps: u64,
}

/// Executor configuration: limits and importable modules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sandbox {
    limits: ExecutionLimits,
    module_aliases: IndexMap<String, String>,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self {
            limits: ExecutionLimits::default(),
            module_aliases: DEFAULT_MODULE_ALIASES
                .iter()
                .map(|(path, name)| ((*path).to_string(), (*name).to_string()))
                .collect(),
        }
    }
}

impl Sandbox {
    /// Create sandbox with default limits and aliases
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With execution limits
    #[inline]
    #[must_use]
    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// With an importable module path resolving to a binding name
    #[must_use]
    pub fn with_module_alias(mut self, path: impl Into<String>, binding: impl Into<String>) -> Self {
        self.module_aliases.insert(path.into(), binding.into());
        self
    }

    /// With the whole alias map replaced
    #[must_use]
    pub fn with_module_aliases(mut self, aliases: IndexMap<String, String>) -> Self {
        self.module_aliases = aliases;
        self
    }

    #[inline]
    #[must_use]
    pub fn limits(&self) -> &ExecutionLimits {
        &self.limits
    }

    #[inline]
    #[must_use]
    pub fn module_aliases(&self) -> &IndexMap<String, String> {
        &self.module_aliases
    }

    /// Structural check only; see [`crate::validate`]
    #[must_use]
    pub fn validate(&self, source: &str) -> bool {
        crate::validate::validate(source)
    }

    /// Validate, then run
    ///
    /// # Errors
    /// - `SyntaxInvalid` / `ValidationRejected` before anything runs
    /// - `RuntimeFailure` with the failing line if the run stops early
    pub fn execute(&self, source: &str, bindings: &Bindings) -> SandboxResult<Execution> {
        let program = check(source)?;
        self.run(program, bindings)
    }

    /// Run an already validated program
    ///
    /// # Errors
    /// `RuntimeFailure` with the failing line if the run stops early
    pub fn run(&self, program: ValidatedProgram, bindings: &Bindings) -> SandboxResult<Execution> {
        let mut interpreter =
            Interpreter::new(program.source(), bindings, &self.module_aliases, self.limits);

        if let Err(fault) = interpreter.run(program.tree().root_node()) {
            let line = interpreter.line();
            tracing::warn!(
                "Execution failed on line {} after {} steps: {}",
                line,
                interpreter.steps(),
                fault
            );
            return Err(SandboxError::RuntimeFailure { line, fault });
        }

        let outcome = match interpreter.find_chart() {
            Some((source, chart)) => {
                tracing::info!(
                    "Execution produced a chart via '{}' with {} trace(s)",
                    source,
                    chart.trace_count()
                );
                Outcome::Chart { source, chart }
            }
            None => {
                tracing::info!("Execution finished without a chart");
                Outcome::NoArtifact
            }
        };

        Ok(Execution {
            outcome,
            printed: interpreter.take_printed(),
            steps: interpreter.steps(),
        })
    }
}
