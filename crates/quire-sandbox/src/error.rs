//! Sandbox error types
//!
//! Every failure of a validate-then-execute request is one of three
//! [`SandboxError`] variants. Ran-cleanly-but-drew-nothing is not an error; it
//! is [`Outcome::NoArtifact`](crate::Outcome::NoArtifact).

use crate::policy::Finding;

/// Why a validated program stopped early
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeFault {
    #[error("execution timed out: {0}")]
    Timeout(TimeoutCause),

    #[error("memory ceiling reached: {what} exceeds {limit}")]
    MemoryCeiling { what: &'static str, limit: usize },

    #[error("module '{0}' is not available in the sandbox")]
    Import(String),

    #[error("unsupported construct: {0}")]
    Unsupported(String),

    #[error("name '{0}' is not defined")]
    Name(String),

    #[error("'{type_name}' object has no attribute '{attr}'")]
    Attribute { type_name: String, attr: String },

    #[error("type error: {0}")]
    Type(String),

    #[error("value error: {0}")]
    Value(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("index error: {0}")]
    Index(String),

    #[error("division by zero")]
    ZeroDivision,

    #[error("integer overflow")]
    Overflow,
}

/// Which limit ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimeoutCause {
    #[error("step budget of {0} exhausted")]
    Steps(u64),

    #[error("wall clock limit of {0} ms exceeded")]
    WallClock(u64),
}

/// Validate-then-execute failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SandboxError {
    /// Structurally unsafe; never executed
    #[error("code rejected: {}", summarize(.findings))]
    ValidationRejected { findings: Vec<Finding> },

    /// Unparseable; never executed
    #[error("syntax error at line {line}, column {column}")]
    SyntaxInvalid { line: usize, column: usize },

    /// Raised while running
    #[error("line {line}: {fault}")]
    RuntimeFailure { line: usize, fault: RuntimeFault },

    #[error("parser initialization failed: {0}")]
    ParserInit(String),
}

impl SandboxError {
    /// Check if the code ran at all
    #[inline]
    #[must_use]
    pub fn was_executed(&self) -> bool {
        matches!(self, SandboxError::RuntimeFailure { .. })
    }
}

fn summarize(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for sandbox operations
pub type SandboxResult<T> = Result<T, SandboxError>;

pub(crate) type FaultResult<T> = Result<T, RuntimeFault>;

pub(crate) fn type_error(msg: impl Into<String>) -> RuntimeFault {
    RuntimeFault::Type(msg.into())
}

pub(crate) fn unsupported(msg: impl Into<String>) -> RuntimeFault {
    RuntimeFault::Unsupported(msg.into())
}
