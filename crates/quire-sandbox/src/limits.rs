//! Execution limits
//!
//! Generated code runs under a step budget, a wall-clock deadline and a
//! memory ceiling. The ceiling bounds each collection and string on its own
//! and, cumulatively, everything the run allocates. Freed values are not
//! credited back.

use crate::error::{FaultResult, RuntimeFault, TimeoutCause};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::time::{Duration, Instant};

/// Deadline is re-read from the clock once per this many steps
const CLOCK_CHECK_INTERVAL: u64 = 1024;

/// Hard ceilings for one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionLimits {
    /// Evaluation steps (statements, expressions and loop iterations)
    pub max_steps: u64,
    /// Wall-clock budget in milliseconds
    pub wall_clock_ms: u64,
    /// Elements in any single list, dict, series or frame column
    pub max_elements: usize,
    /// Bytes in any single string
    pub max_string_bytes: usize,
    /// Elements allocated over the whole run
    pub max_total_elements: usize,
    /// String bytes allocated over the whole run
    pub max_total_string_bytes: usize,
}

impl ExecutionLimits {
    /// Create default limits
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With step budget
    #[inline]
    #[must_use]
    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = steps;
        self
    }

    /// With wall-clock budget
    #[inline]
    #[must_use]
    pub fn with_wall_clock_ms(mut self, ms: u64) -> Self {
        self.wall_clock_ms = ms;
        self
    }

    /// With collection size ceiling
    #[inline]
    #[must_use]
    pub fn with_max_elements(mut self, n: usize) -> Self {
        self.max_elements = n;
        self
    }

    /// With string size ceiling
    #[inline]
    #[must_use]
    pub fn with_max_string_bytes(mut self, n: usize) -> Self {
        self.max_string_bytes = n;
        self
    }

    /// With run-wide element allowance
    #[inline]
    #[must_use]
    pub fn with_max_total_elements(mut self, n: usize) -> Self {
        self.max_total_elements = n;
        self
    }

    /// With run-wide string byte allowance
    #[inline]
    #[must_use]
    pub fn with_max_total_string_bytes(mut self, n: usize) -> Self {
        self.max_total_string_bytes = n;
        self
    }
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
            wall_clock_ms: 5_000,
            max_elements: 100_000,
            max_string_bytes: 1 << 20,
            max_total_elements: 4_000_000,
            max_total_string_bytes: 64 << 20,
        }
    }
}

/// Running account against [`ExecutionLimits`]
#[derive(Debug)]
pub(crate) struct Budget {
    limits: ExecutionLimits,
    steps: u64,
    deadline: Instant,
    elements: Cell<usize>,
    string_bytes: Cell<usize>,
}

impl Budget {
    pub(crate) fn start(limits: ExecutionLimits) -> Self {
        Self {
            limits,
            steps: 0,
            deadline: Instant::now() + Duration::from_millis(limits.wall_clock_ms),
            elements: Cell::new(0),
            string_bytes: Cell::new(0),
        }
    }

    /// Charge one step
    pub(crate) fn tick(&mut self) -> FaultResult<()> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(RuntimeFault::Timeout(TimeoutCause::Steps(
                self.limits.max_steps,
            )));
        }
        if self.steps % CLOCK_CHECK_INTERVAL == 0 && Instant::now() >= self.deadline {
            return Err(RuntimeFault::Timeout(TimeoutCause::WallClock(
                self.limits.wall_clock_ms,
            )));
        }
        Ok(())
    }

    /// Check a collection size
    pub(crate) fn check_len(&self, len: usize) -> FaultResult<()> {
        if len > self.limits.max_elements {
            Err(RuntimeFault::MemoryCeiling {
                what: "collection length",
                limit: self.limits.max_elements,
            })
        } else {
            Ok(())
        }
    }

    /// Check a string size
    pub(crate) fn check_str(&self, bytes: usize) -> FaultResult<()> {
        if bytes > self.limits.max_string_bytes {
            Err(RuntimeFault::MemoryCeiling {
                what: "string size",
                limit: self.limits.max_string_bytes,
            })
        } else {
            Ok(())
        }
    }

    /// Charge `n` newly allocated elements against the run allowance
    pub(crate) fn charge_elements(&self, n: usize) -> FaultResult<()> {
        let total = self.elements.get().saturating_add(n);
        self.elements.set(total);
        if total > self.limits.max_total_elements {
            return Err(RuntimeFault::MemoryCeiling {
                what: "total allocated elements",
                limit: self.limits.max_total_elements,
            });
        }
        Ok(())
    }

    /// Charge `n` newly allocated string bytes against the run allowance
    pub(crate) fn charge_bytes(&self, n: usize) -> FaultResult<()> {
        let total = self.string_bytes.get().saturating_add(n);
        self.string_bytes.set(total);
        if total > self.limits.max_total_string_bytes {
            return Err(RuntimeFault::MemoryCeiling {
                what: "total allocated string bytes",
                limit: self.limits.max_total_string_bytes,
            });
        }
        Ok(())
    }

    /// Check and charge a new collection of `len` elements
    pub(crate) fn alloc_len(&self, len: usize) -> FaultResult<()> {
        self.check_len(len)?;
        self.charge_elements(len)
    }

    /// Check and charge a new string of `bytes` bytes
    pub(crate) fn alloc_str(&self, bytes: usize) -> FaultResult<()> {
        self.check_str(bytes)?;
        self.charge_bytes(bytes)
    }

    #[inline]
    pub(crate) fn steps(&self) -> u64 {
        self.steps
    }
}
