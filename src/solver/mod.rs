//! The numeric-optimizer boundary.
//!
//! The interactive core consumes a single-objective minimizer as a black box
//! through the [`Minimizer`] trait. The default implementation is
//! [`DifferentialEvolution`]; any external solver can be plugged in by
//! implementing the trait, since every subproblem the core produces is an
//! ordinary [`Problem`] value.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ndarray::Array1;
use serde::Serialize;
use thiserror::Error;

use crate::error::Result;
use crate::problem::Problem;

mod differential_evolution;

pub use differential_evolution::DifferentialEvolution;

/// Terminal status of a single minimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    /// Converged to a feasible point.
    Success,
    /// The best point found violates the constraints beyond tolerance.
    Infeasible,
    /// The per-call timeout elapsed before convergence.
    TimedOut,
    /// The batch was cancelled before or during this call.
    Canceled,
    /// The solver failed for another reason described in the message.
    Error,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Success => "success",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::TimedOut => "timed out",
            SolveStatus::Canceled => "canceled",
            SolveStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Result of a single minimization.
#[derive(Debug, Clone)]
pub struct OptimizeResult {
    /// Terminal status; only [`SolveStatus::Success`] results participate in
    /// payoff aggregation and reference-point solution sets.
    pub status: SolveStatus,

    /// The best decision vector found, one entry per problem variable.
    pub x: Array1<f64>,

    /// Objective value at `x`, in internal (minimization) orientation.
    pub objective_value: f64,

    /// Number of iterations (generations) performed.
    pub iterations: usize,

    /// Number of objective evaluations.
    pub func_evals: usize,

    /// Human-readable account of how the solve ended.
    pub message: String,
}

impl OptimizeResult {
    pub fn is_success(&self) -> bool {
        self.status == SolveStatus::Success
    }
}

/// A failed minimization, tagged with the subproblem it belonged to.
#[derive(Error, Debug, Clone, Serialize)]
#[error("solve failure for {subproblem} ({status}): {message}")]
pub struct SolveFailure {
    /// Identity of the failing subproblem (payoff row or perturbation).
    pub subproblem: String,
    pub status: SolveStatus,
    pub message: String,
}

/// Cooperative cancellation flag shared between a caller and an in-flight
/// batch. Cloning shares the underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Sub-solves that already completed still return
    /// their solutions; pending ones report [`SolveStatus::Canceled`].
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-call solve options supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Deadline for a single minimization. On expiry the call returns its
    /// best point so far with [`SolveStatus::TimedOut`].
    pub timeout: Option<Duration>,

    /// Cancellation flag checked between generations.
    pub cancel: Option<CancelToken>,
}

impl SolveOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

/// A single-objective numeric minimizer consumed by the interactive core.
///
/// `objective` selects which of the problem's objectives to minimize (the
/// scalarized subproblems built by this crate always have exactly one).
/// Implementations minimize in internal orientation, honor the problem's
/// variable bounds and constraints, and start from the problem's initial
/// point.
pub trait Minimizer: Sync {
    fn minimize(
        &self,
        problem: &Problem,
        objective: usize,
        options: &SolveOptions,
    ) -> Result<OptimizeResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_solve_failure_display() {
        let failure = SolveFailure {
            subproblem: "perturbation 2 (ideal for 'f2')".to_string(),
            status: SolveStatus::Infeasible,
            message: "constraint violation 0.3 above tolerance".to_string(),
        };
        let text = failure.to_string();
        assert!(text.contains("perturbation 2"));
        assert!(text.contains("infeasible"));
    }
}
