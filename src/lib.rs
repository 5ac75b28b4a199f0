//! # imopt-rs
//!
//! `imopt-rs` is the solving core for interactive multiobjective
//! optimization: a decision maker iteratively states aspiration levels (a
//! reference point) and receives a small cluster of Pareto-optimal trade-off
//! solutions honoring that preference.
//!
//! The library provides:
//! - An immutable problem model with symbolic objective/constraint
//!   expressions, compiled once at construction
//! - Payoff-table estimation of the ideal and nadir points
//! - The reference point method: achievement scalarization of k+1
//!   systematically perturbed reference points, solved independently
//! - A pluggable minimizer boundary with a derivative-free default
//!
//! ## Basic Usage
//!
//! ```
//! use imopt_rs::{build_achievement_problem, AsfConfig, Objective, Problem, Sense, Variable};
//! use std::collections::HashMap;
//!
//! let problem = Problem::new(
//!     "two bowls",
//!     "",
//!     vec![],
//!     vec![Variable::new("x", "x", -10.0, 10.0, 0.0).unwrap()],
//!     vec![
//!         Objective::new("f1", "f1", "x^2", Sense::Minimize).unwrap(),
//!         Objective::new("f2", "f2", "(x - 2)^2", Sense::Minimize).unwrap(),
//!     ],
//!     vec![],
//! )
//! .unwrap();
//!
//! // Normally estimated with `estimate_ideal_nadir`; attached here directly.
//! let ideal = HashMap::from([("f1".to_string(), 0.0), ("f2".to_string(), 0.0)]);
//! let nadir = HashMap::from([("f1".to_string(), 4.0), ("f2".to_string(), 4.0)]);
//! let problem = problem.with_ideal_and_nadir(&ideal, &nadir).unwrap();
//!
//! let reference = HashMap::from([("f1".to_string(), 1.0), ("f2".to_string(), 1.0)]);
//! let scalarized =
//!     build_achievement_problem(&problem, &reference, &AsfConfig::default()).unwrap();
//! assert_eq!(scalarized.num_objectives(), 1);
//! assert_eq!(scalarized.num_variables(), 2); // x plus the auxiliary _alpha
//! ```

// Public modules
pub mod error;

// Symbolic expressions and their compiled form
pub mod expr;

// The immutable problem model
pub mod problem;

// Numeric minimizer boundary and the default implementation
pub mod solver;

// Ideal/nadir estimation
pub mod payoff;

// Achievement scalarization
pub mod scalarize;

// The reference point method
pub mod refpoint;

// Re-exports for convenience
pub use error::{ImOptError, Result};

pub use problem::{
    Constant, Constraint, ConstraintKind, MathProperties, Objective, Problem, Sense,
    ValidationError, Variable, VariableKind,
};

pub use solver::{
    CancelToken, DifferentialEvolution, Minimizer, OptimizeResult, SolveFailure, SolveOptions,
    SolveStatus,
};

pub use payoff::{estimate_ideal_nadir, PayoffEstimator, PayoffTable, RowFailure};

pub use scalarize::{
    build_achievement_problem, AsfConfig, ALPHA_SYMBOL, ASF_SYMBOL, DEVIATION_SUFFIX,
};

pub use refpoint::{
    solve_with_reference_point, Perturbation, RefPointOutcome, ReferencePointSolver, Solution,
};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn it_works() {
        assert_eq!(2 + 2, 4);
    }
}
