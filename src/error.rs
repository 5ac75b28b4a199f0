use thiserror::Error;

use crate::expr::CompileError;
use crate::problem::ValidationError;
use crate::solver::SolveFailure;

/// Error types for the imopt-rs library.
///
/// The variants follow the propagation policy of the interactive core:
/// [`ImOptError::Validation`] and [`ImOptError::Prerequisite`] are caller
/// errors and abort the call that raised them, while individual solve
/// failures inside a batch are captured in the partial result instead of
/// being escalated through this type.
#[derive(Error, Debug)]
pub enum ImOptError {
    /// Malformed problem construction, duplicate symbols, unresolved symbol
    /// references, or missing/unknown entries in a symbol-keyed mapping.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An operation requiring the ideal and nadir points was invoked on a
    /// problem that does not carry them.
    #[error("prerequisite not met: {0}")]
    Prerequisite(String),

    /// Expression parsing or compilation failed.
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    /// A single optimizer invocation did not converge or was infeasible.
    #[error(transparent)]
    Solve(#[from] SolveFailure),

    /// Every row of the payoff table failed; no ideal/nadir can be produced.
    #[error("ideal/nadir estimation failed: {0}")]
    Estimation(String),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for imopt-rs operations.
pub type Result<T> = std::result::Result<T, ImOptError>;

/// Extensions for converting from other error types.
impl From<String> for ImOptError {
    fn from(s: String) -> Self {
        ImOptError::Other(s)
    }
}

impl From<&str> for ImOptError {
    fn from(s: &str) -> Self {
        ImOptError::Other(s.to_string())
    }
}
