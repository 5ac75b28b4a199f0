//! Payoff-table estimation of the ideal and nadir points.
//!
//! Each objective is minimized on its own over the original constraints and
//! bounds; the objective values at the k individually optimal points form a
//! k×k payoff table. Column minima approximate the ideal point and column
//! maxima the nadir point. The nadir obtained this way is an estimate, not an
//! exact value, and it degrades when the underlying solver returns non-global
//! optima.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::error::{ImOptError, Result};
use crate::problem::Problem;
use crate::solver::{DifferentialEvolution, Minimizer, SolveOptions, SolveStatus};

/// A payoff row that was excluded from the column aggregation.
#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    /// Symbol of the objective whose single-objective solve failed.
    pub objective: String,
    pub status: SolveStatus,
    pub message: String,
}

/// Result of a payoff-table estimation, in display orientation.
#[derive(Debug, Clone, Serialize)]
pub struct PayoffTable {
    /// Best achievable value per objective symbol.
    pub ideal: HashMap<String, f64>,

    /// Pessimistic estimate of the worst value per objective symbol across
    /// the individually optimal points.
    pub nadir: HashMap<String, f64>,

    /// Row i holds the objective values at the point that minimized objective
    /// i, in objective declaration order; `None` for excluded rows.
    pub table: Vec<Option<Vec<f64>>>,

    /// Rows excluded from the aggregation. A non-empty list marks the
    /// estimate as partial.
    pub failures: Vec<RowFailure>,
}

impl PayoffTable {
    /// Whether any row failed, making the estimate partial.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Payoff-table estimator over an injected minimizer.
pub struct PayoffEstimator<M> {
    minimizer: M,
}

impl<M: Minimizer> PayoffEstimator<M> {
    pub fn new(minimizer: M) -> Self {
        Self { minimizer }
    }

    /// Estimate the ideal and nadir points of `problem`.
    ///
    /// The k single-objective rows are independent and solved in parallel.
    /// A failed row (infeasible, error, timeout) is excluded from the column
    /// extremes and reported in [`PayoffTable::failures`]; the call fails
    /// with [`ImOptError::Estimation`] only when every row fails.
    pub fn estimate(&self, problem: &Problem, options: &SolveOptions) -> Result<PayoffTable> {
        let k = problem.num_objectives();

        let rows: Vec<Result<_>> = (0..k)
            .into_par_iter()
            .map(|i| self.minimizer.minimize(problem, i, options))
            .collect();

        // Rows in internal orientation; `None` marks an excluded row.
        let mut table: Vec<Option<Vec<f64>>> = Vec::with_capacity(k);
        let mut failures = Vec::new();
        for (i, row) in rows.into_iter().enumerate() {
            let symbol = problem.objectives()[i].symbol().to_string();
            match row {
                Ok(result) if result.is_success() => {
                    let x = result.x.to_vec();
                    let values = (0..k)
                        .map(|j| problem.eval_objective_internal(j, &x))
                        .collect();
                    table.push(Some(values));
                }
                Ok(result) => {
                    tracing::warn!(
                        objective = %symbol,
                        status = %result.status,
                        "payoff row excluded: {}",
                        result.message
                    );
                    failures.push(RowFailure {
                        objective: symbol,
                        status: result.status,
                        message: result.message,
                    });
                    table.push(None);
                }
                Err(e) => {
                    tracing::warn!(objective = %symbol, "payoff row errored: {}", e);
                    failures.push(RowFailure {
                        objective: symbol,
                        status: SolveStatus::Error,
                        message: e.to_string(),
                    });
                    table.push(None);
                }
            }
        }

        if table.iter().all(Option::is_none) {
            return Err(ImOptError::Estimation(format!(
                "all {} payoff rows failed",
                k
            )));
        }

        let mut ideal = HashMap::with_capacity(k);
        let mut nadir = HashMap::with_capacity(k);
        for (j, objective) in problem.objectives().iter().enumerate() {
            let mut column_min = f64::INFINITY;
            let mut column_max = f64::NEG_INFINITY;
            for row in table.iter().flatten() {
                column_min = column_min.min(row[j]);
                column_max = column_max.max(row[j]);
            }
            ideal.insert(objective.symbol().to_string(), objective.oriented(column_min));
            nadir.insert(objective.symbol().to_string(), objective.oriented(column_max));
        }

        // Expose the table in display orientation, like the aggregates.
        let table = table
            .into_iter()
            .map(|row| {
                row.map(|values| {
                    values
                        .iter()
                        .zip(problem.objectives())
                        .map(|(&v, o)| o.oriented(v))
                        .collect()
                })
            })
            .collect();

        Ok(PayoffTable {
            ideal,
            nadir,
            table,
            failures,
        })
    }
}

/// Estimate the ideal and nadir points with the default minimizer.
pub fn estimate_ideal_nadir(problem: &Problem) -> Result<PayoffTable> {
    PayoffEstimator::new(DifferentialEvolution::default())
        .estimate(problem, &SolveOptions::default())
}
