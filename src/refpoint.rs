//! The reference point interactive method.
//!
//! One interaction round takes the decision maker's aspiration levels and
//! returns k+1 trade-off solutions: the achievement scalarization of the
//! reference point itself, plus one variant per objective in which that
//! objective's aspiration is replaced by its ideal value. The cluster shows
//! the local shape of the Pareto front around the stated preference instead
//! of a single point.

use std::collections::HashMap;
use std::fmt;

use rayon::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::problem::Problem;
use crate::scalarize::{build_achievement_problem, AsfConfig};
use crate::solver::{
    DifferentialEvolution, Minimizer, SolveFailure, SolveOptions, SolveStatus,
};

/// Identity of one of the k+1 scalarization instances in a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Perturbation {
    /// The decision maker's reference point as given.
    Original,

    /// The reference point with this objective's aspiration replaced by the
    /// objective's ideal value.
    IdealFor(String),
}

impl fmt::Display for Perturbation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Perturbation::Original => write!(f, "original reference point"),
            Perturbation::IdealFor(symbol) => {
                write!(f, "reference point with ideal substituted for '{}'", symbol)
            }
        }
    }
}

/// One trade-off solution. All values are keyed by symbol; objective values
/// are reported in display orientation, and the variable and constraint maps
/// include the auxiliaries introduced by scalarization (`_alpha`, `*_con`).
#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub objectives: HashMap<String, f64>,
    pub variables: HashMap<String, f64>,
    pub constraints: HashMap<String, f64>,
}

/// Outcome of one perturbation's sub-solve. Failures stay in the returned
/// sequence so a partial round keeps its ordering and names what went wrong.
#[derive(Debug, Clone, Serialize)]
pub enum RefPointOutcome {
    Solved {
        perturbation: Perturbation,
        solution: Solution,
    },
    Failed {
        perturbation: Perturbation,
        failure: SolveFailure,
    },
}

impl RefPointOutcome {
    pub fn perturbation(&self) -> &Perturbation {
        match self {
            RefPointOutcome::Solved { perturbation, .. } => perturbation,
            RefPointOutcome::Failed { perturbation, .. } => perturbation,
        }
    }

    pub fn solution(&self) -> Option<&Solution> {
        match self {
            RefPointOutcome::Solved { solution, .. } => Some(solution),
            RefPointOutcome::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&SolveFailure> {
        match self {
            RefPointOutcome::Solved { .. } => None,
            RefPointOutcome::Failed { failure, .. } => Some(failure),
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, RefPointOutcome::Solved { .. })
    }
}

/// Reference point solver over an injected minimizer.
pub struct ReferencePointSolver<M = DifferentialEvolution> {
    minimizer: M,
    asf: AsfConfig,
}

impl<M: Minimizer> ReferencePointSolver<M> {
    pub fn new(minimizer: M) -> Self {
        Self {
            minimizer,
            asf: AsfConfig::default(),
        }
    }

    /// Replace the scalarization tunables.
    pub fn with_asf_config(mut self, asf: AsfConfig) -> Self {
        self.asf = asf;
        self
    }

    /// Run one interaction round.
    ///
    /// Requires a problem with populated ideal and nadir points and a
    /// reference point covering every objective symbol. Returns k+1 outcomes
    /// in perturbation order: index 0 is the original reference point,
    /// index i is the variant with objective i's aspiration replaced by its
    /// ideal value. The sub-solves are independent and run in parallel; a
    /// failing sub-solve is reported in place without aborting the others.
    pub fn solve(
        &self,
        problem: &Problem,
        reference: &HashMap<String, f64>,
        options: &SolveOptions,
    ) -> Result<Vec<RefPointOutcome>> {
        let (ideal, _) = problem.require_ideal_and_nadir("the reference point method")?;
        problem.validate_point(reference, "reference point")?;

        let mut subproblems = Vec::with_capacity(problem.num_objectives() + 1);
        subproblems.push((
            Perturbation::Original,
            build_achievement_problem(problem, reference, &self.asf)?,
        ));
        for objective in problem.objectives() {
            let symbol = objective.symbol();
            let mut perturbed = reference.clone();
            perturbed.insert(symbol.to_string(), objective.oriented(ideal[symbol]));
            subproblems.push((
                Perturbation::IdealFor(symbol.to_string()),
                build_achievement_problem(problem, &perturbed, &self.asf)?,
            ));
        }

        tracing::debug!(
            rounds = subproblems.len(),
            problem = problem.name(),
            "solving reference point round"
        );

        let outcomes = subproblems
            .into_par_iter()
            .map(|(perturbation, subproblem)| {
                self.solve_one(problem, perturbation, &subproblem, options)
            })
            .collect();
        Ok(outcomes)
    }

    fn solve_one(
        &self,
        original: &Problem,
        perturbation: Perturbation,
        subproblem: &Problem,
        options: &SolveOptions,
    ) -> RefPointOutcome {
        if options.is_cancelled() {
            return RefPointOutcome::Failed {
                failure: SolveFailure {
                    subproblem: perturbation.to_string(),
                    status: SolveStatus::Canceled,
                    message: "batch cancelled before this sub-solve started".to_string(),
                },
                perturbation,
            };
        }

        match self.minimizer.minimize(subproblem, 0, options) {
            Ok(result) if result.is_success() => {
                match assemble_solution(original, subproblem, &result.x.to_vec()) {
                    Ok(solution) => {
                        tracing::debug!(perturbation = %perturbation, "sub-solve completed");
                        RefPointOutcome::Solved {
                            perturbation,
                            solution,
                        }
                    }
                    Err(e) => RefPointOutcome::Failed {
                        failure: SolveFailure {
                            subproblem: perturbation.to_string(),
                            status: SolveStatus::Error,
                            message: e.to_string(),
                        },
                        perturbation,
                    },
                }
            }
            Ok(result) => {
                tracing::debug!(
                    perturbation = %perturbation,
                    status = %result.status,
                    "sub-solve failed: {}",
                    result.message
                );
                RefPointOutcome::Failed {
                    failure: SolveFailure {
                        subproblem: perturbation.to_string(),
                        status: result.status,
                        message: result.message,
                    },
                    perturbation,
                }
            }
            Err(e) => RefPointOutcome::Failed {
                failure: SolveFailure {
                    subproblem: perturbation.to_string(),
                    status: SolveStatus::Error,
                    message: e.to_string(),
                },
                perturbation,
            },
        }
    }
}

/// Read a solved decision vector back through both problem views: objective
/// values from the original problem (display orientation), variables and
/// constraints from the augmented one so the auxiliaries are included.
fn assemble_solution(original: &Problem, augmented: &Problem, x: &[f64]) -> Result<Solution> {
    let n = original.num_variables();
    Ok(Solution {
        objectives: original.objective_values(&x[..n])?,
        variables: augmented.variable_values(x)?,
        constraints: augmented.constraint_values(x)?,
    })
}

/// Run one interaction round with the default minimizer.
pub fn solve_with_reference_point(
    problem: &Problem,
    reference: &HashMap<String, f64>,
) -> Result<Vec<RefPointOutcome>> {
    ReferencePointSolver::new(DifferentialEvolution::default()).solve(
        problem,
        reference,
        &SolveOptions::default(),
    )
}
