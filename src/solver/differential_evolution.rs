//! Differential evolution, the default derivative-free minimizer.
//!
//! Constraints are handled with a quadratic penalty, and the best point found
//! by the population search is refined with a compass search before being
//! returned. This keeps the solver free of derivative requirements, which the
//! problem model does not guarantee to satisfy.

use std::time::Instant;

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::{ImOptError, Result};
use crate::problem::Problem;
use crate::solver::{Minimizer, OptimizeResult, SolveOptions, SolveStatus};

/// Differential evolution (rand/1/bin) over the problem's variable box.
///
/// The problem's initial point is always a member of the starting population,
/// so a caller-supplied good guess is never lost to sampling.
#[derive(Debug, Clone)]
pub struct DifferentialEvolution {
    /// Population size multiplier (population size = multiplier * variable count)
    pub pop_size_multiplier: usize,

    /// Differential weight (F) in range [0, 2]
    pub differential_weight: f64,

    /// Crossover probability (CR) in range [0, 1]
    pub crossover_prob: f64,

    /// Maximum number of generations
    pub max_generations: usize,

    /// Stop after this many generations without improvement
    pub max_stall: usize,

    /// Weight of the quadratic constraint penalty
    pub penalty_weight: f64,

    /// Maximum constraint violation accepted as feasible
    pub feasibility_tol: f64,

    /// Refine the best point with a compass search after the population search
    pub polish: bool,

    /// Random seed for reproducible runs; entropy-seeded when `None`
    pub seed: Option<u64>,
}

impl Default for DifferentialEvolution {
    fn default() -> Self {
        Self {
            pop_size_multiplier: 10,
            differential_weight: 0.7,
            crossover_prob: 0.9,
            max_generations: 400,
            max_stall: 80,
            penalty_weight: 1e8,
            feasibility_tol: 1e-6,
            polish: true,
            seed: None,
        }
    }
}

impl DifferentialEvolution {
    /// Create a new optimizer with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the maximum number of generations.
    pub fn with_max_generations(mut self, max_generations: usize) -> Self {
        self.max_generations = max_generations;
        self
    }

    /// Set the population size multiplier.
    pub fn with_population_multiplier(mut self, multiplier: usize) -> Self {
        self.pop_size_multiplier = multiplier;
        self
    }

    /// Create a trial vector for the target index using rand/1/bin.
    fn trial_vector(
        &self,
        target: usize,
        population: &[Vec<f64>],
        bounds: &[(f64, f64)],
        rng: &mut StdRng,
    ) -> Vec<f64> {
        let n = population[0].len();

        // Three distinct donors different from the target
        let mut available: Vec<usize> = (0..population.len()).filter(|&i| i != target).collect();
        available.shuffle(rng);
        let (r1, r2, r3) = (available[0], available[1], available[2]);

        let mut trial = population[r1].clone();
        for j in 0..n {
            trial[j] += self.differential_weight * (population[r2][j] - population[r3][j]);
        }

        // Binomial crossover with the target vector
        let j_rand = rng.gen_range(0..n);
        for j in 0..n {
            if j != j_rand && rng.gen::<f64>() > self.crossover_prob {
                trial[j] = population[target][j];
            }
        }

        clip_to_bounds(trial, bounds)
    }
}

impl Minimizer for DifferentialEvolution {
    fn minimize(
        &self,
        problem: &Problem,
        objective: usize,
        options: &SolveOptions,
    ) -> Result<OptimizeResult> {
        if objective >= problem.num_objectives() {
            return Err(ImOptError::Other(format!(
                "objective index {} out of range for a problem with {} objectives",
                objective,
                problem.num_objectives()
            )));
        }

        let bounds = problem.bounds();
        let n = bounds.len();
        let deadline = options.timeout.map(|t| Instant::now() + t);
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let cost = |x: &[f64]| -> f64 {
            let value = problem.eval_objective_internal(objective, x);
            let mut penalty = 0.0;
            for (i, constraint) in problem.constraints().iter().enumerate() {
                let violation = constraint.violation(problem.eval_constraint(i, x));
                penalty += violation * violation;
            }
            let total = value + self.penalty_weight * penalty;
            if total.is_finite() {
                total
            } else {
                f64::INFINITY
            }
        };

        // The initial point always participates in the starting population.
        let pop_size = (self.pop_size_multiplier * n).max(8);
        let mut population: Vec<Vec<f64>> = Vec::with_capacity(pop_size);
        population.push(clip_to_bounds(problem.initial_point().to_vec(), &bounds));
        while population.len() < pop_size {
            population.push(random_point(&bounds, &mut rng));
        }
        let mut costs: Vec<f64> = population.iter().map(|member| cost(member)).collect();
        let mut func_evals = pop_size;

        let mut best = 0;
        for i in 1..pop_size {
            if costs[i] < costs[best] {
                best = i;
            }
        }
        let mut best_point = population[best].clone();
        let mut best_cost = costs[best];

        let mut status = SolveStatus::Success;
        let mut generations = 0;
        let mut stall = 0;

        while generations < self.max_generations && stall < self.max_stall {
            if options.is_cancelled() {
                status = SolveStatus::Canceled;
                break;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                status = SolveStatus::TimedOut;
                break;
            }

            let mut improved = false;
            for i in 0..pop_size {
                let trial = self.trial_vector(i, &population, &bounds, &mut rng);
                let trial_cost = cost(&trial);
                func_evals += 1;

                if trial_cost < costs[i] {
                    population[i] = trial;
                    costs[i] = trial_cost;

                    if trial_cost < best_cost {
                        best_point = population[i].clone();
                        best_cost = trial_cost;
                        improved = true;
                    }
                }
            }

            if improved {
                stall = 0;
            } else {
                stall += 1;
            }
            generations += 1;
        }

        if self.polish && status == SolveStatus::Success {
            func_evals += compass_polish(&cost, &mut best_point, &mut best_cost, &bounds, deadline);
        }

        let violation = problem.max_violation(&best_point);
        let message = match status {
            SolveStatus::Canceled => "cancelled by caller".to_string(),
            SolveStatus::TimedOut => "timed out before convergence".to_string(),
            _ if violation > self.feasibility_tol => {
                status = SolveStatus::Infeasible;
                format!("best point violates constraints by {:.3e}", violation)
            }
            _ if stall >= self.max_stall => {
                format!("stopped after {} generations without improvement", stall)
            }
            _ => format!("reached maximum number of generations: {}", generations),
        };

        tracing::debug!(
            objective,
            generations,
            func_evals,
            best_cost,
            %status,
            "differential evolution finished"
        );

        let objective_value = problem.eval_objective_internal(objective, &best_point);
        Ok(OptimizeResult {
            status,
            x: Array1::from_vec(best_point),
            objective_value,
            iterations: generations,
            func_evals,
            message,
        })
    }
}

fn clip_to_bounds(mut x: Vec<f64>, bounds: &[(f64, f64)]) -> Vec<f64> {
    for (value, &(lower, upper)) in x.iter_mut().zip(bounds) {
        *value = value.clamp(lower, upper);
    }
    x
}

fn random_point(bounds: &[(f64, f64)], rng: &mut StdRng) -> Vec<f64> {
    bounds
        .iter()
        .map(|&(lower, upper)| {
            if upper > lower {
                rng.gen_range(lower..upper)
            } else {
                lower
            }
        })
        .collect()
}

/// Compass search from the best population member: probe each coordinate in
/// both directions, accept improvements, halve the steps when a full sweep
/// fails. Polishes the stochastic search result to tight tolerances on
/// smooth objectives.
fn compass_polish<F: Fn(&[f64]) -> f64>(
    cost: &F,
    x: &mut Vec<f64>,
    best_cost: &mut f64,
    bounds: &[(f64, f64)],
    deadline: Option<Instant>,
) -> usize {
    const MIN_STEP: f64 = 1e-10;

    let mut steps: Vec<f64> = bounds
        .iter()
        .map(|&(lower, upper)| (0.05 * (upper - lower)).max(MIN_STEP))
        .collect();
    let mut evals = 0;

    while steps.iter().any(|&s| s > MIN_STEP) {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }

        let mut improved = false;
        for j in 0..x.len() {
            for direction in [1.0, -1.0] {
                let candidate = (x[j] + direction * steps[j]).clamp(bounds[j].0, bounds[j].1);
                if candidate == x[j] {
                    continue;
                }
                let previous = x[j];
                x[j] = candidate;
                let c = cost(x);
                evals += 1;
                if c < *best_cost {
                    *best_cost = c;
                    improved = true;
                    break;
                }
                x[j] = previous;
            }
        }

        if !improved {
            for step in steps.iter_mut() {
                *step *= 0.5;
            }
        }
    }

    evals
}
