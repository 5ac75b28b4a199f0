//! Achievement scalarizing function construction.
//!
//! Given a problem with populated ideal and nadir points and a decision
//! maker's reference point, this module builds an augmented single-objective
//! problem whose optimum is Pareto-optimal and tracks the reference point:
//! a new auxiliary variable `_alpha` bounds the largest weighted deviation
//! from the aspiration levels, one `*_con` inequality per objective ties the
//! deviations to `_alpha`, and a small augmentation term pushes the optimum
//! off weakly Pareto-optimal plateaus.
//!
//! The result is an ordinary [`Problem`] value, so the consumed minimizer
//! sees a uniform interface regardless of how many objectives the original
//! problem had.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::Result;
use crate::expr::Expr;
use crate::problem::{Constraint, ConstraintKind, Objective, Problem, Sense, Variable};

/// Symbol of the auxiliary deviation-bound variable.
pub const ALPHA_SYMBOL: &str = "_alpha";

/// Symbol of the scalarized objective.
pub const ASF_SYMBOL: &str = "_asf";

/// Suffix appended to an objective symbol to name its deviation constraint.
pub const DEVIATION_SUFFIX: &str = "_con";

/// Tunables of the achievement scalarization.
#[derive(Debug, Clone, Serialize)]
pub struct AsfConfig {
    /// Augmentation coefficient; small and positive so the optimum is
    /// Pareto-optimal rather than merely weakly Pareto-optimal.
    pub rho: f64,

    /// Floor substituted for the weight denominator `nadir - ideal` when the
    /// two nearly coincide, to avoid division blow-up.
    pub weight_floor: f64,

    /// Bounds given to `_alpha`. Wide enough to be inactive in practice.
    pub alpha_bounds: (f64, f64),
}

impl Default for AsfConfig {
    fn default() -> Self {
        Self {
            rho: 1e-5,
            weight_floor: 1e-6,
            alpha_bounds: (-1e4, 1e4),
        }
    }
}

impl AsfConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rho(mut self, rho: f64) -> Self {
        self.rho = rho;
        self
    }

    pub fn with_weight_floor(mut self, weight_floor: f64) -> Self {
        self.weight_floor = weight_floor;
        self
    }

    pub fn with_alpha_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.alpha_bounds = (lower, upper);
        self
    }
}

/// Build the augmented achievement scalarization of `problem` for the given
/// reference point (display orientation, one aspiration per objective
/// symbol; the point need not lie inside the ideal/nadir box).
///
/// The augmented problem contains every original variable plus `_alpha`,
/// every original constraint plus one `<objective>_con` deviation constraint
/// per objective, and the single minimized objective
/// `_asf = _alpha + rho * Σ wᵢ·fᵢ` with `wᵢ = 1 / (nadirᵢ − idealᵢ)`.
/// Maximize-flagged objectives enter the weights, the deviation constraints,
/// and the augmentation through their internal (negated) form.
pub fn build_achievement_problem(
    problem: &Problem,
    reference: &HashMap<String, f64>,
    config: &AsfConfig,
) -> Result<Problem> {
    let (ideal, nadir) = problem.require_ideal_and_nadir("achievement scalarization")?;
    problem.validate_point(reference, "reference point")?;

    let x0 = problem.initial_point().to_vec();
    let mut constraints = problem.constraints().to_vec();
    let mut terms = Vec::with_capacity(problem.num_objectives());
    let mut worst_deviation = f64::NEG_INFINITY;

    for (i, objective) in problem.objectives().iter().enumerate() {
        let symbol = objective.symbol();
        let mut denominator = nadir[symbol] - ideal[symbol];
        if !denominator.is_finite() || denominator < config.weight_floor {
            denominator = config.weight_floor;
        }
        let weight = 1.0 / denominator;
        let aspiration = objective.oriented(reference[symbol]);
        let internal = objective.internal_ast();

        // w_i * (f_i(x) - ref_i) - alpha <= 0
        let deviation = Expr::number(weight)
            .mul(internal.clone().sub(Expr::number(aspiration)))
            .sub(Expr::symbol(ALPHA_SYMBOL));
        constraints.push(Constraint::from_ast(
            &format!("{} deviation", objective.name()),
            &format!("{}{}", symbol, DEVIATION_SUFFIX),
            deviation,
            ConstraintKind::Inequality,
        ));

        terms.push(Expr::number(weight).mul(internal));

        let initial_deviation =
            weight * (problem.eval_objective_internal(i, &x0) - aspiration);
        worst_deviation = worst_deviation.max(initial_deviation);
    }

    let mut terms = terms.into_iter();
    let Some(mut augmentation) = terms.next() else {
        // Problem construction guarantees at least one objective.
        return Err(crate::problem::ValidationError::Empty { what: "objective" }.into());
    };
    for term in terms {
        augmentation = augmentation.add(term);
    }
    let asf = Expr::symbol(ALPHA_SYMBOL).add(Expr::number(config.rho).mul(augmentation));

    // Start alpha at the worst weighted deviation of the initial point.
    let (alpha_lower, alpha_upper) = config.alpha_bounds;
    let alpha_initial = if worst_deviation.is_finite() {
        worst_deviation.clamp(alpha_lower, alpha_upper)
    } else {
        0.0
    };
    let mut variables = problem.variables().to_vec();
    variables.push(Variable::new(
        "alpha",
        ALPHA_SYMBOL,
        alpha_lower,
        alpha_upper,
        alpha_initial,
    )?);

    let objective = Objective::from_ast(
        "achievement scalarizing function",
        ASF_SYMBOL,
        asf,
        Sense::Minimize,
    );

    Problem::new(
        &format!("{} (achievement scalarization)", problem.name()),
        problem.description(),
        problem.constants().to_vec(),
        variables,
        vec![objective],
        constraints,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImOptError;
    use crate::problem::ValidationError;
    use approx::assert_relative_eq;

    fn reference(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries
            .iter()
            .map(|&(k, v)| (k.to_string(), v))
            .collect()
    }

    fn base_problem() -> Problem {
        Problem::new(
            "base",
            "",
            vec![],
            vec![
                Variable::new("x1", "x1", -5.0, 5.0, 0.0).unwrap(),
                Variable::new("x2", "x2", -5.0, 5.0, 0.0).unwrap(),
            ],
            vec![
                Objective::new("f1", "f1", "x1^2", Sense::Minimize).unwrap(),
                Objective::new("f2", "f2", "(x2 - 1)^2", Sense::Minimize).unwrap(),
            ],
            vec![Constraint::inequality("g1", "g1", "x1 + x2 - 10").unwrap()],
        )
        .unwrap()
    }

    fn with_box(problem: &Problem) -> Problem {
        problem
            .with_ideal_and_nadir(
                &reference(&[("f1", 0.0), ("f2", 0.0)]),
                &reference(&[("f1", 25.0), ("f2", 36.0)]),
            )
            .unwrap()
    }

    #[test]
    fn test_augmented_structure() {
        let problem = with_box(&base_problem());
        let augmented =
            build_achievement_problem(&problem, &reference(&[("f1", 1.0), ("f2", 4.0)]), &AsfConfig::default())
                .unwrap();

        // One new variable, one scalar objective, one new constraint per
        // objective on top of the originals.
        assert_eq!(augmented.num_variables(), problem.num_variables() + 1);
        assert_eq!(augmented.num_objectives(), 1);
        assert_eq!(
            augmented.constraints().len(),
            problem.constraints().len() + problem.num_objectives()
        );

        assert_eq!(augmented.variables().last().unwrap().symbol(), ALPHA_SYMBOL);
        assert_eq!(augmented.objectives()[0].symbol(), ASF_SYMBOL);
        let symbols: Vec<&str> = augmented.constraints().iter().map(|c| c.symbol()).collect();
        assert_eq!(symbols, vec!["g1", "f1_con", "f2_con"]);
    }

    #[test]
    fn test_deviation_constraint_values() {
        let problem = with_box(&base_problem());
        let augmented = build_achievement_problem(
            &problem,
            &reference(&[("f1", 1.0), ("f2", 4.0)]),
            &AsfConfig::default(),
        )
        .unwrap();

        // At x = (2, 1, alpha = 0.5): f1 = 4, f2 = 0.
        // w1 = 1/25, w2 = 1/36.
        let values = augmented.constraint_values(&[2.0, 1.0, 0.5]).unwrap();
        assert_relative_eq!(values["f1_con"], (4.0 - 1.0) / 25.0 - 0.5, epsilon = 1e-12);
        assert_relative_eq!(values["f2_con"], (0.0 - 4.0) / 36.0 - 0.5, epsilon = 1e-12);
        // Original constraint carried through unchanged.
        assert_relative_eq!(values["g1"], 2.0 + 1.0 - 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_asf_objective_value() {
        let problem = with_box(&base_problem());
        let config = AsfConfig::default().with_rho(1e-4);
        let augmented = build_achievement_problem(
            &problem,
            &reference(&[("f1", 1.0), ("f2", 4.0)]),
            &config,
        )
        .unwrap();

        let values = augmented.objective_values(&[2.0, 1.0, 0.5]).unwrap();
        let expected = 0.5 + 1e-4 * (4.0 / 25.0 + 0.0 / 36.0);
        assert_relative_eq!(values[ASF_SYMBOL], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_weight_floor_guards_degenerate_range() {
        let problem = base_problem()
            .with_ideal_and_nadir(
                &reference(&[("f1", 2.0), ("f2", 0.0)]),
                &reference(&[("f1", 2.0), ("f2", 36.0)]),
            )
            .unwrap();
        let config = AsfConfig::default().with_weight_floor(1e-6);
        let augmented = build_achievement_problem(
            &problem,
            &reference(&[("f1", 2.0), ("f2", 0.0)]),
            &config,
        )
        .unwrap();

        // nadir - ideal = 0 for f1, so its weight is 1 / weight_floor.
        let values = augmented.constraint_values(&[1.0, 0.0, 0.0]).unwrap();
        assert_relative_eq!(values["f1_con"], (1.0 - 2.0) * 1e6, epsilon = 1e-6);
    }

    #[test]
    fn test_maximize_objective_enters_negated() {
        let problem = Problem::new(
            "mixed",
            "",
            vec![],
            vec![Variable::new("x", "x", -5.0, 5.0, 0.0).unwrap()],
            vec![Objective::new("f", "f", "x", Sense::Maximize).unwrap()],
            vec![],
        )
        .unwrap()
        .with_ideal_and_nadir(
            &reference(&[("f", 5.0)]),
            &reference(&[("f", -5.0)]),
        )
        .unwrap();

        let augmented = build_achievement_problem(
            &problem,
            &reference(&[("f", 3.0)]),
            &AsfConfig::default(),
        )
        .unwrap();

        // Internal: minimize -x, ideal -5, nadir 5, weight 1/10, aspiration -3.
        // At x = 4, alpha = 0: (-4 - (-3)) / 10 = -0.1.
        let values = augmented.constraint_values(&[4.0, 0.0]).unwrap();
        assert_relative_eq!(values["f_con"], -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_requires_ideal_and_nadir() {
        let result = build_achievement_problem(
            &base_problem(),
            &reference(&[("f1", 1.0), ("f2", 4.0)]),
            &AsfConfig::default(),
        );
        assert!(matches!(result, Err(ImOptError::Prerequisite(_))));
    }

    #[test]
    fn test_requires_complete_reference() {
        let problem = with_box(&base_problem());
        let result = build_achievement_problem(
            &problem,
            &reference(&[("f1", 1.0)]),
            &AsfConfig::default(),
        );
        assert!(matches!(
            result,
            Err(ImOptError::Validation(ValidationError::MissingEntry { .. }))
        ));
    }

    #[test]
    fn test_auxiliary_symbol_collision_is_caught() {
        let problem = Problem::new(
            "collision",
            "",
            vec![],
            vec![
                Variable::new("x", "x", -5.0, 5.0, 0.0).unwrap(),
                Variable::new("alpha", "_alpha", -1.0, 1.0, 0.0).unwrap(),
            ],
            vec![Objective::new("f", "f", "x^2 + _alpha", Sense::Minimize).unwrap()],
            vec![],
        )
        .unwrap()
        .with_ideal_and_nadir(&reference(&[("f", 0.0)]), &reference(&[("f", 1.0)]))
        .unwrap();

        let result = build_achievement_problem(
            &problem,
            &reference(&[("f", 0.5)]),
            &AsfConfig::default(),
        );
        assert!(matches!(
            result,
            Err(ImOptError::Validation(ValidationError::DuplicateSymbol { .. }))
        ));
    }
}
