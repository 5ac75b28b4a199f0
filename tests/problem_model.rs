//! Tests for the immutable problem model: validation, functional updates,
//! and the display/internal orientation convention.

use std::collections::HashMap;

use approx::assert_relative_eq;
use imopt_rs::{
    Constant, Constraint, ImOptError, Objective, MathProperties, Problem, Sense,
    ValidationError, Variable,
};

fn point(entries: &[(&str, f64)]) -> HashMap<String, f64> {
    entries.iter().map(|&(k, v)| (k.to_string(), v)).collect()
}

fn tutorial_problem() -> Problem {
    Problem::new(
        "tutorial",
        "two nonconvex objectives on a box",
        vec![],
        vec![
            Variable::new("x1", "x1", -5.0, 5.0, 0.0).unwrap(),
            Variable::new("x2", "x2", -5.0, 5.0, 0.0).unwrap(),
        ],
        vec![
            Objective::new("f1", "f1", "x1^2 - 1.5 * sin(x2)", Sense::Minimize).unwrap(),
            Objective::new("f2", "f2", "x2^2 - cos(3 * x1)", Sense::Minimize).unwrap(),
        ],
        vec![Constraint::inequality("g1", "g1", "x1 + x2 - 10").unwrap()],
    )
    .unwrap()
}

#[test]
fn test_construction_validates_symbols() {
    // A constraint symbol clashing with a variable symbol is rejected.
    let result = Problem::new(
        "clash",
        "",
        vec![],
        vec![Variable::new("x1", "x1", -5.0, 5.0, 0.0).unwrap()],
        vec![Objective::new("f1", "f1", "x1^2", Sense::Minimize).unwrap()],
        vec![Constraint::inequality("also x1", "x1", "x1 - 1").unwrap()],
    );
    assert!(matches!(
        result,
        Err(ImOptError::Validation(ValidationError::DuplicateSymbol { .. }))
    ));

    // Expressions may only reference the problem's own symbols.
    let result = Problem::new(
        "dangling",
        "",
        vec![],
        vec![Variable::new("x1", "x1", -5.0, 5.0, 0.0).unwrap()],
        vec![Objective::new("f1", "f1", "x1 + x9", Sense::Minimize).unwrap()],
        vec![],
    );
    assert!(matches!(
        result,
        Err(ImOptError::Validation(ValidationError::UnresolvedSymbol { .. }))
    ));
}

#[test]
fn test_constants_participate_in_expressions() {
    let problem = Problem::new(
        "with constant",
        "",
        vec![Constant::new("scale", "s", 3.0)],
        vec![Variable::new("x", "x", -5.0, 5.0, 1.0).unwrap()],
        vec![Objective::new("f", "f", "s * x^2", Sense::Minimize).unwrap()],
        vec![],
    )
    .unwrap();

    let values = problem.objective_values(&[2.0]).unwrap();
    assert_relative_eq!(values["f"], 12.0);
}

#[test]
fn test_with_ideal_and_nadir_never_mutates() {
    let problem = tutorial_problem();
    let ideal = point(&[("f1", -1.5), ("f2", -1.0)]);
    let nadir = point(&[("f1", 0.0), ("f2", 1.5)]);

    let updated = problem.with_ideal_and_nadir(&ideal, &nadir).unwrap();

    assert!(updated.has_ideal_and_nadir());
    assert!(!problem.has_ideal_and_nadir());
    assert!(problem.ideal().is_none());

    assert_relative_eq!(updated.ideal().unwrap()["f1"], -1.5);
    assert_relative_eq!(updated.nadir().unwrap()["f2"], 1.5);
}

#[test]
fn test_with_ideal_and_nadir_is_idempotent() {
    let problem = tutorial_problem();
    let ideal = point(&[("f1", -1.5), ("f2", -1.0)]);
    let nadir = point(&[("f1", 0.0), ("f2", 1.5)]);

    let once = problem.with_ideal_and_nadir(&ideal, &nadir).unwrap();
    let twice = once.with_ideal_and_nadir(&ideal, &nadir).unwrap();

    // Equal by value: the serialized forms coincide exactly.
    assert_eq!(
        serde_json::to_value(&once).unwrap(),
        serde_json::to_value(&twice).unwrap()
    );
}

#[test]
fn test_maximize_objective_reported_in_display_orientation() {
    let problem = Problem::new(
        "profit",
        "",
        vec![],
        vec![Variable::new("x", "x", 0.0, 10.0, 0.0).unwrap()],
        vec![
            Objective::new("profit", "p", "10 * x - x^2", Sense::Maximize).unwrap(),
            Objective::new("cost", "c", "x", Sense::Minimize).unwrap(),
        ],
        vec![],
    )
    .unwrap();

    let values = problem.objective_values(&[3.0]).unwrap();
    // Display value is the natural one even though the core minimizes -p.
    assert_relative_eq!(values["p"], 21.0);
    assert_relative_eq!(values["c"], 3.0);
}

#[test]
fn test_math_properties_are_stored() {
    let objective = Objective::new("f", "f", "x^2", Sense::Minimize)
        .unwrap()
        .with_properties(MathProperties {
            is_linear: false,
            is_convex: true,
            is_twice_differentiable: true,
        });
    assert!(objective.properties().is_convex);
    assert!(!objective.properties().is_linear);

    let problem = Problem::new(
        "props",
        "",
        vec![],
        vec![Variable::new("x", "x", -1.0, 1.0, 0.0).unwrap()],
        vec![objective],
        vec![],
    )
    .unwrap();
    assert!(problem.objective("f").unwrap().properties().is_twice_differentiable);
}

#[test]
fn test_problem_serializes() {
    let problem = tutorial_problem();
    let json = serde_json::to_value(&problem).unwrap();
    assert_eq!(json["name"], "tutorial");
    assert_eq!(json["objectives"][0]["symbol"], "f1");
    assert_eq!(json["constraints"][0]["expression"], "x1 + x2 - 10");
}
