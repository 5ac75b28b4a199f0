//! The immutable multiobjective problem model.
//!
//! A [`Problem`] aggregates constants, decision variables, objectives, and
//! constraints, validates them as a whole at construction, and compiles every
//! expression against the problem's symbol table exactly once. Problems are
//! never mutated: operations that conceptually "update" a problem, such as
//! attaching estimated ideal and nadir points, return a new value.

mod constant;
mod constraint;
mod objective;
mod variable;

pub use constant::Constant;
pub use constraint::{Constraint, ConstraintKind};
pub use objective::{MathProperties, Objective, Sense};
pub use variable::{Variable, VariableKind};

use std::collections::{HashMap, HashSet};

use ndarray::Array1;
use serde::Serialize;
use thiserror::Error;

use crate::error::{ImOptError, Result};
use crate::expr::{CompileError, CompiledExpr, Expr, SymbolTable};

/// Errors raised while constructing or querying a problem.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("duplicate symbol '{symbol}'")]
    DuplicateSymbol { symbol: String },

    #[error(
        "variable '{symbol}' has inconsistent bounds: lower {lower}, initial {initial}, \
         upper {upper}"
    )]
    InvalidBounds {
        symbol: String,
        lower: f64,
        upper: f64,
        initial: f64,
    },

    #[error("expression for '{owner}' references unresolved symbol '{symbol}'")]
    UnresolvedSymbol { owner: String, symbol: String },

    #[error("problem must have at least one {what}")]
    Empty { what: &'static str },

    #[error("{what} is missing an entry for objective '{symbol}'")]
    MissingEntry { what: &'static str, symbol: String },

    #[error("{what} contains unknown objective symbol '{symbol}'")]
    UnknownEntry { what: &'static str, symbol: String },

    #[error("expected {expected} values, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// An immutable multiobjective optimization problem.
///
/// # Examples
///
/// ```
/// use imopt_rs::{Constraint, Objective, Problem, Sense, Variable};
///
/// let problem = Problem::new(
///     "tutorial",
///     "two nonconvex objectives on a box",
///     vec![],
///     vec![
///         Variable::new("x1", "x1", -5.0, 5.0, 0.0).unwrap(),
///         Variable::new("x2", "x2", -5.0, 5.0, 0.0).unwrap(),
///     ],
///     vec![
///         Objective::new("f1", "f1", "x1^2 - 1.5 * sin(x2)", Sense::Minimize).unwrap(),
///         Objective::new("f2", "f2", "x2^2 - cos(3 * x1)", Sense::Minimize).unwrap(),
///     ],
///     vec![Constraint::inequality("g1", "g1", "x1 + x2 - 10").unwrap()],
/// )
/// .unwrap();
///
/// assert_eq!(problem.num_objectives(), 2);
/// assert!(!problem.has_ideal_and_nadir());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    name: String,
    description: String,
    constants: Vec<Constant>,
    variables: Vec<Variable>,
    objectives: Vec<Objective>,
    constraints: Vec<Constraint>,
    /// Ideal point in internal (minimization) orientation, keyed by
    /// objective symbol.
    ideal: Option<HashMap<String, f64>>,
    /// Nadir point in internal (minimization) orientation.
    nadir: Option<HashMap<String, f64>>,
    #[serde(skip)]
    compiled_objectives: Vec<CompiledExpr>,
    #[serde(skip)]
    compiled_constraints: Vec<CompiledExpr>,
}

impl Problem {
    /// Construct and validate a problem.
    ///
    /// Fails when any two entities share a symbol or when an expression
    /// references a symbol that is not a constant or variable of this
    /// problem. Variable bounds were already validated at variable
    /// construction.
    pub fn new(
        name: &str,
        description: &str,
        constants: Vec<Constant>,
        variables: Vec<Variable>,
        objectives: Vec<Objective>,
        constraints: Vec<Constraint>,
    ) -> Result<Self> {
        if variables.is_empty() {
            return Err(ValidationError::Empty { what: "variable" }.into());
        }
        if objectives.is_empty() {
            return Err(ValidationError::Empty { what: "objective" }.into());
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let all_symbols = constants
            .iter()
            .map(Constant::symbol)
            .chain(variables.iter().map(Variable::symbol))
            .chain(objectives.iter().map(Objective::symbol))
            .chain(constraints.iter().map(Constraint::symbol));
        for symbol in all_symbols {
            if !seen.insert(symbol) {
                return Err(ValidationError::DuplicateSymbol {
                    symbol: symbol.to_string(),
                }
                .into());
            }
        }

        let mut table = SymbolTable::new();
        for constant in &constants {
            table.bind_constant(constant.symbol(), constant.value());
        }
        for (slot, variable) in variables.iter().enumerate() {
            table.bind_variable(variable.symbol(), slot);
        }

        let compiled_objectives = objectives
            .iter()
            .map(|o| compile_for(o.symbol(), &o.internal_ast(), &table))
            .collect::<Result<Vec<_>>>()?;
        let compiled_constraints = constraints
            .iter()
            .map(|c| compile_for(c.symbol(), &c.ast, &table))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            constants,
            variables,
            objectives,
            constraints,
            ideal: None,
            nadir: None,
            compiled_objectives,
            compiled_constraints,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn num_objectives(&self) -> usize {
        self.objectives.len()
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Look up an objective by symbol.
    pub fn objective(&self, symbol: &str) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.symbol() == symbol)
    }

    /// Whether both the ideal and nadir points are populated.
    pub fn has_ideal_and_nadir(&self) -> bool {
        self.ideal.is_some() && self.nadir.is_some()
    }

    /// The ideal point in display orientation, if populated.
    pub fn ideal(&self) -> Option<HashMap<String, f64>> {
        self.ideal.as_ref().map(|m| self.to_display(m))
    }

    /// The nadir point in display orientation, if populated.
    pub fn nadir(&self) -> Option<HashMap<String, f64>> {
        self.nadir.as_ref().map(|m| self.to_display(m))
    }

    fn to_display(&self, internal: &HashMap<String, f64>) -> HashMap<String, f64> {
        self.objectives
            .iter()
            .map(|o| (o.symbol().to_string(), o.oriented(internal[o.symbol()])))
            .collect()
    }

    pub(crate) fn ideal_internal(&self) -> Option<&HashMap<String, f64>> {
        self.ideal.as_ref()
    }

    pub(crate) fn nadir_internal(&self) -> Option<&HashMap<String, f64>> {
        self.nadir.as_ref()
    }

    /// Internal ideal and nadir maps, or a prerequisite error naming the
    /// operation that needed them.
    pub(crate) fn require_ideal_and_nadir(
        &self,
        operation: &str,
    ) -> Result<(&HashMap<String, f64>, &HashMap<String, f64>)> {
        match (self.ideal.as_ref(), self.nadir.as_ref()) {
            (Some(ideal), Some(nadir)) => Ok((ideal, nadir)),
            _ => Err(ImOptError::Prerequisite(format!(
                "{} requires a problem with populated ideal and nadir points; \
                 run the payoff-table estimation and attach its result with \
                 with_ideal_and_nadir first",
                operation
            ))),
        }
    }

    /// Pure functional update: returns a new problem carrying the given ideal
    /// and nadir points. Values are supplied in display orientation, one entry
    /// per objective symbol. The receiver is left untouched.
    pub fn with_ideal_and_nadir(
        &self,
        ideal: &HashMap<String, f64>,
        nadir: &HashMap<String, f64>,
    ) -> Result<Problem> {
        self.validate_point(ideal, "ideal point")?;
        self.validate_point(nadir, "nadir point")?;

        let mut updated = self.clone();
        updated.ideal = Some(self.to_internal(ideal));
        updated.nadir = Some(self.to_internal(nadir));
        Ok(updated)
    }

    fn to_internal(&self, display: &HashMap<String, f64>) -> HashMap<String, f64> {
        self.objectives
            .iter()
            .map(|o| (o.symbol().to_string(), o.oriented(display[o.symbol()])))
            .collect()
    }

    /// Check that a symbol-keyed mapping covers exactly this problem's
    /// objective symbols.
    pub(crate) fn validate_point(
        &self,
        point: &HashMap<String, f64>,
        what: &'static str,
    ) -> Result<()> {
        for objective in &self.objectives {
            if !point.contains_key(objective.symbol()) {
                return Err(ValidationError::MissingEntry {
                    what,
                    symbol: objective.symbol().to_string(),
                }
                .into());
            }
        }
        for symbol in point.keys() {
            if self.objective(symbol).is_none() {
                return Err(ValidationError::UnknownEntry {
                    what,
                    symbol: symbol.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Initial decision vector, one entry per variable in declaration order.
    pub fn initial_point(&self) -> Array1<f64> {
        self.variables.iter().map(Variable::initial).collect()
    }

    /// Variable bounds in declaration order.
    pub fn bounds(&self) -> Vec<(f64, f64)> {
        self.variables.iter().map(Variable::bounds).collect()
    }

    /// Objective value in internal (minimization) orientation.
    pub(crate) fn eval_objective_internal(&self, index: usize, x: &[f64]) -> f64 {
        self.compiled_objectives[index].eval(x)
    }

    /// Constraint expression value.
    pub(crate) fn eval_constraint(&self, index: usize, x: &[f64]) -> f64 {
        self.compiled_constraints[index].eval(x)
    }

    /// Largest constraint violation at `x`, zero when feasible.
    pub(crate) fn max_violation(&self, x: &[f64]) -> f64 {
        self.constraints
            .iter()
            .enumerate()
            .map(|(i, c)| c.violation(self.eval_constraint(i, x)))
            .fold(0.0, f64::max)
    }

    /// Objective values at `x`, keyed by symbol, in display orientation.
    pub fn objective_values(&self, x: &[f64]) -> Result<HashMap<String, f64>> {
        self.check_dimension(x)?;
        Ok(self
            .objectives
            .iter()
            .enumerate()
            .map(|(i, o)| {
                (
                    o.symbol().to_string(),
                    o.oriented(self.eval_objective_internal(i, x)),
                )
            })
            .collect())
    }

    /// Constraint expression values at `x`, keyed by symbol.
    pub fn constraint_values(&self, x: &[f64]) -> Result<HashMap<String, f64>> {
        self.check_dimension(x)?;
        Ok(self
            .constraints
            .iter()
            .enumerate()
            .map(|(i, c)| (c.symbol().to_string(), self.eval_constraint(i, x)))
            .collect())
    }

    /// Decision vector entries keyed by variable symbol.
    pub fn variable_values(&self, x: &[f64]) -> Result<HashMap<String, f64>> {
        self.check_dimension(x)?;
        Ok(self
            .variables
            .iter()
            .zip(x)
            .map(|(v, &value)| (v.symbol().to_string(), value))
            .collect())
    }

    fn check_dimension(&self, x: &[f64]) -> Result<()> {
        if x.len() != self.variables.len() {
            return Err(ValidationError::DimensionMismatch {
                expected: self.variables.len(),
                got: x.len(),
            }
            .into());
        }
        Ok(())
    }
}

fn compile_for(owner: &str, ast: &Expr, table: &SymbolTable) -> Result<CompiledExpr> {
    ast.compile(table).map_err(|e| match e {
        CompileError::UnknownSymbol { symbol } => ImOptError::Validation(
            ValidationError::UnresolvedSymbol {
                owner: owner.to_string(),
                symbol,
            },
        ),
        other => ImOptError::Compile(other),
    })
}
