//! Objective functions.

use serde::Serialize;

use crate::expr::{CompileError, Expr};

/// Optimization direction of an objective.
///
/// The core always minimizes internally; a `Maximize` objective is negated
/// once when its expression is compiled and un-negated by
/// [`Objective::oriented`] wherever values are exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// Mathematical properties of an objective, stored for downstream method
/// selection. Not enforced or verified by this core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MathProperties {
    pub is_linear: bool,
    pub is_convex: bool,
    pub is_twice_differentiable: bool,
}

/// A named, symbol-tagged scalar objective over the problem's variables and
/// constants.
///
/// # Examples
///
/// ```
/// use imopt_rs::{Objective, Sense};
///
/// let f1 = Objective::new("f1", "f1", "x1^2 - 1.5 * sin(x2)", Sense::Minimize).unwrap();
/// assert_eq!(f1.symbol(), "f1");
///
/// // Malformed expressions fail at construction.
/// assert!(Objective::new("bad", "bad", "x1 +* 2", Sense::Minimize).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Objective {
    name: String,
    symbol: String,
    expression: String,
    sense: Sense,
    properties: MathProperties,
    #[serde(skip)]
    pub(crate) ast: Expr,
}

impl Objective {
    /// Create an objective by parsing its expression text.
    pub fn new(
        name: &str,
        symbol: &str,
        expression: &str,
        sense: Sense,
    ) -> Result<Self, CompileError> {
        let ast = Expr::parse(expression)?;
        Ok(Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            expression: expression.to_string(),
            sense,
            properties: MathProperties::default(),
            ast,
        })
    }

    /// Attach mathematical property flags.
    pub fn with_properties(mut self, properties: MathProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Build an objective from an already-composed expression tree.
    pub(crate) fn from_ast(name: &str, symbol: &str, ast: Expr, sense: Sense) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            expression: ast.to_string(),
            sense,
            properties: MathProperties::default(),
            ast,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn properties(&self) -> MathProperties {
        self.properties
    }

    /// Map a value between internal (minimization) and display orientation.
    ///
    /// For a `Minimize` objective this is the identity; for a `Maximize`
    /// objective it negates. The mapping is its own inverse, so the same
    /// function converts in both directions and is the single place the sign
    /// convention lives.
    pub fn oriented(&self, value: f64) -> f64 {
        match self.sense {
            Sense::Minimize => value,
            Sense::Maximize => -value,
        }
    }

    /// Expression tree in internal (minimization) orientation.
    pub(crate) fn internal_ast(&self) -> Expr {
        match self.sense {
            Sense::Minimize => self.ast.clone(),
            Sense::Maximize => self.ast.clone().neg(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oriented_is_involution() {
        let min = Objective::new("f", "f", "x", Sense::Minimize).unwrap();
        let max = Objective::new("g", "g", "x", Sense::Maximize).unwrap();

        assert_eq!(min.oriented(2.5), 2.5);
        assert_eq!(max.oriented(2.5), -2.5);
        assert_eq!(max.oriented(max.oriented(2.5)), 2.5);
    }

    #[test]
    fn test_internal_ast_negates_maximize() {
        let max = Objective::new("g", "g", "x + 1", Sense::Maximize).unwrap();
        assert_eq!(max.internal_ast().to_string(), "-(x + 1)");
    }
}
