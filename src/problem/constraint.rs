//! Constraint functions in canonical form.

use serde::Serialize;

use crate::expr::{CompileError, Expr};

/// Canonical constraint forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConstraintKind {
    /// `expression <= 0`
    Inequality,
    /// `expression == 0`
    Equality,
}

/// A named, symbol-tagged constraint.
///
/// Constraints are stored in canonical form only: `expr <= 0` or `expr == 0`.
/// A relation written in another orientation, say `a <= b`, must be rewritten
/// by the problem author as `a - b <= 0` before construction; the core does
/// not reorient expressions.
///
/// # Examples
///
/// ```
/// use imopt_rs::Constraint;
///
/// // x1 + x2 <= 10, rewritten into canonical form:
/// let g1 = Constraint::inequality("g1", "g1", "x1 + x2 - 10").unwrap();
/// assert_eq!(g1.symbol(), "g1");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    name: String,
    symbol: String,
    expression: String,
    kind: ConstraintKind,
    #[serde(skip)]
    pub(crate) ast: Expr,
}

impl Constraint {
    /// Create an inequality constraint `expression <= 0`.
    pub fn inequality(name: &str, symbol: &str, expression: &str) -> Result<Self, CompileError> {
        Self::parse(name, symbol, expression, ConstraintKind::Inequality)
    }

    /// Create an equality constraint `expression == 0`.
    pub fn equality(name: &str, symbol: &str, expression: &str) -> Result<Self, CompileError> {
        Self::parse(name, symbol, expression, ConstraintKind::Equality)
    }

    fn parse(
        name: &str,
        symbol: &str,
        expression: &str,
        kind: ConstraintKind,
    ) -> Result<Self, CompileError> {
        let ast = Expr::parse(expression)?;
        Ok(Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            expression: expression.to_string(),
            kind,
            ast,
        })
    }

    /// Build a constraint from an already-composed expression tree.
    pub(crate) fn from_ast(name: &str, symbol: &str, ast: Expr, kind: ConstraintKind) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            expression: ast.to_string(),
            kind,
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

    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// Violation magnitude of an evaluated constraint value: zero when the
    /// canonical relation holds.
    pub fn violation(&self, value: f64) -> f64 {
        match self.kind {
            ConstraintKind::Inequality => value.max(0.0),
            ConstraintKind::Equality => value.abs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation() {
        let g = Constraint::inequality("g", "g", "x").unwrap();
        assert_eq!(g.violation(-2.0), 0.0);
        assert_eq!(g.violation(0.5), 0.5);

        let h = Constraint::equality("h", "h", "x").unwrap();
        assert_eq!(h.violation(-2.0), 2.0);
        assert_eq!(h.violation(0.0), 0.0);
    }
}
