//! Decision variables.

use serde::Serialize;

use super::ValidationError;

/// The kind of a decision variable.
///
/// The kind is stored for downstream method selection; the core itself does
/// not enforce integrality, that is the consumed optimizer's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VariableKind {
    Real,
    Integer,
    Binary,
}

/// A named, symbol-tagged decision variable with bounds and an initial value.
///
/// # Examples
///
/// ```
/// use imopt_rs::Variable;
///
/// let x = Variable::new("x1", "x1", -5.0, 5.0, 0.0).unwrap();
/// assert_eq!(x.bounds(), (-5.0, 5.0));
/// assert_eq!(x.initial(), 0.0);
///
/// // Inconsistent bounds fail at construction.
/// assert!(Variable::new("x2", "x2", 1.0, -1.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    name: String,
    symbol: String,
    kind: VariableKind,
    lower: f64,
    upper: f64,
    initial: f64,
}

impl Variable {
    /// Create a real-valued variable.
    ///
    /// Fails unless `lower <= initial <= upper` and all three values are
    /// finite.
    pub fn new(
        name: &str,
        symbol: &str,
        lower: f64,
        upper: f64,
        initial: f64,
    ) -> Result<Self, ValidationError> {
        Self::with_kind(name, symbol, VariableKind::Real, lower, upper, initial)
    }

    /// Create a variable of the given kind.
    pub fn with_kind(
        name: &str,
        symbol: &str,
        kind: VariableKind,
        lower: f64,
        upper: f64,
        initial: f64,
    ) -> Result<Self, ValidationError> {
        let ordered = lower <= initial && initial <= upper;
        if !ordered || !lower.is_finite() || !upper.is_finite() || !initial.is_finite() {
            return Err(ValidationError::InvalidBounds {
                symbol: symbol.to_string(),
                lower,
                upper,
                initial,
            });
        }

        Ok(Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            kind,
            lower,
            upper,
            initial,
        })
    }

    /// Create a binary variable with the canonical `[0, 1]` bounds.
    pub fn binary(name: &str, symbol: &str, initial: f64) -> Result<Self, ValidationError> {
        Self::with_kind(name, symbol, VariableKind::Binary, 0.0, 1.0, initial)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    pub fn initial(&self) -> f64 {
        self.initial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_validation() {
        assert!(Variable::new("x", "x", 0.0, 1.0, 0.5).is_ok());
        assert!(Variable::new("x", "x", 0.0, 1.0, 2.0).is_err());
        assert!(Variable::new("x", "x", 0.0, 1.0, f64::NAN).is_err());
        assert!(Variable::new("x", "x", f64::NEG_INFINITY, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_binary_bounds() {
        let b = Variable::binary("choice", "b", 1.0).unwrap();
        assert_eq!(b.kind(), VariableKind::Binary);
        assert_eq!(b.bounds(), (0.0, 1.0));
        assert!(Variable::binary("choice", "b", 2.0).is_err());
    }
}
