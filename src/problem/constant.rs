//! Named constants usable in objective and constraint expressions.

use serde::Serialize;

/// A named, symbol-tagged scalar value.
///
/// Constants are folded into compiled expressions at problem construction
/// and never change afterwards.
///
/// # Examples
///
/// ```
/// use imopt_rs::Constant;
///
/// let g = Constant::new("gravity", "g", 9.81);
/// assert_eq!(g.symbol(), "g");
/// assert_eq!(g.value(), 9.81);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constant {
    name: String,
    symbol: String,
    value: f64,
}

impl Constant {
    /// Create a new constant.
    ///
    /// # Arguments
    ///
    /// * `name` - Display name
    /// * `symbol` - Identifier used in expressions, unique within a problem
    /// * `value` - The constant's value
    pub fn new(name: &str, symbol: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}
