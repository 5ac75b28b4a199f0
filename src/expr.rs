//! Symbolic expressions over problem symbols.
//!
//! Objective and constraint bodies are written as plain text ("x1^2 - 1.5 *
//! sin(x2)"), parsed once into an [`Expr`] tree, and compiled against the
//! owning problem's symbol table into a [`CompiledExpr`]. Compilation resolves
//! every variable symbol to a slot index in the decision vector and folds
//! constant symbols into literals, so evaluation is a direct walk over
//! `&[f64]` with no name lookups.

use std::collections::HashMap;
use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{map, recognize},
    multi::{many0, separated_list1},
    number::complete::double,
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};
use serde::Serialize;
use thiserror::Error;

/// Error raised while parsing or compiling an expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("failed to parse expression: {message}")]
    Parse { message: String },

    #[error("unknown symbol '{symbol}'")]
    UnknownSymbol { symbol: String },

    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("{name}() expects {expected} argument(s), got {got}")]
    WrongArity {
        name: String,
        expected: &'static str,
        got: usize,
    },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Expression AST as written by the problem author.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// Literal number.
    Number(f64),

    /// Reference to a variable or constant symbol.
    Symbol(String),

    /// Negation.
    Neg(Box<Expr>),

    /// Binary operation.
    Binary(BinOp, Box<Expr>, Box<Expr>),

    /// Function call by name; resolved during compilation.
    Call(String, Vec<Expr>),
}

impl Expr {
    /// Parse an expression from text.
    pub fn parse(input: &str) -> Result<Self, CompileError> {
        match expr_parser(input.trim()) {
            Ok((remainder, expr)) => {
                if remainder.trim().is_empty() {
                    Ok(expr)
                } else {
                    Err(CompileError::Parse {
                        message: format!("unexpected trailing characters: '{}'", remainder.trim()),
                    })
                }
            }
            Err(e) => Err(CompileError::Parse {
                message: format!("{:?}", e),
            }),
        }
    }

    pub fn number(value: f64) -> Self {
        Expr::Number(value)
    }

    pub fn symbol(symbol: impl Into<String>) -> Self {
        Expr::Symbol(symbol.into())
    }

    pub fn neg(self) -> Self {
        Expr::Neg(Box::new(self))
    }

    pub fn add(self, rhs: Self) -> Self {
        Expr::Binary(BinOp::Add, Box::new(self), Box::new(rhs))
    }

    pub fn sub(self, rhs: Self) -> Self {
        Expr::Binary(BinOp::Sub, Box::new(self), Box::new(rhs))
    }

    pub fn mul(self, rhs: Self) -> Self {
        Expr::Binary(BinOp::Mul, Box::new(self), Box::new(rhs))
    }

    /// All symbols referenced by the expression, sorted and deduplicated.
    pub fn symbols(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out.sort();
        out.dedup();
        out
    }

    fn collect_symbols(&self, out: &mut Vec<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Symbol(name) => out.push(name.clone()),
            Expr::Neg(inner) => inner.collect_symbols(out),
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_symbols(out);
                rhs.collect_symbols(out);
            }
            Expr::Call(_, args) => {
                for arg in args {
                    arg.collect_symbols(out);
                }
            }
        }
    }

    /// Compile against a symbol table, binding variables to decision-vector
    /// slots and folding constants into literals.
    pub fn compile(&self, table: &SymbolTable) -> Result<CompiledExpr, CompileError> {
        match self {
            Expr::Number(v) => Ok(CompiledExpr::Const(*v)),

            Expr::Symbol(name) => {
                if let Some(&value) = table.constants.get(name) {
                    Ok(CompiledExpr::Const(value))
                } else if let Some(&slot) = table.variables.get(name) {
                    Ok(CompiledExpr::Slot(slot))
                } else {
                    Err(CompileError::UnknownSymbol {
                        symbol: name.clone(),
                    })
                }
            }

            Expr::Neg(inner) => {
                let inner = inner.compile(table)?;
                Ok(match inner {
                    CompiledExpr::Const(v) => CompiledExpr::Const(-v),
                    other => CompiledExpr::Neg(Box::new(other)),
                })
            }

            Expr::Binary(op, lhs, rhs) => {
                let lhs = lhs.compile(table)?;
                let rhs = rhs.compile(table)?;
                Ok(match (&lhs, &rhs) {
                    (CompiledExpr::Const(a), CompiledExpr::Const(b)) => {
                        CompiledExpr::Const(apply_bin(*op, *a, *b))
                    }
                    _ => CompiledExpr::Binary(*op, Box::new(lhs), Box::new(rhs)),
                })
            }

            Expr::Call(name, args) => compile_call(name, args, table),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_prec(f, 0)
    }
}

impl Expr {
    // parent encodes the minimum precedence that may appear unparenthesized.
    fn write_prec(&self, f: &mut fmt::Formatter<'_>, parent: u8) -> fmt::Result {
        match self {
            Expr::Number(v) => {
                if *v < 0.0 && parent > 0 {
                    write!(f, "({})", v)
                } else {
                    write!(f, "{}", v)
                }
            }
            Expr::Symbol(name) => write!(f, "{}", name),
            Expr::Neg(inner) => {
                if parent > 3 {
                    write!(f, "(-")?;
                    inner.write_prec(f, 3)?;
                    write!(f, ")")
                } else {
                    write!(f, "-")?;
                    inner.write_prec(f, 3)
                }
            }
            Expr::Binary(op, lhs, rhs) => {
                let (prec, lhs_min, rhs_min, sym) = match op {
                    BinOp::Add => (1, 1, 2, " + "),
                    BinOp::Sub => (1, 1, 2, " - "),
                    BinOp::Mul => (2, 2, 3, " * "),
                    BinOp::Div => (2, 2, 3, " / "),
                    BinOp::Pow => (4, 5, 4, "^"),
                };
                let parens = prec < parent;
                if parens {
                    write!(f, "(")?;
                }
                lhs.write_prec(f, lhs_min)?;
                write!(f, "{}", sym)?;
                rhs.write_prec(f, rhs_min)?;
                if parens {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Expr::Call(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    arg.write_prec(f, 0)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Symbol table an expression is compiled against: variable symbols bound to
/// decision-vector slots, constant symbols bound to their values.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    variables: HashMap<String, usize>,
    constants: HashMap<String, f64>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_variable(&mut self, symbol: &str, slot: usize) {
        self.variables.insert(symbol.to_string(), slot);
    }

    pub fn bind_constant(&mut self, symbol: &str, value: f64) {
        self.constants.insert(symbol.to_string(), value);
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.variables.contains_key(symbol) || self.constants.contains_key(symbol)
    }
}

/// Unary numeric functions available in expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func1 {
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Log10,
    Sqrt,
    Abs,
}

impl Func1 {
    fn resolve(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Func1::Sin),
            "cos" => Some(Func1::Cos),
            "tan" => Some(Func1::Tan),
            "exp" => Some(Func1::Exp),
            "log" | "ln" => Some(Func1::Ln),
            "log10" => Some(Func1::Log10),
            "sqrt" => Some(Func1::Sqrt),
            "abs" => Some(Func1::Abs),
            _ => None,
        }
    }

    fn apply(self, v: f64) -> f64 {
        match self {
            Func1::Sin => v.sin(),
            Func1::Cos => v.cos(),
            Func1::Tan => v.tan(),
            Func1::Exp => v.exp(),
            Func1::Ln => v.ln(),
            Func1::Log10 => v.log10(),
            Func1::Sqrt => v.sqrt(),
            Func1::Abs => v.abs(),
        }
    }
}

/// An expression with every symbol resolved: variables are slot indices into
/// the decision vector, constants are literals.
///
/// Evaluation is infallible. Division by zero and domain errors follow IEEE
/// semantics; optimizers treat non-finite results as rejected points.
#[derive(Debug, Clone)]
pub enum CompiledExpr {
    Const(f64),
    Slot(usize),
    Neg(Box<CompiledExpr>),
    Binary(BinOp, Box<CompiledExpr>, Box<CompiledExpr>),
    Call1(Func1, Box<CompiledExpr>),
    Min(Vec<CompiledExpr>),
    Max(Vec<CompiledExpr>),
}

impl CompiledExpr {
    /// Evaluate at the given decision vector.
    pub fn eval(&self, x: &[f64]) -> f64 {
        match self {
            CompiledExpr::Const(v) => *v,
            CompiledExpr::Slot(i) => x[*i],
            CompiledExpr::Neg(inner) => -inner.eval(x),
            CompiledExpr::Binary(op, lhs, rhs) => apply_bin(*op, lhs.eval(x), rhs.eval(x)),
            CompiledExpr::Call1(func, arg) => func.apply(arg.eval(x)),
            CompiledExpr::Min(args) => args.iter().map(|a| a.eval(x)).fold(f64::INFINITY, f64::min),
            CompiledExpr::Max(args) => args
                .iter()
                .map(|a| a.eval(x))
                .fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

fn apply_bin(op: BinOp, lhs: f64, rhs: f64) -> f64 {
    match op {
        BinOp::Add => lhs + rhs,
        BinOp::Sub => lhs - rhs,
        BinOp::Mul => lhs * rhs,
        BinOp::Div => lhs / rhs,
        BinOp::Pow => lhs.powf(rhs),
    }
}

fn compile_call(
    name: &str,
    args: &[Expr],
    table: &SymbolTable,
) -> Result<CompiledExpr, CompileError> {
    if let Some(func) = Func1::resolve(name) {
        if args.len() != 1 {
            return Err(CompileError::WrongArity {
                name: name.to_string(),
                expected: "1",
                got: args.len(),
            });
        }
        let arg = args[0].compile(table)?;
        return Ok(match arg {
            CompiledExpr::Const(v) => CompiledExpr::Const(func.apply(v)),
            other => CompiledExpr::Call1(func, Box::new(other)),
        });
    }

    match name {
        "min" | "max" => {
            if args.len() < 2 {
                return Err(CompileError::WrongArity {
                    name: name.to_string(),
                    expected: "at least 2",
                    got: args.len(),
                });
            }
            let compiled = args
                .iter()
                .map(|a| a.compile(table))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(if name == "min" {
                CompiledExpr::Min(compiled)
            } else {
                CompiledExpr::Max(compiled)
            })
        }
        _ => Err(CompileError::UnknownFunction {
            name: name.to_string(),
        }),
    }
}

// Parser functions using nom

/// Parse an identifier (symbol or function name)
fn identifier(input: &str) -> IResult<&str, String> {
    let (input, matched) = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)?;
    Ok((input, matched.to_string()))
}

fn number(input: &str) -> IResult<&str, Expr> {
    map(double, Expr::Number).parse(input)
}

fn symbol_ref(input: &str) -> IResult<&str, Expr> {
    let (input, name) = identifier(input)?;
    Ok((input, Expr::Symbol(name)))
}

fn function_call(input: &str) -> IResult<&str, Expr> {
    let (input, name) = identifier(input)?;
    let (input, _) = preceded(multispace0, char('(')).parse(input)?;
    let (input, _) = multispace0.parse(input)?;

    // Empty argument list
    if let Ok((input, _)) = char::<&str, nom::error::Error<&str>>(')').parse(input) {
        return Ok((input, Expr::Call(name, Vec::new())));
    }

    let (input, args) =
        separated_list1(delimited(multispace0, char(','), multispace0), expr_parser)
            .parse(input)?;
    let (input, _) = preceded(multispace0, char(')')).parse(input)?;
    Ok((input, Expr::Call(name, args)))
}

fn parens(input: &str) -> IResult<&str, Expr> {
    delimited(
        pair(char('('), multispace0),
        expr_parser,
        pair(multispace0, char(')')),
    )
    .parse(input)
}

/// Primary expression: number, function call, symbol, or parenthesized group.
/// A call is tried before a bare symbol so "sin(x)" does not parse as the
/// symbol "sin" with trailing input.
fn primary(input: &str) -> IResult<&str, Expr> {
    if let Ok(result) = number(input) {
        return Ok(result);
    }
    if let Ok(result) = function_call(input) {
        return Ok(result);
    }
    if let Ok(result) = symbol_ref(input) {
        return Ok(result);
    }
    parens(input)
}

fn unary(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0.parse(input)?;
    match preceded(pair(char('-'), multispace0), unary).parse(input) {
        Ok((remaining, inner)) => Ok((remaining, Expr::Neg(Box::new(inner)))),
        Err(_) => primary(input),
    }
}

/// Power is right-associative: 2^3^2 parses as 2^(3^2).
fn power(input: &str) -> IResult<&str, Expr> {
    let (input, base) = unary(input)?;
    match preceded(delimited(multispace0, char('^'), multispace0), power).parse(input) {
        Ok((remaining, exponent)) => Ok((
            remaining,
            Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)),
        )),
        Err(_) => Ok((input, base)),
    }
}

/// Multiplicative level, left-associative.
fn term(input: &str) -> IResult<&str, Expr> {
    let (input, first) = power(input)?;
    let (input, rest) = many0(pair(
        delimited(multispace0, alt((char('*'), char('/'))), multispace0),
        power,
    ))
    .parse(input)?;
    Ok((input, fold_binary_chain(first, rest, BinOp::Mul, BinOp::Div, '*')))
}

/// Additive level, left-associative.
fn expr_parser(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0.parse(input)?;
    let (input, first) = term(input)?;
    let (input, rest) = many0(pair(
        delimited(multispace0, alt((char('+'), char('-'))), multispace0),
        term,
    ))
    .parse(input)?;
    Ok((input, fold_binary_chain(first, rest, BinOp::Add, BinOp::Sub, '+')))
}

fn fold_binary_chain(
    first: Expr,
    rest: Vec<(char, Expr)>,
    primary_op: BinOp,
    secondary_op: BinOp,
    primary_char: char,
) -> Expr {
    rest.into_iter().fold(first, |lhs, (op_char, rhs)| {
        let op = if op_char == primary_char {
            primary_op
        } else {
            secondary_op
        };
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn eval_str(input: &str, table: &SymbolTable, x: &[f64]) -> f64 {
        Expr::parse(input).unwrap().compile(table).unwrap().eval(x)
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(Expr::parse("42").unwrap(), Expr::Number(42.0));
        assert_eq!(Expr::parse("3.14").unwrap(), Expr::Number(3.14));
        assert_eq!(Expr::parse("1e-6").unwrap(), Expr::Number(1e-6));
    }

    #[test]
    fn test_left_associative_subtraction() {
        let table = SymbolTable::new();
        assert_relative_eq!(eval_str("1 - 2 - 3", &table, &[]), -4.0);
        assert_relative_eq!(eval_str("12 / 2 / 3", &table, &[]), 2.0);
    }

    #[test]
    fn test_right_associative_power() {
        let table = SymbolTable::new();
        assert_relative_eq!(eval_str("2 ^ 3 ^ 2", &table, &[]), 512.0);
    }

    #[test]
    fn test_compile_binds_slots() {
        let mut table = SymbolTable::new();
        table.bind_variable("x1", 0);
        table.bind_variable("x2", 1);

        let compiled = Expr::parse("x1^2 - 1.5 * sin(x2)")
            .unwrap()
            .compile(&table)
            .unwrap();
        assert_relative_eq!(compiled.eval(&[2.0, 0.0]), 4.0);
        assert_relative_eq!(
            compiled.eval(&[0.0, std::f64::consts::FRAC_PI_2]),
            -1.5,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_constants_fold() {
        let mut table = SymbolTable::new();
        table.bind_constant("c", 3.0);

        let compiled = Expr::parse("2 * c + 1").unwrap().compile(&table).unwrap();
        match compiled {
            CompiledExpr::Const(v) => assert_relative_eq!(v, 7.0),
            other => panic!("expected folded constant, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_symbol() {
        let table = SymbolTable::new();
        let err = Expr::parse("x + 1").unwrap().compile(&table).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownSymbol {
                symbol: "x".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_function_and_arity() {
        let table = SymbolTable::new();
        let err = Expr::parse("sinh(1)").unwrap().compile(&table).unwrap_err();
        assert!(matches!(err, CompileError::UnknownFunction { .. }));

        let err = Expr::parse("sin(1, 2)").unwrap().compile(&table).unwrap_err();
        assert!(matches!(err, CompileError::WrongArity { got: 2, .. }));

        let err = Expr::parse("min(1)").unwrap().compile(&table).unwrap_err();
        assert!(matches!(err, CompileError::WrongArity { got: 1, .. }));
    }

    #[test]
    fn test_min_max() {
        let mut table = SymbolTable::new();
        table.bind_variable("x", 0);
        assert_relative_eq!(eval_str("max(x, 0, -2)", &table, &[-1.0]), 0.0);
        assert_relative_eq!(eval_str("min(x, 0)", &table, &[-1.0]), -1.0);
    }

    #[test]
    fn test_symbols() {
        let expr = Expr::parse("sin(x) + cos(y) * x").unwrap();
        assert_eq!(expr.symbols(), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_display_round_trip() {
        let mut table = SymbolTable::new();
        table.bind_variable("x1", 0);
        table.bind_variable("x2", 1);

        for input in [
            "x1^2 - 1.5 * sin(x2)",
            "(x1 + x2) * (x1 - x2)",
            "x1 - (x2 - 1)",
            "-x1^2 + 2 / (x2 + 4)",
            "0.5 * (x1 - (-0.75)) - x2",
        ] {
            let parsed = Expr::parse(input).unwrap();
            let printed = parsed.to_string();
            let reparsed = Expr::parse(&printed).unwrap();
            assert_eq!(printed, reparsed.to_string(), "for input {:?}", input);

            let a = parsed.compile(&table).unwrap();
            let b = reparsed.compile(&table).unwrap();
            let x = [0.3, -1.7];
            assert_relative_eq!(a.eval(&x), b.eval(&x), epsilon = 1e-12);
        }
    }
}
