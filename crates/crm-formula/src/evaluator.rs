//! Formula evaluator
//!
//! Evaluates formula ASTs against a normalized (all-numeric) context.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::context::NormalizedContext;
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// Global function registry (lazily initialized, never mutated afterwards)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

fn get_function_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormulaValue {
    Number(f64),
    Boolean(bool),
    Text(String),
}

impl FormulaValue {
    /// Numeric view used by arithmetic: booleans are 0/1, unparsable text is NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            FormulaValue::Number(n) => *n,
            FormulaValue::Boolean(true) => 1.0,
            FormulaValue::Boolean(false) => 0.0,
            FormulaValue::Text(s) => text_to_number(s),
        }
    }

    /// Truthiness: `0`, `NaN`, `false` and `""` are false, everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            FormulaValue::Number(n) => *n != 0.0 && !n.is_nan(),
            FormulaValue::Boolean(b) => *b,
            FormulaValue::Text(s) => !s.is_empty(),
        }
    }

    /// Convert to string
    pub fn to_text(&self) -> String {
        match self {
            FormulaValue::Number(n) => format_number(*n),
            FormulaValue::Boolean(b) => b.to_string(),
            FormulaValue::Text(s) => s.clone(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<f64> for FormulaValue {
    fn from(n: f64) -> Self {
        FormulaValue::Number(n)
    }
}

impl From<bool> for FormulaValue {
    fn from(b: bool) -> Self {
        FormulaValue::Boolean(b)
    }
}

impl From<&str> for FormulaValue {
    fn from(s: &str) -> Self {
        FormulaValue::Text(s.to_string())
    }
}

/// Whole-string numeric conversion: surrounding whitespace is ignored, empty
/// text is 0, and anything else that is not a plain decimal number is NaN.
fn text_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    // Rust accepts "inf"/"nan" spellings that are not numbers here
    if trimmed
        .chars()
        .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
    {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

/// Shortest round-trip rendering of a number, exponent form outside 1e-6..1e21.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{}", n);
    }

    let formatted = format!("{:e}", n);
    match formatted.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => formatted,
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &NormalizedContext) -> FormulaResult<FormulaValue> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(FormulaValue::Number(*n)),
        FormulaExpr::String(s) => Ok(FormulaValue::Text(s.clone())),
        FormulaExpr::Boolean(b) => Ok(FormulaValue::Boolean(*b)),

        // === References ===
        FormulaExpr::Variable(name) => ctx
            .get(name)
            .copied()
            .map(FormulaValue::Number)
            .ok_or_else(|| FormulaError::UndefinedVariable(name.clone())),

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &NormalizedContext,
) -> FormulaResult<FormulaValue> {
    let left_val = evaluate(left, ctx)?;

    // Logical operators short-circuit
    match op {
        BinaryOperator::And => {
            if !left_val.is_truthy() {
                return Ok(FormulaValue::Boolean(false));
            }
            return Ok(FormulaValue::Boolean(evaluate(right, ctx)?.is_truthy()));
        }
        BinaryOperator::Or => {
            if left_val.is_truthy() {
                return Ok(FormulaValue::Boolean(true));
            }
            return Ok(FormulaValue::Boolean(evaluate(right, ctx)?.is_truthy()));
        }
        _ => {}
    }

    let right_val = evaluate(right, ctx)?;

    let result = match op {
        // Text on either side turns + into concatenation
        BinaryOperator::Add => match (&left_val, &right_val) {
            (FormulaValue::Text(_), _) | (_, FormulaValue::Text(_)) => {
                FormulaValue::Text(left_val.to_text() + &right_val.to_text())
            }
            _ => FormulaValue::Number(left_val.to_number() + right_val.to_number()),
        },
        BinaryOperator::Subtract => {
            FormulaValue::Number(left_val.to_number() - right_val.to_number())
        }
        BinaryOperator::Multiply => {
            FormulaValue::Number(left_val.to_number() * right_val.to_number())
        }
        // IEEE semantics: x/0 is ±Infinity or NaN, not an error
        BinaryOperator::Divide => FormulaValue::Number(left_val.to_number() / right_val.to_number()),
        BinaryOperator::Remainder => {
            FormulaValue::Number(left_val.to_number() % right_val.to_number())
        }
        BinaryOperator::Power => {
            FormulaValue::Number(left_val.to_number().powf(right_val.to_number()))
        }

        // Comparison operators
        BinaryOperator::Equal => {
            FormulaValue::Boolean(compare_values(&left_val, &right_val) == Some(Ordering::Equal))
        }
        BinaryOperator::NotEqual => {
            FormulaValue::Boolean(compare_values(&left_val, &right_val) != Some(Ordering::Equal))
        }
        BinaryOperator::LessThan => {
            FormulaValue::Boolean(compare_values(&left_val, &right_val) == Some(Ordering::Less))
        }
        BinaryOperator::LessEqual => FormulaValue::Boolean(matches!(
            compare_values(&left_val, &right_val),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOperator::GreaterThan => FormulaValue::Boolean(
            compare_values(&left_val, &right_val) == Some(Ordering::Greater),
        ),
        BinaryOperator::GreaterEqual => FormulaValue::Boolean(matches!(
            compare_values(&left_val, &right_val),
            Some(Ordering::Greater | Ordering::Equal)
        )),

        BinaryOperator::And | BinaryOperator::Or => unreachable!("handled above"),
    };

    Ok(result)
}

/// Compare two values: text against text is lexical, everything else numeric.
/// `None` when either side is NaN.
fn compare_values(left: &FormulaValue, right: &FormulaValue) -> Option<Ordering> {
    match (left, right) {
        (FormulaValue::Text(l), FormulaValue::Text(r)) => Some(l.cmp(r)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &NormalizedContext,
) -> FormulaResult<FormulaValue> {
    let val = evaluate(operand, ctx)?;

    match op {
        UnaryOperator::Negate => Ok(FormulaValue::Number(-val.to_number())),
        UnaryOperator::Plus => Ok(FormulaValue::Number(val.to_number())),
        UnaryOperator::Not => Ok(FormulaValue::Boolean(!val.is_truthy())),
    }
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &NormalizedContext,
) -> FormulaResult<FormulaValue> {
    let registry = get_function_registry();

    let func = registry
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    // Check argument count
    if args.len() < func.min_args {
        return Err(FormulaError::ArgumentCount {
            function: name.to_string(),
            expected: arity_description(func.min_args, func.max_args),
            actual: args.len(),
        });
    }

    if let Some(max) = func.max_args {
        if args.len() > max {
            return Err(FormulaError::ArgumentCount {
                function: name.to_string(),
                expected: arity_description(func.min_args, func.max_args),
                actual: args.len(),
            });
        }
    }

    // Evaluate arguments
    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate(arg, ctx)?);
    }

    // Call the function
    (func.implementation)(&evaluated_args)
}

fn arity_description(min: usize, max: Option<usize>) -> String {
    match max {
        Some(max) if max == min => format!("{}", min),
        Some(max) => format!("{} to {}", min, max),
        None => format!("at least {}", min),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;

    fn eval_with(formula: &str, vars: &[(&str, f64)]) -> FormulaResult<FormulaValue> {
        let ast = parse_formula(formula)?;
        let ctx: NormalizedContext = vars.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        evaluate(&ast, &ctx)
    }

    fn eval(formula: &str) -> FormulaResult<FormulaValue> {
        eval_with(formula, &[])
    }

    fn num(formula: &str) -> f64 {
        match eval(formula).unwrap() {
            FormulaValue::Number(n) => n,
            other => panic!("{} evaluated to {:?}", formula, other),
        }
    }

    #[test]
    fn test_evaluate_number() {
        assert_eq!(eval("42").unwrap(), FormulaValue::Number(42.0));
        assert_eq!(eval("3.14").unwrap(), FormulaValue::Number(3.14));
    }

    #[test]
    fn test_evaluate_string() {
        assert_eq!(eval("\"Hello\"").unwrap(), FormulaValue::Text("Hello".into()));
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(num("1+2"), 3.0);
        assert_eq!(num("10-3"), 7.0);
        assert_eq!(num("4*5"), 20.0);
        assert_eq!(num("20/4"), 5.0);
        assert_eq!(num("2^10"), 1024.0);
        assert_eq!(num("7 % 3"), 1.0);
        assert_eq!(num("-7 % 3"), -1.0);
    }

    #[test]
    fn test_evaluate_precedence() {
        assert_eq!(num("1+2*3"), 7.0);
        assert_eq!(num("(1+2)*3"), 9.0);
        assert_eq!(num("2+3*4-5"), 9.0);
        assert_eq!(num("-2^2"), -4.0);
        assert_eq!(num("2^-1"), 0.5);
        assert_eq!(num("2^3^2"), 512.0);
    }

    #[test]
    fn test_evaluate_unary() {
        assert_eq!(num("-5"), -5.0);
        assert_eq!(num("--5"), 5.0);
        assert_eq!(num("+true"), 1.0);
        assert_eq!(eval("!0").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("!3").unwrap(), FormulaValue::Boolean(false));
    }

    #[test]
    fn test_division_by_zero_is_not_an_error() {
        assert_eq!(num("1/0"), f64::INFINITY);
        assert_eq!(num("-1/0"), f64::NEG_INFINITY);
        assert!(num("0/0").is_nan());
    }

    #[test]
    fn test_evaluate_comparison() {
        assert_eq!(eval("1<2").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("1>2").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("5==5").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("5!=5").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("5>=5").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("4<=3").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("\"b\" > \"a\"").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("\"10\" == 10").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("0/0 == 0/0").unwrap(), FormulaValue::Boolean(false));
    }

    #[test]
    fn test_evaluate_logical() {
        assert_eq!(eval("1 && 0").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("1 || 0").unwrap(), FormulaValue::Boolean(true));
        // Right side is never evaluated, so the unbound name is harmless
        assert_eq!(eval("0 && missing").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("1 || missing").unwrap(), FormulaValue::Boolean(true));
        assert!(eval("1 && missing").is_err());
    }

    #[test]
    fn test_evaluate_concatenation() {
        assert_eq!(
            eval("\"Deal \" + 42").unwrap(),
            FormulaValue::Text("Deal 42".into())
        );
        assert_eq!(num("\"3\" * 2"), 6.0);
        assert!(num("\"abc\" * 2").is_nan());
    }

    #[test]
    fn test_evaluate_variables() {
        let result = eval_with(
            "amount * commissionPct / 100",
            &[("amount", 450000.0), ("commissionPct", 3.0)],
        )
        .unwrap();
        assert_eq!(result, FormulaValue::Number(13500.0));
    }

    #[test]
    fn test_unbound_variable_is_an_error() {
        assert_eq!(
            eval("price + 1").unwrap_err(),
            FormulaError::UndefinedVariable("price".into())
        );
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(
            eval("VLOOKUP(1)").unwrap_err(),
            FormulaError::UnknownFunction("VLOOKUP".into())
        );
    }

    #[test]
    fn test_argument_count() {
        match eval("IF(1, 2)").unwrap_err() {
            FormulaError::ArgumentCount {
                function,
                expected,
                actual,
            } => {
                assert_eq!(function, "IF");
                assert_eq!(expected, "3");
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(matches!(
            eval("Max()").unwrap_err(),
            FormulaError::ArgumentCount { .. }
        ));
    }

    #[test]
    fn test_evaluate_nested_functions() {
        let result = eval_with(
            "IF(amount > 100000, Round(amount * 0.025, 2), COALESCE(flatFee, 500))",
            &[("amount", 80000.0), ("flatFee", 0.0)],
        )
        .unwrap();
        assert_eq!(result, FormulaValue::Number(500.0));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(13500.5), "13500.5");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_truthiness() {
        assert!(!FormulaValue::Number(0.0).is_truthy());
        assert!(!FormulaValue::Number(f64::NAN).is_truthy());
        assert!(!FormulaValue::Text(String::new()).is_truthy());
        assert!(FormulaValue::Text("0".into()).is_truthy());
        assert!(FormulaValue::Number(-1.0).is_truthy());
    }

    #[test]
    fn test_text_to_number() {
        assert_eq!(text_to_number(" 12.5 "), 12.5);
        assert_eq!(text_to_number(""), 0.0);
        assert_eq!(text_to_number("-Infinity"), f64::NEG_INFINITY);
        assert!(text_to_number("12abc").is_nan());
        assert!(text_to_number("inf").is_nan());
        assert_eq!(text_to_number("1e3"), 1000.0);
    }
}
