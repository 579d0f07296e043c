//! Public entry points: evaluate and validate formulas

use crate::context::{normalize_context, Record};
use crate::definition::ReturnType;
use crate::error::FormulaResult;
use crate::evaluator::{evaluate, FormulaValue};
use crate::format::format_result;
use crate::parser::parse_formula;
use serde::{Deserialize, Serialize};

/// Outcome of one evaluation. Exactly one of `value` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub value: Option<FormulaValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub return_type: ReturnType,
}

impl EvaluationResult {
    fn success(value: FormulaValue, return_type: ReturnType) -> Self {
        Self {
            value: Some(value),
            error: None,
            return_type,
        }
    }

    fn failure(error: String, return_type: ReturnType) -> Self {
        Self {
            value: None,
            error: Some(error),
            return_type,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a syntax check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Evaluate `expression` against one record and shape the result for
/// `return_type`.
///
/// Never panics and never returns an error directly: parse and evaluation
/// failures are reported through [`EvaluationResult::error`].
///
/// # Example
/// ```rust
/// use crm_formula::{evaluate_formula, FormulaValue, Record, ReturnType};
///
/// let record: Record = [("amount", 450000.0), ("commissionPct", 3.0)].into_iter().collect();
/// let result = evaluate_formula("amount * commissionPct / 100", &record, ReturnType::Currency);
/// assert_eq!(result.value, Some(FormulaValue::Number(13500.0)));
/// ```
pub fn evaluate_formula(
    expression: &str,
    context: &Record,
    return_type: ReturnType,
) -> EvaluationResult {
    match try_evaluate(expression, context) {
        Ok(raw) => EvaluationResult::success(format_result(raw, return_type), return_type),
        Err(err) => {
            tracing::debug!(expression, error = %err, "formula evaluation failed");
            EvaluationResult::failure(err.to_string(), return_type)
        }
    }
}

fn try_evaluate(expression: &str, context: &Record) -> FormulaResult<FormulaValue> {
    let bindings = normalize_context(expression, context);
    let ast = parse_formula(expression)?;
    evaluate(&ast, &bindings)
}

/// Check that `expression` parses. Referenced fields are not resolved.
pub fn validate_formula(expression: &str) -> ValidationResult {
    match parse_formula(expression) {
        Ok(_) => ValidationResult {
            valid: true,
            error: None,
        },
        Err(err) => ValidationResult {
            valid: false,
            error: Some(err.to_string()),
        },
    }
}
