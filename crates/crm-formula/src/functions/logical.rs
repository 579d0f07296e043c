//! Logical functions

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::FormulaValue;

fn arg<'a>(args: &'a [FormulaValue], index: usize, function: &str) -> FormulaResult<&'a FormulaValue> {
    args.get(index).ok_or_else(|| {
        FormulaError::Argument(format!("{} is missing argument {}", function, index + 1))
    })
}

/// IF(condition, trueValue, falseValue)
pub fn fn_if(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let condition = arg(args, 0, "IF")?;
    let if_true = arg(args, 1, "IF")?;
    let if_false = arg(args, 2, "IF")?;

    if condition.is_truthy() {
        Ok(if_true.clone())
    } else {
        Ok(if_false.clone())
    }
}

/// IFGT(value, compare, trueValue, falseValue)
///
/// A falsy `value` (0, NaN, false, empty text) is compared as 0.
pub fn fn_ifgt(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let value = arg(args, 0, "IFGT")?;
    let compare = arg(args, 1, "IFGT")?;
    let if_true = arg(args, 2, "IFGT")?;
    let if_false = arg(args, 3, "IFGT")?;

    let value = if value.is_truthy() {
        value.to_number()
    } else {
        0.0
    };

    if value > compare.to_number() {
        Ok(if_true.clone())
    } else {
        Ok(if_false.clone())
    }
}

/// COALESCE(value, defaultValue)
///
/// Zero counts as missing: a zero commission field falls back to the default.
pub fn fn_coalesce(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let value = arg(args, 0, "COALESCE")?;
    let default = arg(args, 1, "COALESCE")?;

    match value {
        FormulaValue::Number(n) if *n == 0.0 => Ok(default.clone()),
        _ => Ok(value.clone()),
    }
}
