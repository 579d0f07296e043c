//! Math functions

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::FormulaValue;

fn number_arg(args: &[FormulaValue], function: &str) -> FormulaResult<f64> {
    args.first()
        .map(FormulaValue::to_number)
        .ok_or_else(|| FormulaError::Argument(format!("{} requires 1 argument", function)))
}

/// ABS function
pub fn fn_abs(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(number_arg(args, "ABS")?.abs()))
}

/// CEIL function
pub fn fn_ceil(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(number_arg(args, "CEIL")?.ceil()))
}

/// FLOOR function
pub fn fn_floor(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(number_arg(args, "FLOOR")?.floor()))
}

/// ROUND(number, [num_digits]) - Rounds a number to a specified number of digits
/// Uses "round half away from zero" mode
pub fn fn_round(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let number = number_arg(args, "ROUND")?;
    let num_digits = args
        .get(1)
        .map_or(0, |v| v.to_number().trunc() as i32)
        .clamp(-308, 308);

    if !number.is_finite() {
        return Ok(FormulaValue::Number(number));
    }

    // For negative digits, we round to the left of the decimal point
    let multiplier = 10_f64.powi(num_digits);

    // Past 2^52 every f64 is an integer, so the value is already rounded
    if (number * multiplier).abs() >= 4_503_599_627_370_496.0 {
        return Ok(FormulaValue::Number(number));
    }
    if multiplier == 0.0 {
        return Ok(FormulaValue::Number(0.0));
    }

    let result = if number >= 0.0 {
        (number * multiplier + 0.5).floor() / multiplier
    } else {
        (number * multiplier - 0.5).ceil() / multiplier
    };

    Ok(FormulaValue::Number(result))
}

/// MAX function; NaN anywhere makes the result NaN
pub fn fn_max(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(fold_numbers(args, f64::NEG_INFINITY, f64::max)))
}

/// MIN function; NaN anywhere makes the result NaN
pub fn fn_min(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(fold_numbers(args, f64::INFINITY, f64::min)))
}

fn fold_numbers(args: &[FormulaValue], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    let mut acc = init;
    for n in args.iter().map(FormulaValue::to_number) {
        if n.is_nan() {
            return f64::NAN;
        }
        acc = pick(acc, n);
    }
    acc
}

/// SQRT function; negative input yields NaN
pub fn fn_sqrt(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(number_arg(args, "SQRT")?.sqrt()))
}

/// LEN function - character count of the argument's text form
pub fn fn_len(args: &[FormulaValue]) -> FormulaResult<FormulaValue> {
    let value = args
        .first()
        .ok_or_else(|| FormulaError::Argument("LEN requires 1 argument".into()))?;
    Ok(FormulaValue::Number(value.to_text().chars().count() as f64))
}
