//! Return-type shaping of raw evaluation results

use crate::context::parse_float;
use crate::definition::ReturnType;
use crate::evaluator::FormulaValue;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Shape a raw result according to the declared return type.
///
/// - `currency`: numbers rounded to cents, anything else unchanged
/// - `number`: numbers unchanged, anything else parsed from its text form (0 on failure)
/// - `boolean`: truthiness
/// - `text`: string form
/// - `date`: unchanged
pub fn format_result(value: FormulaValue, return_type: ReturnType) -> FormulaValue {
    match return_type {
        ReturnType::Currency => match value {
            FormulaValue::Number(n) => FormulaValue::Number(round_currency(n)),
            other => other,
        },
        ReturnType::Number => match value {
            FormulaValue::Number(n) => FormulaValue::Number(n),
            other => FormulaValue::Number(parse_float(&other.to_text()).unwrap_or(0.0)),
        },
        ReturnType::Boolean => FormulaValue::Boolean(value.is_truthy()),
        ReturnType::Text => FormulaValue::Text(value.to_text()),
        ReturnType::Date => value,
    }
}

/// Round to two decimal places the way a fixed-point `toFixed(2)` does: the
/// exact binary value decides, and true midpoints round away from zero. So
/// `0.125` becomes `0.13` and `10.005` (really `10.00500...`) becomes `10.01`,
/// but `1.005` (really `1.00499...`) becomes `1.0`.
pub fn round_currency(n: f64) -> f64 {
    round_fixed(n, 2)
}

pub(crate) fn round_fixed(n: f64, places: u32) -> f64 {
    if !n.is_finite() {
        return n;
    }
    let rounded = Decimal::from_f64_retain(n)
        .or_else(|| Decimal::from_f64(n))
        .map(|d| d.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64());

    match rounded {
        Some(r) if r == 0.0 => 0.0,
        Some(r) => r,
        // Beyond Decimal's range every f64 is already an integer
        None => n,
    }
}
