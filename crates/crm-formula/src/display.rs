//! Rendering evaluation results for UI cells

use crate::definition::ReturnType;
use crate::engine::EvaluationResult;
use crate::evaluator::{format_number, FormulaValue};
use crate::format::round_fixed;

/// Shown in place of a value when evaluation failed
pub const ERROR_PLACEHOLDER: &str = "—";

/// Render a result as cell text.
///
/// Currency gets a dollar sign, thousands separators and `decimal_places`
/// digits (2 when unset). Numbers get thousands separators, and a fixed
/// number of digits only when `decimal_places` is set.
pub fn display_value(result: &EvaluationResult, decimal_places: Option<u32>) -> String {
    let value = match (&result.error, &result.value) {
        (None, Some(value)) => value,
        _ => return ERROR_PLACEHOLDER.to_string(),
    };

    match (result.return_type, value) {
        (ReturnType::Currency, FormulaValue::Number(n)) if n.is_finite() => {
            let places = decimal_places.unwrap_or(2).min(MAX_DISPLAY_PLACES);
            let text = group_thousands(&fixed(n.abs(), places));
            if *n < 0.0 && round_fixed(*n, places) != 0.0 {
                format!("-${}", text)
            } else {
                format!("${}", text)
            }
        }
        (ReturnType::Number, FormulaValue::Number(n)) if n.is_finite() => {
            let text = match decimal_places {
                Some(places) => fixed(n.abs(), places),
                None => format_number(n.abs()),
            };
            if text.contains('e') {
                return format_number(*n);
            }
            let sign = if *n < 0.0 && text.chars().any(|c| c.is_ascii_digit() && c != '0') {
                "-"
            } else {
                ""
            };
            format!("{}{}", sign, group_thousands(&text))
        }
        (ReturnType::Boolean, FormulaValue::Boolean(b)) => if *b { "Yes" } else { "No" }.to_string(),
        (_, value) => value.to_text(),
    }
}

/// Most digits shown after the decimal point
const MAX_DISPLAY_PLACES: u32 = 20;

fn fixed(n: f64, places: u32) -> String {
    let places = places.min(MAX_DISPLAY_PLACES);
    format!("{:.*}", places as usize, round_fixed(n, places))
}

fn group_thousands(digits: &str) -> String {
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(digits.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(frac) => format!("{}.{}", grouped, frac),
        None => grouped,
    }
}
