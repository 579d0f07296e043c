//! Text-level scans for the field names a formula mentions
//!
//! Two scans live here and they are intentionally not the same:
//!
//! - [`used_variables`] decides which missing fields get a default binding of
//!   0 before evaluation. It skips the exact (case-sensitive) names of the
//!   registered functions.
//! - [`extract_field_references`] feeds UI metadata ("this formula reads X
//!   and Y"). It skips a short list of reserved words compared in lowercase.
//!
//! Both work on raw text, so identifiers inside string literals or the tail
//! of an exponent (`e5` in `1e5`) are reported too.

use crate::context::is_numeric_literal;
use ahash::AHashSet;
use lazy_regex::regex;

/// Function names skipped when looking for used variables (case-sensitive).
pub const FUNCTION_NAMES: &[&str] = &[
    "IF", "IFGT", "COALESCE", "Abs", "Ceil", "Floor", "Round", "Max", "Min", "Sqrt", "If", "Len",
];

/// Reserved words skipped by [`extract_field_references`] (compared lowercased).
pub const RESERVED_WORDS: &[&str] = &[
    "if", "sum", "count", "avg", "max", "min", "round", "abs", "sqrt", "log",
];

fn identifier_tokens(expression: &str) -> impl Iterator<Item = &str> {
    regex!(r"[a-zA-Z_][a-zA-Z0-9_]*")
        .find_iter(expression)
        .map(|m| m.as_str())
}

/// Identifiers the expression references, as seen by the evaluator.
pub fn used_variables(expression: &str) -> AHashSet<String> {
    identifier_tokens(expression)
        .filter(|token| !FUNCTION_NAMES.contains(token))
        .filter(|token| !is_numeric_literal(token))
        .map(str::to_string)
        .collect()
}

/// Best-effort list of field names referenced by a formula, unique, in
/// first-seen order.
///
/// # Example
/// ```rust
/// use crm_formula::extract_field_references;
///
/// let fields = extract_field_references("IF(amount > 100, fee, 0)");
/// assert_eq!(fields, vec!["amount", "fee"]);
/// ```
pub fn extract_field_references(expression: &str) -> Vec<String> {
    let mut seen = AHashSet::new();
    let mut fields = Vec::new();

    for token in identifier_tokens(expression) {
        if RESERVED_WORDS.contains(&token.to_lowercase().as_str()) || is_numeric_literal(token) {
            continue;
        }
        if seen.insert(token) {
            fields.push(token.to_string());
        }
    }

    fields
}
