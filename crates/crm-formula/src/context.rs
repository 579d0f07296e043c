//! Record values and their numeric normalization
//!
//! A [`Record`] holds the raw field values of one CRM entity (a transaction,
//! an agent, a listing...). Before evaluation it is flattened into a
//! [`NormalizedContext`] where every binding is an `f64`.

use crate::references::used_variables;
use ahash::AHashMap;
use lazy_regex::regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Numeric bindings handed to the evaluator
pub type NormalizedContext = AHashMap<String, f64>;

/// A raw field value as it arrives from a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Objects and arrays; never bound
    Unsupported(Value),
}

impl FieldValue {
    /// Numeric binding for this value, or `None` when it cannot be bound.
    ///
    /// Null is 0, booleans are 0/1, numbers pass through unchanged (NaN and
    /// infinities included), text uses its leading numeric prefix.
    pub fn coerce(&self) -> Option<f64> {
        match self {
            FieldValue::Null => Some(0.0),
            FieldValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => parse_float(s),
            FieldValue::Unsupported(_) => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => n
                .as_f64()
                .map_or(FieldValue::Unsupported(Value::Number(n)), FieldValue::Number),
            Value::String(s) => FieldValue::Text(s),
            other => FieldValue::Unsupported(other),
        }
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(b),
            FieldValue::Number(n) => {
                serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
            }
            FieldValue::Text(s) => Value::String(s),
            FieldValue::Unsupported(v) => v,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Field name to raw value mapping for one evaluation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: AHashMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl From<serde_json::Map<String, Value>> for Record {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

/// Build the numeric bindings for evaluating `expression` against `record`.
///
/// Names the expression uses but the record lacks are bound to 0 first. Every
/// record field is then coerced with [`FieldValue::coerce`]; fields that do
/// not coerce (non-numeric text, objects, arrays) get no binding at all, so a
/// formula that reads one fails with an undefined-variable error.
pub fn normalize_context(expression: &str, record: &Record) -> NormalizedContext {
    let mut bindings = NormalizedContext::default();

    for name in used_variables(expression) {
        if !record.contains_key(&name) {
            bindings.insert(name, 0.0);
        }
    }

    for (name, value) in record.iter() {
        match value.coerce() {
            Some(n) => {
                bindings.insert(name.to_string(), n);
            }
            None => {
                tracing::debug!(field = name, "dropping non-numeric context value");
            }
        }
    }

    tracing::trace!(bindings = bindings.len(), "normalized context");
    bindings
}

/// Leading-prefix float parse: `"12.5%"` is 12.5, `"  -3e2px"` is -300,
/// `"Infinity"` is infinite, and text with no numeric prefix is `None`.
pub fn parse_float(text: &str) -> Option<f64> {
    let re = regex!(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)");
    let m = re.find(text.trim_start())?;
    let literal = m.as_str();

    match literal.trim_start_matches(|c: char| c == '+' || c == '-') {
        "Infinity" if literal.starts_with('-') => Some(f64::NEG_INFINITY),
        "Infinity" => Some(f64::INFINITY),
        _ => literal.parse().ok(),
    }
}

/// Whether the whole token is a numeric literal
pub(crate) fn is_numeric_literal(token: &str) -> bool {
    let re = regex!(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)$");
    re.is_match(token.trim())
}
