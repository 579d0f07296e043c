//! Formula definitions as persisted by the CRM

use crate::error::FormulaError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Declared output shape of a formula
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReturnType {
    Currency,
    #[default]
    Number,
    Boolean,
    Text,
    Date,
}

impl ReturnType {
    pub const ALL: [ReturnType; 5] = [
        ReturnType::Currency,
        ReturnType::Number,
        ReturnType::Boolean,
        ReturnType::Text,
        ReturnType::Date,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnType::Currency => "currency",
            ReturnType::Number => "number",
            ReturnType::Boolean => "boolean",
            ReturnType::Text => "text",
            ReturnType::Date => "date",
        }
    }

    /// Parse a return type name, falling back to `number` for anything unknown.
    pub fn lenient(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

impl FromStr for ReturnType {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ReturnType::ALL
            .into_iter()
            .find(|rt| rt.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| FormulaError::Argument(format!("Unknown return type: {}", s)))
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ReturnType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ReturnType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = Option::<String>::deserialize(deserializer)?;
        Ok(name.as_deref().map(ReturnType::lenient).unwrap_or_default())
    }
}

/// A user-authored formula for one field of one entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaDefinition {
    /// Entity the formula targets (`transaction`, `agent`, `listing`, `commissionPayment`)
    pub entity: String,
    /// Field the formula computes
    pub field: String,
    pub expression: String,
    #[serde(default)]
    pub return_type: ReturnType,
    /// Display hint for currency and number results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u32>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_active() -> bool {
    true
}

impl FormulaDefinition {
    pub fn new(
        entity: impl Into<String>,
        field: impl Into<String>,
        expression: impl Into<String>,
        return_type: ReturnType,
    ) -> Self {
        Self {
            entity: entity.into(),
            field: field.into(),
            expression: expression.into(),
            return_type,
            decimal_places: None,
            active: true,
            description: None,
        }
    }

    /// `entity.field`, used in reports
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.entity, self.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_return_type_parsing() {
        assert_eq!("currency".parse::<ReturnType>().unwrap(), ReturnType::Currency);
        assert_eq!("Boolean".parse::<ReturnType>().unwrap(), ReturnType::Boolean);
        assert!("percent".parse::<ReturnType>().is_err());
        assert_eq!(ReturnType::lenient("percent"), ReturnType::Number);
        assert_eq!(ReturnType::lenient(" date "), ReturnType::Date);
        assert_eq!(ReturnType::default(), ReturnType::Number);
    }

    #[test]
    fn test_definition_from_json() {
        let defs: Vec<FormulaDefinition> = serde_json::from_str(
            r#"[
                {"entity": "transaction", "field": "grossCommission",
                 "expression": "amount * commissionPct / 100",
                 "returnType": "currency", "decimalPlaces": 2},
                {"entity": "agent", "field": "capReached",
                 "expression": "capProgress >= 1", "returnType": "flag", "active": false},
                {"entity": "listing", "field": "pricePerSqft",
                 "expression": "listPrice / sqft", "returnType": null}
            ]"#,
        )
        .unwrap();

        assert_eq!(defs[0].return_type, ReturnType::Currency);
        assert_eq!(defs[0].decimal_places, Some(2));
        assert!(defs[0].active);
        assert_eq!(defs[0].qualified_name(), "transaction.grossCommission");
        assert_eq!(defs[1].return_type, ReturnType::Number);
        assert!(!defs[1].active);
        assert_eq!(defs[2].return_type, ReturnType::Number);
    }

    #[test]
    fn test_definition_serializes_camel_case() {
        let def = FormulaDefinition::new("agent", "netPay", "gross - fees", ReturnType::Currency);
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "entity": "agent",
                "field": "netPay",
                "expression": "gross - fees",
                "returnType": "currency",
                "active": true
            })
        );
    }
}
