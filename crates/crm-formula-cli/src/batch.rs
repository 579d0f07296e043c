//! Batch check of formula definitions against sample records

use crate::samples::Samples;
use anyhow::{Context, Result};
use crm_formula::{display_value, evaluate_formula, EvaluationResult, FormulaDefinition, Record};
use std::fmt;
use std::path::Path;

/// Load a JSON array of definitions, keeping only the active ones
pub fn load_definitions(path: &Path) -> Result<Vec<FormulaDefinition>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let definitions: Vec<FormulaDefinition> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse definitions in '{}'", path.display()))?;

    let total = definitions.len();
    let active: Vec<_> = definitions.into_iter().filter(|d| d.active).collect();
    tracing::debug!(total, active = active.len(), "loaded formula definitions");
    Ok(active)
}

/// One evaluated definition
#[derive(Debug, Clone)]
pub struct FormulaCheck {
    pub name: String,
    pub result: EvaluationResult,
    pub display: String,
}

impl FormulaCheck {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

impl fmt::Display for FormulaCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result.error {
            None => write!(f, "PASS {} = {}", self.name, self.display),
            Some(error) => write!(f, "FAIL {}: {}", self.name, error),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub checks: Vec<FormulaCheck>,
}

impl BatchReport {
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.checks.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            writeln!(f, "{}", check)?;
        }
        write!(
            f,
            "{} formulas: {} passed, {} failed",
            self.checks.len(),
            self.passed(),
            self.failed()
        )
    }
}

/// Evaluate every definition against the sample record for its entity.
/// Entities without a sample are evaluated against an empty record.
pub fn run(definitions: &[FormulaDefinition], samples: &Samples) -> BatchReport {
    let empty = Record::new();
    let checks = definitions
        .iter()
        .map(|def| {
            let record = samples.record_for(&def.entity).unwrap_or_else(|| {
                tracing::warn!(entity = %def.entity, "no sample record for entity");
                &empty
            });
            let result = evaluate_formula(&def.expression, record, def.return_type);
            let display = display_value(&result, def.decimal_places);
            FormulaCheck {
                name: def.qualified_name(),
                result,
                display,
            }
        })
        .collect();

    BatchReport { checks }
}
