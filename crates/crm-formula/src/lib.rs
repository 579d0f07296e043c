//! # crm-formula
//!
//! Formula engine for CRM computed fields.
//!
//! This crate provides:
//! - Formula parsing (text → AST)
//! - Formula evaluation against a record of field values
//! - Custom functions (`IF`, `IFGT`, `COALESCE`) and math built-ins
//! - Return-type shaping (currency rounding, booleans, text)
//! - Field reference extraction for UI metadata
//!
//! ## Example
//!
//! ```rust
//! use crm_formula::{evaluate_formula, FormulaValue, Record, ReturnType};
//!
//! let record: Record = [("balanceDue", 0.0)].into_iter().collect();
//! let result = evaluate_formula("COALESCE(balanceDue, 500)", &record, ReturnType::Currency);
//! assert_eq!(result.value, Some(FormulaValue::Number(500.0)));
//! ```

pub mod ast;
pub mod context;
pub mod definition;
pub mod display;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod format;
pub mod functions;
pub mod parser;
pub mod references;

pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator};
pub use context::{normalize_context, FieldValue, NormalizedContext, Record};
pub use definition::{FormulaDefinition, ReturnType};
pub use display::display_value;
pub use engine::{evaluate_formula, validate_formula, EvaluationResult, ValidationResult};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, FormulaValue};
pub use format::{format_result, round_currency};
pub use parser::parse_formula;
pub use references::extract_field_references;
