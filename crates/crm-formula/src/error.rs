//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Identifier with no binding in the evaluation context
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    /// Unknown function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Formula evaluation error
    #[error("Evaluation error: {0}")]
    Evaluation(String),
}

impl FormulaError {
    /// Whether this error was raised before evaluation started
    pub fn is_parse_error(&self) -> bool {
        matches!(self, FormulaError::Parse(_))
    }
}
