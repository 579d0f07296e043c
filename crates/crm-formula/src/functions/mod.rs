//! Built-in formula functions

pub mod logical;
pub mod math;

use crate::error::FormulaResult;
use crate::evaluator::FormulaValue;
use std::collections::HashMap;

/// Function implementation signature
pub type FunctionImpl = fn(&[FormulaValue]) -> FormulaResult<FormulaValue>;

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

/// Function registry
///
/// Names are matched case-insensitively, so `IF`, `If` and `if` all resolve
/// to the same definition.
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };

        registry.register_logical_functions();
        registry.register_math_functions();

        registry
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }

    fn register_logical_functions(&mut self) {
        // IF(condition, trueValue, falseValue)
        self.register(FunctionDef {
            name: "IF",
            min_args: 3,
            max_args: Some(3),
            implementation: logical::fn_if,
        });

        // IFGT(value, compare, trueValue, falseValue)
        self.register(FunctionDef {
            name: "IFGT",
            min_args: 4,
            max_args: Some(4),
            implementation: logical::fn_ifgt,
        });

        // COALESCE(value, defaultValue)
        self.register(FunctionDef {
            name: "COALESCE",
            min_args: 2,
            max_args: Some(2),
            implementation: logical::fn_coalesce,
        });
    }

    fn register_math_functions(&mut self) {
        self.register(FunctionDef {
            name: "ABS",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_abs,
        });

        self.register(FunctionDef {
            name: "CEIL",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_ceil,
        });

        self.register(FunctionDef {
            name: "FLOOR",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_floor,
        });

        // ROUND(number, [num_digits])
        self.register(FunctionDef {
            name: "ROUND",
            min_args: 1,
            max_args: Some(2),
            implementation: math::fn_round,
        });

        self.register(FunctionDef {
            name: "MAX",
            min_args: 1,
            max_args: None,
            implementation: math::fn_max,
        });

        self.register(FunctionDef {
            name: "MIN",
            min_args: 1,
            max_args: None,
            implementation: math::fn_min,
        });

        self.register(FunctionDef {
            name: "SQRT",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_sqrt,
        });

        self.register(FunctionDef {
            name: "LEN",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_len,
        });
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
