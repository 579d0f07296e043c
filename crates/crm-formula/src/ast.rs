//! Syntax tree produced by [`parse_formula`](crate::parse_formula)

/// A parsed formula
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    Number(f64),
    /// Quoted text, escapes already resolved
    String(String),
    /// `true` / `false` in any letter case
    Boolean(bool),

    /// Record field looked up in the normalized context
    Variable(String),

    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    /// Call of a registered function; `name` keeps the spelling used in the formula
    Function {
        name: String,
        args: Vec<FormulaExpr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// `+`, which concatenates when either side is text
    Add,
    Subtract,
    Multiply,
    Divide,
    /// `%`, sign follows the dividend
    Remainder,
    /// `^`, right-associative
    Power,

    /// `==`
    Equal,
    /// `!=` or `<>`
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    /// `&&`, short-circuits
    And,
    /// `||`, short-circuits
    Or,
}

/// Prefix operators: `-`, `+` and `!`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Plus,
    Not,
}
