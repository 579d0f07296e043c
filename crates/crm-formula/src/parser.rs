//! Formula parser
//!
//! A recursive descent parser for record formulas with proper operator precedence.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};

/// Maximum nesting of parentheses, calls and prefix operators.
const MAX_DEPTH: usize = 64;

/// Maximum number of operators and calls in one formula. Evaluation recurses
/// once per operator along a chain, so this bounds the evaluator's stack.
const MAX_OPERATORS: usize = 500;

/// Parse a formula string into an AST
///
/// # Example
/// ```rust
/// use crm_formula::parse_formula;
///
/// let ast = parse_formula("1 + 2").unwrap();
/// let ast = parse_formula("amount * commissionPct / 100").unwrap();
/// let ast = parse_formula("IF(amount > 100000, 1, 0)").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let mut parser = FormulaParser::new(formula);

    if matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse("Empty expression".into()));
    }

    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    match parser.current_token() {
        Token::Eof => Ok(expr),
        Token::Invalid(msg) => Err(FormulaError::Parse(msg.clone())),
        token => Err(FormulaError::Parse(format!(
            "Unexpected {} after expression",
            token.describe()
        ))),
    }
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),

    // Function name or variable
    Identifier(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Bang,
    AndAnd,
    OrOr,
    EqualEqual,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,

    /// Lexical error, reported when the parser reaches it
    Invalid(String),

    // End of input
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::String(s) => format!("string \"{}\"", s),
            Token::Boolean(b) => format!("boolean {}", b),
            Token::Identifier(name) => format!("identifier '{}'", name),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::Star => "'*'".into(),
            Token::Slash => "'/'".into(),
            Token::Caret => "'^'".into(),
            Token::Percent => "'%'".into(),
            Token::Bang => "'!'".into(),
            Token::AndAnd => "'&&'".into(),
            Token::OrOr => "'||'".into(),
            Token::EqualEqual => "'=='".into(),
            Token::NotEqual => "'!='".into(),
            Token::LessThan => "'<'".into(),
            Token::LessEqual => "'<='".into(),
            Token::GreaterThan => "'>'".into(),
            Token::GreaterEqual => "'>='".into(),
            Token::Comma => "','".into(),
            Token::LeftParen => "'('".into(),
            Token::RightParen => "')'".into(),
            Token::Invalid(msg) => msg.clone(),
            Token::Eof => "end of expression".into(),
        }
    }
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Option<Token>,
    depth: usize,
    operators: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: None,
            depth: 0,
            operators: 0,
        };
        parser.advance_token();
        parser
    }

    // === Token scanning ===

    fn advance_token(&mut self) {
        self.skip_whitespace();
        self.current_token = Some(self.scan_token());
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Token::Eof,
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '%' => Some(Token::Percent),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return token;
        }

        // One- or two-character operators
        match c {
            '<' => {
                self.advance();
                return match self.peek_char() {
                    Some('=') => {
                        self.advance();
                        Token::LessEqual
                    }
                    Some('>') => {
                        self.advance();
                        Token::NotEqual
                    }
                    _ => Token::LessThan,
                };
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Token::GreaterEqual;
                }
                return Token::GreaterThan;
            }
            '!' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Token::NotEqual;
                }
                return Token::Bang;
            }
            '=' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Token::EqualEqual;
                }
                return Token::Invalid("Unexpected '=' (use '==' for equality)".into());
            }
            '&' | '|' => {
                self.advance();
                if self.peek_char() == Some(c) {
                    self.advance();
                    return if c == '&' { Token::AndAnd } else { Token::OrOr };
                }
                return Token::Invalid(format!("Unexpected '{}' (use '{}{}')", c, c, c));
            }
            _ => {}
        }

        // String literal
        if c == '"' || c == '\'' {
            return self.scan_string(c);
        }

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        // Identifier or boolean
        if c.is_ascii_alphabetic() || c == '_' {
            return self.scan_identifier();
        }

        // Unknown character
        self.advance();
        Token::Invalid(format!("Unexpected character '{}'", c))
    }

    fn scan_string(&mut self, quote: char) -> Token {
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                None => return Token::Invalid("Unterminated string literal".into()),
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some(escaped) => {
                            s.push(escaped);
                            self.advance();
                        }
                        None => return Token::Invalid("Unterminated string literal".into()),
                    }
                }
                Some(c) if c == quote => {
                    self.advance();
                    return Token::String(s);
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
            }
        }
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        match num_str.parse::<f64>() {
            Ok(num) => Token::Number(num),
            Err(_) => Token::Invalid(format!("Invalid number '{}'", num_str)),
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;

        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];

        // Boolean literals (but not if followed by '(' - then it's a function call)
        if self.peek_non_whitespace() != Some('(') {
            if text.eq_ignore_ascii_case("true") {
                return Token::Boolean(true);
            }
            if text.eq_ignore_ascii_case("false") {
                return Token::Boolean(false);
            }
        }

        Token::Identifier(text.to_string())
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn peek_non_whitespace(&self) -> Option<char> {
        self.input[self.pos..].chars().find(|c| !c.is_whitespace())
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        self.current_token.as_ref().unwrap_or(&Token::Eof)
    }

    fn consume(&mut self) -> Token {
        let token = self.current_token.take().unwrap_or(Token::Eof);
        self.advance_token();
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected {}", expected.describe())))
        }
    }

    fn unexpected(&self, hint: &str) -> FormulaError {
        match self.current_token() {
            Token::Invalid(msg) => FormulaError::Parse(msg.clone()),
            token => FormulaError::Parse(format!("Unexpected {}, {}", token.describe(), hint)),
        }
    }

    fn count_operator(&mut self) -> FormulaResult<()> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return Err(FormulaError::Parse(format!(
                "Expression has more than {} operators",
                MAX_OPERATORS
            )));
        }
        Ok(())
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Logical or: ||
    // 2. Logical and: &&
    // 3. Comparison: ==, !=, <, <=, >, >=
    // 4. Addition/Subtraction: +, -
    // 5. Multiplication/Division/Remainder: *, /, %
    // 6. Unary: -, +, !
    // 7. Exponentiation: ^ (binds tighter than a leading minus)
    // 8. Primary: literals, variables, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_and()?;

        while matches!(self.current_token(), Token::OrOr) {
            self.consume();
            self.count_operator()?;
            let right = self.parse_and()?;
            left = FormulaExpr::BinaryOp {
                op: BinaryOperator::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_comparison()?;

        while matches!(self.current_token(), Token::AndAnd) {
            self.consume();
            self.count_operator()?;
            let right = self.parse_comparison()?;
            left = FormulaExpr::BinaryOp {
                op: BinaryOperator::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_comparison(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current_token() {
                Token::EqualEqual => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume();
            self.count_operator()?;
            let right = self.parse_additive()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            self.count_operator()?;
            let right = self.parse_multiplicative()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                Token::Percent => BinaryOperator::Remainder,
                _ => break,
            };

            self.consume();
            self.count_operator()?;
            let right = self.parse_unary()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(FormulaError::Parse(format!(
                "Expression nested deeper than {} levels",
                MAX_DEPTH
            )));
        }
        let result = self.parse_prefix();
        self.depth -= 1;
        result
    }

    fn parse_prefix(&mut self) -> FormulaResult<FormulaExpr> {
        let op = match self.current_token() {
            Token::Minus => UnaryOperator::Negate,
            Token::Plus => UnaryOperator::Plus,
            Token::Bang => UnaryOperator::Not,
            _ => return self.parse_power(),
        };

        self.consume();
        self.count_operator()?;
        let operand = self.parse_unary()?;
        Ok(FormulaExpr::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_primary()?;

        if matches!(self.current_token(), Token::Caret) {
            self.consume();
            self.count_operator()?;
            let right = self.parse_unary()?; // Right associative
            return Ok(FormulaExpr::BinaryOp {
                op: BinaryOperator::Power,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current_token().clone() {
            Token::Number(n) => {
                self.consume();
                Ok(FormulaExpr::Number(n))
            }

            Token::String(s) => {
                self.consume();
                Ok(FormulaExpr::String(s))
            }

            Token::Boolean(b) => {
                self.consume();
                Ok(FormulaExpr::Boolean(b))
            }

            Token::LeftParen => {
                self.consume();
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::Identifier(name) => {
                self.consume();
                // Check if it's a function call
                if matches!(self.current_token(), Token::LeftParen) {
                    self.parse_function_call(name)
                } else {
                    Ok(FormulaExpr::Variable(name))
                }
            }

            _ => Err(self.unexpected("expected a value")),
        }
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;
        self.count_operator()?;

        let mut args = Vec::new();

        // Parse arguments
        if !matches!(self.current_token(), Token::RightParen) {
            args.push(self.parse_expression()?);

            while matches!(self.current_token(), Token::Comma) {
                self.consume();
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(FormulaExpr::Function { name, args })
    }
}
