//! Arithmetic expression evaluation
//!
//! A small recursive-descent evaluator for calculator-style input. It backs
//! the `calc` and `eval` processors in the interactive binary and is a
//! reference [`Evaluator`] for hosts that have nothing better to plug in.
//!
//! Grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary ('^' unary)?
//! primary := number | constant | function '(' expr ')' | '(' expr ')'
//! ```

use crate::error::{Error, Result};
use crate::host::Evaluator;

/// Reasons an expression cannot be evaluated
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected '{found}' at position {position}")]
    Unexpected { found: char, position: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unknown name '{0}'")]
    UnknownName(String),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NotFinite,

    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Deepest nesting of parentheses, signs and exponents the parser accepts
pub const MAX_NESTING: usize = 256;

/// Evaluates arithmetic expressions to their decimal result
#[derive(Debug, Clone, Copy, Default)]
pub struct ArithmeticEvaluator;

impl ArithmeticEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate `expression` to a number
    pub fn evaluate_number(&self, expression: &str) -> std::result::Result<f64, EvalError> {
        let mut parser = Parser::new(expression);
        parser.skip_whitespace();
        if parser.at_end() {
            return Err(EvalError::Empty);
        }

        let value = parser.expr()?;
        parser.skip_whitespace();
        if let Some((position, found)) = parser.peek() {
            return Err(EvalError::Unexpected { found, position });
        }
        if !value.is_finite() {
            return Err(EvalError::NotFinite);
        }
        Ok(value)
    }
}

impl Evaluator for ArithmeticEvaluator {
    fn evaluate(&self, expression: &str) -> Result<String> {
        self.evaluate_number(expression)
            .map(format_number)
            .map_err(|e| Error::EvaluationFailed {
                expression: expression.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Render whole numbers without a fractional part
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    /// Run `parse` one nesting level down, refusing to go past [`MAX_NESTING`]
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> std::result::Result<T, EvalError>,
    ) -> std::result::Result<T, EvalError> {
        if self.depth >= MAX_NESTING {
            return Err(EvalError::TooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<(usize, char)> {
        self.input[self.pos..].chars().next().map(|c| (self.pos, c))
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.input[self.pos..].chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some((_, c)) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.bump();
        }
    }

    /// Consume `expected` if it is the next non-blank character
    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        match self.peek() {
            Some((_, c)) if c == expected => {
                self.bump();
                true
            }
            _ => false,
        }
    }

    fn expr(&mut self) -> std::result::Result<f64, EvalError> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> std::result::Result<f64, EvalError> {
        let mut value = self.unary()?;
        loop {
            if self.eat('*') {
                value *= self.unary()?;
            } else if self.eat('/') {
                let divisor = self.unary()?;
                if divisor == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                value /= divisor;
            } else if self.eat('%') {
                let divisor = self.unary()?;
                if divisor == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                value %= divisor;
            } else {
                return Ok(value);
            }
        }
    }

    fn unary(&mut self) -> std::result::Result<f64, EvalError> {
        if self.eat('-') {
            Ok(-self.nested(Self::unary)?)
        } else if self.eat('+') {
            self.nested(Self::unary)
        } else {
            self.power()
        }
    }

    fn power(&mut self) -> std::result::Result<f64, EvalError> {
        let base = self.primary()?;
        if self.eat('^') {
            let exponent = self.nested(Self::unary)?;
            Ok(base.powf(exponent))
        } else {
            Ok(base)
        }
    }

    fn primary(&mut self) -> std::result::Result<f64, EvalError> {
        self.skip_whitespace();
        let (position, c) = self.peek().ok_or(EvalError::UnexpectedEnd)?;

        if c == '(' {
            self.bump();
            let value = self.nested(Self::expr)?;
            if !self.eat(')') {
                return match self.peek() {
                    Some((position, found)) => Err(EvalError::Unexpected { found, position }),
                    None => Err(EvalError::UnexpectedEnd),
                };
            }
            return Ok(value);
        }

        if c.is_ascii_digit() || c == '.' {
            return self.number();
        }

        if c.is_ascii_alphabetic() {
            let name = self.identifier();
            return self.named(&name);
        }

        Err(EvalError::Unexpected { found: c, position })
    }

    fn number(&mut self) -> std::result::Result<f64, EvalError> {
        let start = self.pos;
        while let Some((_, c)) = self.peek() {
            if c.is_ascii_digit() || c == '.' || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.input[start..self.pos];
        text.replace('_', "")
            .parse::<f64>()
            .map_err(|_| EvalError::InvalidNumber(text.to_string()))
    }

    fn identifier(&mut self) -> String {
        let start = self.pos;
        while let Some((_, c)) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_ascii_lowercase()
    }

    fn named(&mut self, name: &str) -> std::result::Result<f64, EvalError> {
        match name {
            "pi" => return Ok(std::f64::consts::PI),
            "e" => return Ok(std::f64::consts::E),
            _ => {}
        }

        let function: fn(f64) -> f64 = match name {
            "sqrt" => f64::sqrt,
            "abs" => f64::abs,
            "ln" => f64::ln,
            "log" => f64::log10,
            "sin" => f64::sin,
            "cos" => f64::cos,
            "tan" => f64::tan,
            "floor" => f64::floor,
            "ceil" => f64::ceil,
            "round" => f64::round,
            _ => return Err(EvalError::UnknownName(name.to_string())),
        };

        if !self.eat('(') {
            return match self.peek() {
                Some((position, found)) => Err(EvalError::Unexpected { found, position }),
                None => Err(EvalError::UnexpectedEnd),
            };
        }
        let argument = self.nested(Self::expr)?;
        if !self.eat(')') {
            return Err(EvalError::UnexpectedEnd);
        }
        Ok(function(argument))
    }
}
