//! SPDX license expression tree, tokenizer and recursive descent parser.
//!
//! The parser here is purely structural: any identifier-shaped token is
//! accepted as a leaf. Checking leaves against a catalog is the job of the
//! grammar service ([`super::grammar`]).

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conjunction::And => write!(f, "AND"),
            Conjunction::Or => write!(f, "OR"),
        }
    }
}

/// Parsed license expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseExpr {
    /// A single identifier, optionally `+` and optionally `WITH <exception>`.
    License {
        id: String,
        or_later: bool,
        exception: Option<String>,
    },
    Binary {
        conjunction: Conjunction,
        left: Box<LicenseExpr>,
        right: Box<LicenseExpr>,
    },
}

impl LicenseExpr {
    pub fn license(id: impl Into<String>) -> Self {
        LicenseExpr::License {
            id: id.into(),
            or_later: false,
            exception: None,
        }
    }

    /// Every leaf as `(identifier, exception)`, left to right.
    pub fn leaves(&self) -> Vec<(&str, Option<&str>)> {
        match self {
            LicenseExpr::License { id, exception, .. } => {
                vec![(id.as_str(), exception.as_deref())]
            }
            LicenseExpr::Binary { left, right, .. } => {
                let mut out = left.leaves();
                out.extend(right.leaves());
                out
            }
        }
    }
}

/// Serializes the tree back to a flat expression.
///
/// A binary node is written as `<left> <CONJUNCTION> <right>`; grouping
/// parentheses are not reproduced.
impl fmt::Display for LicenseExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LicenseExpr::License {
                id,
                or_later,
                exception,
            } => {
                write!(f, "{}", id)?;
                if *or_later {
                    write!(f, "+")?;
                }
                if let Some(exception) = exception {
                    write!(f, " WITH {}", exception)?;
                }
                Ok(())
            }
            LicenseExpr::Binary {
                conjunction,
                left,
                right,
            } => write!(f, "{} {} {}", left, conjunction, right),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("empty license expression")]
    Empty,
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unknown license identifier `{0}`")]
    UnknownIdentifier(String),
    #[error("unknown license exception `{0}`")]
    UnknownException(String),
    #[error("no expression parser available")]
    Unavailable,
}

#[derive(Debug, PartialEq, Clone)]
enum Token {
    Id(String),
    And,
    Or,
    With,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Id(s) => write!(f, "{}", s),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::With => write!(f, "WITH"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn tokenize(expr: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '(' {
            tokens.push(Token::LParen);
            chars.next();
        } else if c == ')' {
            tokens.push(Token::RParen);
            chars.next();
        } else {
            let mut s = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == '(' || c == ')' {
                    break;
                }
                s.push(c);
                chars.next();
            }
            let token = match s.as_str() {
                "AND" => Token::And,
                "OR" => Token::Or,
                "WITH" => Token::With,
                _ => Token::Id(s),
            };
            tokens.push(token);
        }
    }
    tokens
}

/// Grammar (AND binds tighter than OR, WITH tighter than AND):
/// ```text
/// expr     := or_expr
/// or_expr  := and_expr ( "OR" and_expr )*
/// and_expr := atom ( "AND" atom )*
/// atom     := "(" expr ")" | id [ "+" ] ( "WITH" id )?
/// ```
struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn parse_or(&mut self) -> Result<LicenseExpr, ExpressionError> {
        let mut result = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.consume();
            let rhs = self.parse_and()?;
            result = LicenseExpr::Binary {
                conjunction: Conjunction::Or,
                left: Box::new(result),
                right: Box::new(rhs),
            };
        }
        Ok(result)
    }

    fn parse_and(&mut self) -> Result<LicenseExpr, ExpressionError> {
        let mut result = self.parse_atom()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.consume();
            let rhs = self.parse_atom()?;
            result = LicenseExpr::Binary {
                conjunction: Conjunction::And,
                left: Box::new(result),
                right: Box::new(rhs),
            };
        }
        Ok(result)
    }

    fn parse_atom(&mut self) -> Result<LicenseExpr, ExpressionError> {
        match self.consume() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.consume() {
                    Some(Token::RParen) => Ok(inner),
                    Some(other) => Err(ExpressionError::UnexpectedToken(other.to_string())),
                    None => Err(ExpressionError::UnexpectedEnd),
                }
            }
            Some(Token::Id(raw)) => {
                let (id, or_later) = match raw.strip_suffix('+') {
                    Some(base) if !base.is_empty() => (base.to_string(), true),
                    _ => (raw, false),
                };
                let exception = if matches!(self.peek(), Some(Token::With)) {
                    self.consume();
                    match self.consume() {
                        Some(Token::Id(exception)) => Some(exception),
                        Some(other) => {
                            return Err(ExpressionError::UnexpectedToken(other.to_string()))
                        }
                        None => return Err(ExpressionError::UnexpectedEnd),
                    }
                } else {
                    None
                };
                Ok(LicenseExpr::License {
                    id,
                    or_later,
                    exception,
                })
            }
            Some(other) => Err(ExpressionError::UnexpectedToken(other.to_string())),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }
}

/// Parse an expression without validating identifiers.
pub fn parse(expr: &str) -> Result<LicenseExpr, ExpressionError> {
    let tokens = tokenize(expr);
    if tokens.is_empty() {
        return Err(ExpressionError::Empty);
    }
    let mut parser = ExprParser { tokens, pos: 0 };
    let tree = parser.parse_or()?;
    match parser.consume() {
        None => Ok(tree),
        Some(extra) => Err(ExpressionError::UnexpectedToken(extra.to_string())),
    }
}
