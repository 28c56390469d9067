//! Restricted arithmetic expressions for derived columns
//!
//! A formula is parsed once into an expression tree and evaluated per row.
//! The grammar covers numeric literals, column references, `+ - * /`,
//! unary minus and parentheses; nothing else. Column references are
//! identifiers (letters, digits and `_`, not starting with a digit).

use crate::error::{Error, Result};
use crate::types::{Record, Value};

/// A parsed formula, ready to evaluate against records.
#[derive(Clone, Debug, PartialEq)]
pub struct Formula {
    expr: Expr,
}

#[derive(Clone, Debug, PartialEq)]
enum Expr {
    Number(f64),
    Column(String),
    Negate(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Formula {
    /// Parse `input`, rejecting anything outside the restricted grammar.
    pub fn parse(input: &str) -> Result<Formula> {
        let tokens = tokenize(input)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expression()?;
        if parser.pos != parser.tokens.len() {
            return Err(Error::FormulaParse(format!(
                "unexpected trailing input in {input:?}"
            )));
        }
        Ok(Formula { expr })
    }

    /// Evaluate against one record. A missing column or a value that does
    /// not coerce to a number is an error; callers skip such rows.
    pub fn eval(&self, record: &Record) -> Result<f64> {
        eval_expr(&self.expr, record)
    }
}

fn eval_expr(expr: &Expr, record: &Record) -> Result<f64> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Column(name) => {
            let value = record
                .get(name)
                .ok_or_else(|| Error::ColumnNotFound(name.clone()))?;
            value
                .as_number()
                .ok_or_else(|| Error::InvalidValue(format!("{name} = {value} is not numeric")))
        }
        Expr::Negate(inner) => Ok(-eval_expr(inner, record)?),
        Expr::Binary(op, lhs, rhs) => {
            let (l, r) = (eval_expr(lhs, record)?, eval_expr(rhs, record)?);
            Ok(match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => l / r,
            })
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '0'..='9' | '.' => {
                let mut text = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        text.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number = text
                    .parse::<f64>()
                    .map_err(|_| Error::FormulaParse(format!("bad number literal {text:?}")))?;
                tokens.push(Token::Number(number));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            other => {
                return Err(Error::FormulaParse(format!(
                    "unexpected character {other:?}"
                )));
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<Expr> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<Expr> {
        let mut lhs = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.factor()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    // factor := number | ident | '-' factor | '(' expression ')'
    fn factor(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Ident(name)) => Ok(Expr::Column(name)),
            Some(Token::Minus) => Ok(Expr::Negate(Box::new(self.factor()?))),
            Some(Token::LParen) => {
                let inner = self.expression()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(Error::FormulaParse("missing closing parenthesis".into())),
                }
            }
            other => Err(Error::FormulaParse(format!(
                "expected a value, found {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: serde_json::Value) -> Record {
        serde_json::from_value(json).unwrap()
    }

    fn eval(formula: &str, row: serde_json::Value) -> Result<f64> {
        Formula::parse(formula)?.eval(&record(row))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(eval("1 + 2 * 3", serde_json::json!({})).unwrap(), 7.0);
        assert_eq!(eval("(1 + 2) * 3", serde_json::json!({})).unwrap(), 9.0);
        assert_eq!(eval("10 - 4 / 2", serde_json::json!({})).unwrap(), 8.0);
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(eval("10 - 3 - 2", serde_json::json!({})).unwrap(), 5.0);
        assert_eq!(eval("16 / 4 / 2", serde_json::json!({})).unwrap(), 2.0);
    }

    #[test]
    fn columns_resolve_with_numeric_coercion() {
        let row = serde_json::json!({"a": 3, "b": "1.5"});
        assert_eq!(eval("a * 2 + b", row).unwrap(), 7.5);
    }

    #[test]
    fn unary_minus_nests() {
        assert_eq!(eval("-3 + 5", serde_json::json!({})).unwrap(), 2.0);
        assert_eq!(eval("--4", serde_json::json!({})).unwrap(), 4.0);
        assert_eq!(eval("2 * -a", serde_json::json!({"a": 3})).unwrap(), -6.0);
    }

    #[test]
    fn missing_or_non_numeric_columns_are_errors() {
        assert_eq!(
            eval("a + 1", serde_json::json!({})),
            Err(Error::ColumnNotFound("a".into()))
        );
        assert!(matches!(
            eval("a + 1", serde_json::json!({"a": "west"})),
            Err(Error::InvalidValue(_))
        ));
    }

    #[test]
    fn malformed_input_is_rejected_at_parse_time() {
        assert!(Formula::parse("1 +").is_err());
        assert!(Formula::parse("(1").is_err());
        assert!(Formula::parse("1 2").is_err());
        assert!(Formula::parse("a % b").is_err());
        assert!(Formula::parse("1.2.3").is_err());
    }

    #[test]
    fn division_by_zero_follows_float_semantics() {
        assert_eq!(eval("1 / 0", serde_json::json!({})).unwrap(), f64::INFINITY);
    }
}
