//! Arithmetic expression evaluation.
//!
//! Expressions are ASCII arithmetic over decimal numbers: `+ - * /`,
//! parentheses and unary signs. `*` and `/` bind tighter than `+` and `-`,
//! and operators of equal precedence associate to the left. All arithmetic is
//! done in `Decimal`, so `0.1 + 0.2` is exactly `0.3`.

use crate::error::EvalError;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Deepest parenthesis nesting accepted.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Decimal),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, EvalError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push((start, Token::Number(parse_number(&text)?)));
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => {
                return Err(EvalError::UnexpectedChar {
                    found: other,
                    position: i,
                });
            }
        };
        tokens.push((i, token));
        i += 1;
    }

    Ok(tokens)
}

/// Accepts `12`, `1.5`, `.5` and a dangling `5.`; rejects `1.2.3` and a bare `.`.
fn parse_number(text: &str) -> Result<Decimal, EvalError> {
    let invalid = || EvalError::InvalidNumber(text.to_string());
    if text.matches('.').count() > 1 {
        return Err(invalid());
    }
    let trimmed = text.strip_suffix('.').unwrap_or(text);
    let normalized = if trimmed.starts_with('.') {
        format!("0{trimmed}")
    } else {
        trimmed.to_string()
    };
    if normalized.is_empty() {
        return Err(invalid());
    }
    Decimal::from_str(&normalized).map_err(|_| invalid())
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, token)| token)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, token)| token.clone());
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<Decimal, EvalError> {
        let mut acc = self.term()?;
        loop {
            acc = match self.peek().cloned() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    acc.checked_add(self.term()?).ok_or(EvalError::Overflow)?
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    acc.checked_sub(self.term()?).ok_or(EvalError::Overflow)?
                }
                _ => break,
            };
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<Decimal, EvalError> {
        let mut acc = self.factor()?;
        loop {
            acc = match self.peek().cloned() {
                Some(Token::Star) => {
                    self.pos += 1;
                    acc.checked_mul(self.factor()?).ok_or(EvalError::Overflow)?
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.factor()?;
                    if divisor.is_zero() {
                        return Err(EvalError::DivisionByZero);
                    }
                    acc.checked_div(divisor).ok_or(EvalError::Overflow)?
                }
                _ => break,
            };
        }
        Ok(acc)
    }

    /// A run of unary signs folds into one, however long.
    fn factor(&mut self) -> Result<Decimal, EvalError> {
        let mut negative = false;
        loop {
            match self.peek() {
                Some(Token::Minus) => negative = !negative,
                Some(Token::Plus) => {}
                _ => break,
            }
            self.pos += 1;
        }
        let value = self.primary()?;
        Ok(if negative { -value } else { value })
    }

    fn primary(&mut self) -> Result<Decimal, EvalError> {
        let index = self.pos;
        match self.next() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LParen) => {
                if self.depth == MAX_DEPTH {
                    return Err(EvalError::TooDeep);
                }
                self.depth += 1;
                let inner = self.expr()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(_) => Err(self.unexpected(self.pos - 1)),
                    None => Err(EvalError::UnexpectedEnd),
                }
            }
            Some(_) => Err(self.unexpected(index)),
            None => Err(EvalError::UnexpectedEnd),
        }
    }

    fn unexpected(&self, index: usize) -> EvalError {
        match self.tokens.get(index) {
            Some((position, token)) => EvalError::UnexpectedChar {
                found: symbol(token),
                position: *position,
            },
            None => EvalError::UnexpectedEnd,
        }
    }
}

fn symbol(token: &Token) -> char {
    match token {
        Token::Number(_) => '0',
        Token::Plus => '+',
        Token::Minus => '-',
        Token::Star => '*',
        Token::Slash => '/',
        Token::LParen => '(',
        Token::RParen => ')',
    }
}

/// Evaluate an arithmetic expression.
pub fn evaluate(input: &str) -> Result<Decimal, EvalError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(EvalError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.unexpected(parser.pos));
    }
    Ok(value)
}
