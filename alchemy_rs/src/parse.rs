//! Reads rendered expressions back into terms.
//!
//! Accepts the output of every [`Standardization`](crate::Standardization)
//! strategy, `\` as an alternative to `λ`, and arbitrary whitespace. A plain
//! index `n` under `d` binders is a bound variable when `n < d` and the free
//! variable `n - d` otherwise.

use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use crate::error::ParseError;
use crate::standardize::FREE_MARKER;
use crate::term::Term;

/// Parse a rendered expression.
pub fn parse(input: &str) -> Result<Term, ParseError> {
    let mut parser = Parser {
        chars: input.char_indices().peekable(),
        len: input.len(),
    };
    let term = parser.term(0)?;
    parser.skip_whitespace();
    match parser.chars.peek() {
        None => Ok(term),
        Some(&(pos, c)) => Err(ParseError::new(pos, format!("unexpected character '{}'", c))),
    }
}

impl FromStr for Term {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

struct Parser<'a> {
    chars: Peekable<CharIndices<'a>>,
    len: usize,
}

impl Parser<'_> {
    fn position(&mut self) -> usize {
        self.chars.peek().map_or(self.len, |&(pos, _)| pos)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some(&(_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        match self.chars.next() {
            Some((_, c)) if c == expected => Ok(()),
            Some((pos, c)) => Err(ParseError::new(
                pos,
                format!("expected '{}', found '{}'", expected, c),
            )),
            None => Err(ParseError::new(
                self.len,
                format!("expected '{}', found end of input", expected),
            )),
        }
    }

    fn term(&mut self, binders: u32) -> Result<Term, ParseError> {
        self.skip_whitespace();
        if let Some(&(_, 'λ' | '\\')) = self.chars.peek() {
            return self.abstraction(binders);
        }

        let mut acc = self.atom(binders)?;
        loop {
            self.skip_whitespace();
            match self.chars.peek() {
                None | Some(&(_, ')')) => break,
                // An abstraction extends as far right as possible.
                Some(&(_, 'λ' | '\\')) => {
                    let arg = self.abstraction(binders)?;
                    acc = Term::app(acc, arg);
                    break;
                }
                Some(_) => {
                    let arg = self.atom(binders)?;
                    acc = Term::app(acc, arg);
                }
            }
        }
        Ok(acc)
    }

    fn abstraction(&mut self, binders: u32) -> Result<Term, ParseError> {
        self.chars.next();
        self.skip_whitespace();
        self.expect('.')?;
        let body = self.term(binders + 1)?;
        Ok(Term::abs(body))
    }

    fn atom(&mut self, binders: u32) -> Result<Term, ParseError> {
        match self.chars.peek().copied() {
            Some((_, '(')) => {
                self.chars.next();
                let inner = self.term(binders)?;
                self.skip_whitespace();
                self.expect(')')?;
                Ok(inner)
            }
            Some((_, c)) if c == FREE_MARKER => {
                self.chars.next();
                let id = self.number()?;
                Ok(Term::free(id))
            }
            Some((_, c)) if c.is_ascii_digit() => {
                let n = self.number()?;
                if let Some(&(_, c)) = self.chars.peek() {
                    if c == FREE_MARKER {
                        self.chars.next();
                        return Ok(Term::free(n));
                    }
                }
                if n < binders {
                    Ok(Term::var(n))
                } else {
                    Ok(Term::free(n - binders))
                }
            }
            Some((pos, c)) => Err(ParseError::new(pos, format!("unexpected character '{}'", c))),
            None => Err(ParseError::new(self.len, "unexpected end of input")),
        }
    }

    fn number(&mut self) -> Result<u32, ParseError> {
        let start = self.position();
        let mut digits = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            self.chars.next();
        }
        if digits.is_empty() {
            return Err(ParseError::new(start, "expected a variable index"));
        }
        digits
            .parse()
            .map_err(|_| ParseError::new(start, format!("index {} is out of range", digits)))
    }
}
