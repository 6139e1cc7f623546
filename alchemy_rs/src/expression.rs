//! The externally visible form of a term.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;
use crate::parse::parse;
use crate::standardize::Standardization;
use crate::term::Term;

/// A term together with its standardized rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression {
    term: Term,
    rendered: String,
}

impl Expression {
    pub fn new(term: Term, standardization: Standardization) -> Self {
        let rendered = standardization.render(&term);
        Expression { term, rendered }
    }

    #[inline]
    pub fn term(&self) -> &Term {
        &self.term
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    pub fn into_term(self) -> Term {
        self.term
    }

    /// Re-render under another strategy.
    pub fn standardize(self, standardization: Standardization) -> Self {
        Expression::new(self.term, standardization)
    }
}

impl From<Term> for Expression {
    fn from(term: Term) -> Self {
        Expression::new(term, Standardization::default())
    }
}

impl FromStr for Expression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s).map(Expression::from)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.rendered)
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
