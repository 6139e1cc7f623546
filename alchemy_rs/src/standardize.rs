//! Term rendering with a selectable variable naming strategy.
//!
//! Bound variables always render as their de Bruijn index. The strategy only
//! changes how free variables are written:
//!
//! | strategy  | free variable `k` under `d` binders |
//! |-----------|-------------------------------------|
//! | `Prefix`  | `#k`                                |
//! | `Postfix` | `k#`                                |
//! | `None`    | `d + k`, the plain de Bruijn index  |
//!
//! Abstractions render as `λ.body` and applications as `f a`. The function is
//! parenthesized when it is an abstraction and the argument whenever it is
//! not a variable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::term::Term;

/// Marker placed before or after the id of a free variable.
pub const FREE_MARKER: char = '#';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Standardization {
    #[default]
    Prefix,
    Postfix,
    None,
}

impl Standardization {
    /// Render `term` to a string.
    pub fn render(self, term: &Term) -> String {
        let mut output = String::with_capacity(4 * term.size());
        self.render_into(term, 0, &mut output);
        output
    }

    fn render_into(self, term: &Term, binders: u32, output: &mut String) {
        match term {
            Term::Var(idx) => output.push_str(&idx.to_string()),
            Term::Free(id) => self.render_free(*id, binders, output),
            Term::Abs(body) => {
                output.push_str("λ.");
                self.render_into(body, binders + 1, output);
            }
            Term::App(func, arg) => {
                let need_func_parens = matches!(**func, Term::Abs(_));
                let need_arg_parens = !arg.is_leaf();

                if need_func_parens {
                    output.push('(');
                }
                self.render_into(func, binders, output);
                if need_func_parens {
                    output.push(')');
                }

                output.push(' ');

                if need_arg_parens {
                    output.push('(');
                }
                self.render_into(arg, binders, output);
                if need_arg_parens {
                    output.push(')');
                }
            }
        }
    }

    fn render_free(self, id: u32, binders: u32, output: &mut String) {
        match self {
            Standardization::Prefix => {
                output.push(FREE_MARKER);
                output.push_str(&id.to_string());
            }
            Standardization::Postfix => {
                output.push_str(&id.to_string());
                output.push(FREE_MARKER);
            }
            Standardization::None => output.push_str(&(binders + id).to_string()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Standardization::Prefix => "prefix",
            Standardization::Postfix => "postfix",
            Standardization::None => "none",
        }
    }
}

impl FromStr for Standardization {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prefix" => Ok(Standardization::Prefix),
            "postfix" => Ok(Standardization::Postfix),
            "none" => Ok(Standardization::None),
            other => Err(ConfigError::UnknownStandardization(other.to_string())),
        }
    }
}

impl fmt::Display for Standardization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Term {
        // λ.0 #1 (λ.#0 1)
        Term::abs(Term::app(
            Term::app(Term::var(0), Term::free(1)),
            Term::abs(Term::app(Term::free(0), Term::var(1))),
        ))
    }

    #[test]
    fn test_render_var() {
        assert_eq!(Standardization::Prefix.render(&Term::free(0)), "#0");
        assert_eq!(Standardization::Postfix.render(&Term::free(0)), "0#");
        assert_eq!(Standardization::None.render(&Term::free(0)), "0");
    }

    #[test]
    fn test_render_abs() {
        assert_eq!(Standardization::None.render(&Term::identity()), "λ.0");
    }

    #[test]
    fn test_render_app() {
        let id = Term::identity();
        let term = Term::app(id.clone(), id);
        assert_eq!(Standardization::Prefix.render(&term), "(λ.0) (λ.0)");

        let spine = Term::app(Term::app(Term::free(0), Term::free(1)), Term::free(2));
        assert_eq!(Standardization::Prefix.render(&spine), "#0 #1 #2");
    }

    #[test]
    fn test_strategies_differ_only_on_free_variables() {
        let term = sample();
        assert_eq!(Standardization::Prefix.render(&term), "λ.0 #1 (λ.#0 1)");
        assert_eq!(Standardization::Postfix.render(&term), "λ.0 1# (λ.0# 1)");
        assert_eq!(Standardization::None.render(&term), "λ.0 2 (λ.2 1)");

        let closed = Term::abs(Term::abs(Term::app(Term::var(1), Term::var(0))));
        let rendered: Vec<String> = [
            Standardization::Prefix,
            Standardization::Postfix,
            Standardization::None,
        ]
        .iter()
        .map(|s| s.render(&closed))
        .collect();
        assert!(rendered.iter().all(|r| r == "λ.λ.1 0"));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("prefix".parse::<Standardization>(), Ok(Standardization::Prefix));
        assert_eq!("postfix".parse::<Standardization>(), Ok(Standardization::Postfix));
        assert_eq!("none".parse::<Standardization>(), Ok(Standardization::None));
        assert!(matches!(
            "infix".parse::<Standardization>(),
            Err(ConfigError::UnknownStandardization(_))
        ));
    }
}
