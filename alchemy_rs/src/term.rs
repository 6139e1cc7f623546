//! Lambda calculus term representation.
//!
//! Bound variables are 0-based de Bruijn indices: `Var(0)` refers to the
//! nearest enclosing abstraction. Free variables are tagged explicitly with
//! `Free(id)` and are never captured by substitution.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::standardize::Standardization;

/// An immutable lambda term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Var(u32),
    Free(u32),
    Abs(Box<Term>),
    App(Box<Term>, Box<Term>),
}

impl Term {
    #[inline]
    pub fn var(index: u32) -> Self {
        Term::Var(index)
    }

    #[inline]
    pub fn free(id: u32) -> Self {
        Term::Free(id)
    }

    #[inline]
    pub fn abs(body: Term) -> Self {
        Term::Abs(Box::new(body))
    }

    #[inline]
    pub fn app(func: Term, arg: Term) -> Self {
        Term::App(Box::new(func), Box::new(arg))
    }

    /// `λ.0`
    pub fn identity() -> Self {
        Term::abs(Term::var(0))
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Term::Var(_) | Term::Free(_))
    }

    /// Compute term size (number of nodes)
    pub fn size(&self) -> usize {
        match self {
            Term::Var(_) | Term::Free(_) => 1,
            Term::Abs(body) => 1 + body.size(),
            Term::App(func, arg) => 1 + func.size() + arg.size(),
        }
    }

    /// Compute term depth (nodes on the longest root-to-leaf path)
    pub fn depth(&self) -> usize {
        match self {
            Term::Var(_) | Term::Free(_) => 1,
            Term::Abs(body) => 1 + body.depth(),
            Term::App(func, arg) => 1 + func.depth().max(arg.depth()),
        }
    }

    /// Number of edges between the root and the shallowest leaf.
    pub fn min_leaf_depth(&self) -> usize {
        match self {
            Term::Var(_) | Term::Free(_) => 0,
            Term::Abs(body) => 1 + body.min_leaf_depth(),
            Term::App(func, arg) => 1 + func.min_leaf_depth().min(arg.min_leaf_depth()),
        }
    }

    /// Number of edges between the root and the deepest leaf.
    pub fn max_leaf_depth(&self) -> usize {
        self.depth() - 1
    }

    /// Distinct free variable ids, ascending.
    pub fn free_variables(&self) -> BTreeSet<u32> {
        fn collect(term: &Term, out: &mut BTreeSet<u32>) {
            match term {
                Term::Free(id) => {
                    out.insert(*id);
                }
                Term::Var(_) => {}
                Term::Abs(body) => collect(body, out),
                Term::App(func, arg) => {
                    collect(func, out);
                    collect(arg, out);
                }
            }
        }
        let mut out = BTreeSet::new();
        collect(self, &mut out);
        out
    }

    /// True if the term mentions a free variable, or a de Bruijn index that
    /// escapes its binders.
    pub fn has_free_variables(&self) -> bool {
        fn go(term: &Term, binders: u32) -> bool {
            match term {
                Term::Free(_) => true,
                Term::Var(idx) => *idx >= binders,
                Term::Abs(body) => go(body, binders + 1),
                Term::App(func, arg) => go(func, binders) || go(arg, binders),
            }
        }
        go(self, 0)
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        !self.has_free_variables()
    }

    /// Every `Var(i)` sits under more than `i` abstractions.
    pub fn is_well_formed(&self) -> bool {
        fn go(term: &Term, binders: u32) -> bool {
            match term {
                Term::Free(_) => true,
                Term::Var(idx) => *idx < binders,
                Term::Abs(body) => go(body, binders + 1),
                Term::App(func, arg) => go(func, binders) && go(arg, binders),
            }
        }
        go(self, 0)
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Term::Abs(body) if **body == Term::Var(0))
    }

    /// Bind every free variable with fresh outer abstractions. `Free(k)`
    /// becomes the `k`-th new binder, counting outward.
    pub fn close(&self) -> Term {
        fn go(term: &Term, binders: u32) -> Term {
            match term {
                Term::Free(id) => Term::Var(binders + id),
                Term::Var(idx) => Term::Var(*idx),
                Term::Abs(body) => Term::abs(go(body, binders + 1)),
                Term::App(func, arg) => Term::app(go(func, binders), go(arg, binders)),
            }
        }
        let outer = self.free_variables().last().map_or(0, |max| max + 1);
        (0..outer).fold(go(self, 0), |body, _| Term::abs(body))
    }

    /// Render with the given standardization.
    pub fn render(&self, standardization: Standardization) -> String {
        standardization.render(self)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Standardization::default().render(self))
    }
}

/// Terms serialize as their prefix rendering.
impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Term {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        crate::parse::parse(&s).map_err(serde::de::Error::custom)
    }
}
