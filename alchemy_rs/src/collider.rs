//! A single reaction between two terms.
//!
//! For every reaction rule `r`, the product of `a` and `b` is the normal form
//! of `r a b`. A collision fails as a whole if any product misses its normal
//! form within the reactor limits or trips one of the discard filters.

use std::fmt;

use tracing::trace;

use crate::config::Reactor;
use crate::error::CollisionError;
use crate::reduction::{Outcome, Reducer};
use crate::term::Term;

/// Products of a successful collision, one per rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub products: Vec<Term>,
    /// β-reductions spent on each product.
    pub reductions: Vec<usize>,
    /// Size of each `r a b` before reduction.
    pub sizes: Vec<usize>,
    pub left_size: usize,
    pub right_size: usize,
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, product) in self.products.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} ({} steps)", product, self.reductions[i])?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Collider {
    reducer: Reducer,
    rules: Vec<Term>,
    discard_identity: bool,
    discard_copy_actions: bool,
    discard_free_variable_expressions: bool,
}

impl Collider {
    pub fn from_reactor(reactor: &Reactor) -> Self {
        Collider {
            reducer: Reducer::new(reactor.reduction_limit, reactor.size_limit),
            rules: reactor.rules.clone(),
            discard_identity: reactor.discard_identity,
            discard_copy_actions: reactor.discard_copy_actions,
            discard_free_variable_expressions: reactor.discard_free_variable_expressions,
        }
    }

    pub fn collide(&self, left: &Term, right: &Term) -> Result<Reaction, CollisionError> {
        let mut products = Vec::with_capacity(self.rules.len());
        let mut reductions = Vec::with_capacity(self.rules.len());
        let mut sizes = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let expr = Term::app(Term::app(rule.clone(), left.clone()), right.clone());
            sizes.push(expr.size());

            let reduction = self.reducer.reduce(expr);
            trace!(steps = reduction.steps, outcome = ?reduction.outcome, "reduced product");
            match reduction.outcome {
                Outcome::NormalForm => {}
                Outcome::StepLimit => return Err(CollisionError::ExceedsReductionLimit),
                Outcome::SizeLimit => return Err(CollisionError::ExceedsSizeLimit),
            }

            let product = reduction.term;
            if self.discard_identity && product.is_identity() {
                return Err(CollisionError::IsIdentity);
            }
            if self.discard_copy_actions && (product == *left || product == *right) {
                return Err(CollisionError::IsParent);
            }
            if self.discard_free_variable_expressions && product.has_free_variables() {
                return Err(CollisionError::HasFreeVariables);
            }

            products.push(product);
            reductions.push(reduction.steps);
        }

        Ok(Reaction {
            products,
            reductions,
            sizes,
            left_size: left.size(),
            right_size: right.size(),
        })
    }
}
