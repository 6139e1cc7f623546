//! Random term generation.
//!
//! [`TreeGenerator`] produces terms of an exact size from a random binary
//! tree shape. [`StochasticDepthGenerator`](crate::StochasticDepthGenerator)
//! grows terms top-down under depth bounds. Both share the free variable
//! policy in [`FreeVarBudget`] and hand out [`Expression`]s through the
//! [`Generator`] trait.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::TreeGenConfig;
use crate::error::ConfigError;
use crate::expression::Expression;
use crate::standardize::Standardization;
use crate::term::Term;

pub trait Generator {
    /// Draw one raw term.
    fn generate_term(&mut self) -> Term;

    fn standardization(&self) -> Standardization;

    fn generate(&mut self) -> Expression {
        let term = self.generate_term();
        Expression::new(term, self.standardization())
    }

    /// `n` independent draws, in generation order.
    fn generate_n(&mut self, n: usize) -> Vec<Expression> {
        (0..n).map(|_| self.generate()).collect()
    }
}

/// Leaf policy shared by both generators.
///
/// A leaf wants a free variable with probability `p`, and always when no
/// abstraction encloses it. Wanted free variables are fresh while fewer than
/// `max` have been introduced into the current term. Past the cap, leaves are
/// bound, or reuse an introduced free variable when nothing binds them.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FreeVarBudget {
    p: f64,
    max: u32,
    introduced: u32,
}

impl FreeVarBudget {
    pub(crate) fn new(p: f64, max: u32) -> Self {
        FreeVarBudget {
            p,
            max,
            introduced: 0,
        }
    }

    pub(crate) fn leaf(&mut self, rng: &mut ChaCha8Rng, binders: u32) -> Term {
        let wants_free = binders == 0 || rng.gen_bool(self.p);
        if wants_free && self.introduced < self.max {
            let id = self.introduced;
            self.introduced += 1;
            return Term::free(id);
        }
        if binders > 0 {
            return Term::var(rng.gen_range(0..binders));
        }
        // Generators force a binder at the root when `max` is 0, so some free
        // variable has been introduced by now.
        Term::free(rng.gen_range(0..self.introduced.max(1)))
    }
}

/// Binary search tree over shuffled keys; only its shape is used.
struct BTree {
    n: u32,
    left: Option<Box<BTree>>,
    right: Option<Box<BTree>>,
}

impl BTree {
    fn new(n: u32) -> BTree {
        BTree {
            n,
            left: None,
            right: None,
        }
    }

    fn from_keys(keys: &[u32]) -> Option<BTree> {
        let (first, rest) = keys.split_first()?;
        let mut tree = BTree::new(*first);
        for key in rest {
            tree.insert(*key);
        }
        Some(tree)
    }

    fn insert(&mut self, n: u32) {
        let slot = if n <= self.n {
            &mut self.left
        } else {
            &mut self.right
        };
        match slot {
            Some(child) => child.insert(n),
            None => *slot = Some(Box::new(BTree::new(n))),
        }
    }

    /// Two children become an application, one an abstraction, none a leaf.
    fn to_term(&self, rng: &mut ChaCha8Rng, budget: &mut FreeVarBudget, binders: u32) -> Term {
        match (&self.left, &self.right) {
            (None, None) => budget.leaf(rng, binders),
            (Some(t), None) | (None, Some(t)) => Term::abs(t.to_term(rng, budget, binders + 1)),
            (Some(l), Some(r)) => {
                let func = l.to_term(rng, budget, binders);
                let arg = r.to_term(rng, budget, binders);
                Term::app(func, arg)
            }
        }
    }
}

/// Generates terms with exactly `size` nodes.
pub struct TreeGenerator {
    config: TreeGenConfig,
    seed: [u8; 32],
    rng: ChaCha8Rng,
}

impl TreeGenerator {
    pub fn new() -> Self {
        // The default configuration is known to be valid.
        let config = TreeGenConfig::default();
        let (seed, rng) = config.seed.rng();
        TreeGenerator { config, seed, rng }
    }

    pub fn from_config(config: &TreeGenConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (seed, rng) = config.seed.rng();
        debug!(
            size = config.size,
            freevar_probability = config.freevar_probability,
            max_free_vars = config.max_free_vars,
            standardization = %config.standardization,
            "tree generator ready"
        );
        Ok(TreeGenerator {
            config: config.clone(),
            seed,
            rng,
        })
    }

    pub fn config(&self) -> &TreeGenConfig {
        &self.config
    }

    /// The seed actually in use, even if the configuration left it unset.
    pub fn seed(&self) -> [u8; 32] {
        self.seed
    }
}

impl Default for TreeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for TreeGenerator {
    fn generate_term(&mut self) -> Term {
        let size = self.config.size as u32;
        let closed = self.config.max_free_vars == 0;
        // A closed term needs a binder above every leaf; spend one node on it.
        let keys = if closed { size - 1 } else { size };

        let mut permutation: Vec<u32> = (0..keys).collect();
        permutation.shuffle(&mut self.rng);

        let mut budget =
            FreeVarBudget::new(self.config.freevar_probability, self.config.max_free_vars);
        let binders = u32::from(closed);
        let body = match BTree::from_keys(&permutation) {
            Some(tree) => tree.to_term(&mut self.rng, &mut budget, binders),
            None => budget.leaf(&mut self.rng, binders),
        };
        if closed {
            Term::abs(body)
        } else {
            body
        }
    }

    fn standardization(&self) -> Standardization {
        self.config.standardization
    }
}
