//! Depth-bounded stochastic term generation.
//!
//! Terms grow top-down. At every node fresh abstraction and application
//! probabilities are drawn from their configured ranges, so the branching
//! ratio varies within a term as well as between terms. Depth counts edges
//! from the root: no leaf appears above `min_depth` and every node at
//! `max_depth` is a leaf.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::StochasticGenConfig;
use crate::error::ConfigError;
use crate::generator::{FreeVarBudget, Generator};
use crate::standardize::Standardization;
use crate::term::Term;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Abs,
    App,
    Leaf,
}

pub struct StochasticDepthGenerator {
    config: StochasticGenConfig,
    seed: [u8; 32],
    rng: ChaCha8Rng,
}

impl StochasticDepthGenerator {
    pub fn new() -> Self {
        let config = StochasticGenConfig::default();
        let (seed, rng) = config.seed.rng();
        StochasticDepthGenerator { config, seed, rng }
    }

    pub fn from_config(config: &StochasticGenConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (seed, rng) = config.seed.rng();
        debug!(
            min_depth = config.min_depth,
            max_depth = config.max_depth,
            abstraction_range = ?config.abstraction_range,
            application_range = ?config.application_range,
            "stochastic depth generator ready"
        );
        Ok(StochasticDepthGenerator {
            config: config.clone(),
            seed,
            rng,
        })
    }

    pub fn config(&self) -> &StochasticGenConfig {
        &self.config
    }

    pub fn seed(&self) -> [u8; 32] {
        self.seed
    }

    fn choose(&mut self, depth: u32) -> Node {
        if depth >= self.config.max_depth {
            return Node::Leaf;
        }
        // Without free variables a leaf needs a binder above it.
        if depth == 0 && self.config.max_free_vars == 0 {
            return Node::Abs;
        }

        let (abs_low, abs_high) = self.config.abstraction_range;
        let (app_low, app_high) = self.config.application_range;
        let p_abs: f64 = self.rng.gen_range(abs_low..=abs_high);
        let p_app: f64 = self.rng.gen_range(app_low..=app_high);

        if depth < self.config.min_depth {
            let total = p_abs + p_app;
            let abs_share = if total > 0.0 { p_abs / total } else { 0.5 };
            return if self.rng.gen_bool(abs_share.clamp(0.0, 1.0)) {
                Node::Abs
            } else {
                Node::App
            };
        }

        let p_app = p_app.min(1.0 - p_abs);
        let coin: f64 = self.rng.gen();
        if coin < p_abs {
            Node::Abs
        } else if coin < p_abs + p_app {
            Node::App
        } else {
            Node::Leaf
        }
    }

    fn rand_lambda(&mut self, depth: u32, binders: u32, budget: &mut FreeVarBudget) -> Term {
        match self.choose(depth) {
            Node::Abs => Term::abs(self.rand_lambda(depth + 1, binders + 1, budget)),
            Node::App => {
                let func = self.rand_lambda(depth + 1, binders, budget);
                let arg = self.rand_lambda(depth + 1, binders, budget);
                Term::app(func, arg)
            }
            Node::Leaf => budget.leaf(&mut self.rng, binders),
        }
    }
}

impl Default for StochasticDepthGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for StochasticDepthGenerator {
    fn generate_term(&mut self) -> Term {
        let mut budget = FreeVarBudget::new(
            self.config.free_variable_probability,
            self.config.max_free_vars,
        );
        self.rand_lambda(0, 0, &mut budget)
    }

    fn standardization(&self) -> Standardization {
        self.config.standardization
    }
}
