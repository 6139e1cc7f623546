//! Parallel runs of independent soups.
//!
//! Every run owns its generator, soup and RNGs, so runs share nothing and
//! results do not depend on the number of worker threads. The seed of run
//! `i` is derived from the base seed and `i`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::SoupSnapshot;
use crate::config::{Reactor, Seed, TreeGenConfig};
use crate::error::ConfigError;
use crate::generator::{Generator, TreeGenerator};
use crate::soup::Soup;
use crate::utils::encode_hex;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    pub soups: usize,
    pub expressions_per_soup: usize,
    pub steps: usize,
    /// Forms reported per snapshot.
    pub top: usize,
    pub generator: TreeGenConfig,
    pub reactor: Reactor,
    pub seed: Seed,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        EnsembleConfig {
            soups: 8,
            expressions_per_soup: 100,
            steps: 1000,
            top: 5,
            generator: TreeGenConfig::default(),
            reactor: Reactor::default(),
            seed: Seed::default(),
        }
    }
}

/// One finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleRun {
    pub index: usize,
    /// Hex seed of the run's soup.
    pub seed: String,
    pub snapshot: SoupSnapshot,
}

pub struct Ensemble {
    config: EnsembleConfig,
    base: Seed,
}

impl Ensemble {
    pub fn new(config: EnsembleConfig) -> Result<Self, ConfigError> {
        config.generator.validate()?;
        config.reactor.validate()?;
        // Fix the base seed once so every run derives from the same value.
        let base = Seed::from_bytes(config.seed.get());
        Ok(Ensemble { config, base })
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    pub fn base_seed(&self) -> Seed {
        self.base
    }

    /// Run every soup to completion. Results are in index order.
    pub fn run(&self) -> Result<Vec<EnsembleRun>, ConfigError> {
        self.run_until(&AtomicBool::new(false))
    }

    /// Like [`Ensemble::run`], handing `cancel` to every soup. Cancelled soups
    /// report the state they reached.
    pub fn run_until(&self, cancel: &AtomicBool) -> Result<Vec<EnsembleRun>, ConfigError> {
        let finished = AtomicUsize::new(0);
        debug!(soups = self.config.soups, steps = self.config.steps, "ensemble started");

        let runs = (0..self.config.soups)
            .into_par_iter()
            .map(|index| {
                let run = self.run_one(index, cancel)?;
                let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
                info!(index, done, total = self.config.soups, "soup finished");
                Ok(run)
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        debug!(soups = runs.len(), "ensemble finished");
        Ok(runs)
    }

    fn run_one(&self, index: usize, cancel: &AtomicBool) -> Result<EnsembleRun, ConfigError> {
        // Generator and soup draw from different streams of the same run.
        let seed = self.base.derive(2 * index as u64);
        let generator_config = TreeGenConfig {
            seed: self.base.derive(2 * index as u64 + 1),
            ..self.config.generator.clone()
        };
        let reactor = Reactor {
            seed,
            ..self.config.reactor.clone()
        };

        let mut generator = TreeGenerator::from_config(&generator_config)?;
        let mut soup = Soup::from_config(&reactor)?;

        soup.perturb(generator.generate_n(self.config.expressions_per_soup));
        soup.simulate_until(self.config.steps, false, cancel);

        Ok(EnsembleRun {
            index,
            seed: encode_hex(&soup.seed()),
            snapshot: soup.snapshot(self.config.top),
        })
    }
}
