//! Algorithmic chemistry on lambda calculus terms.
//!
//! This library provides:
//! - A de Bruijn term representation with explicit free variables
//! - Standardized rendering (prefix, postfix or raw free variables) and a parser
//! - Random term generation, by exact size or under depth bounds
//! - Normal-order reduction with step and size limits
//! - A soup of expressions reacting pairwise, with population statistics
//! - Parallel ensembles of isolated soups
//!
//! # Example
//!
//! ```
//! use alchemy_rs::{Generator, Reactor, Seed, Soup, TreeGenConfig, TreeGenerator};
//!
//! let mut generator = TreeGenerator::from_config(&TreeGenConfig {
//!     size: 6,
//!     freevar_probability: 0.3,
//!     max_free_vars: 3,
//!     seed: Seed::from_u64(1),
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let mut soup = Soup::from_config(&Reactor::default()).unwrap();
//! soup.perturb(generator.generate_n(10));
//! soup.simulate_for(25, false);
//! assert_eq!(soup.len(), 10);
//! ```

pub mod analysis;
pub mod collider;
pub mod config;
pub mod ensemble;
pub mod error;
pub mod expression;
pub mod generator;
pub mod parse;
pub mod reduction;
pub mod soup;
pub mod standardize;
pub mod stochastic;
pub mod term;
pub mod utils;

pub use analysis::SoupSnapshot;
pub use collider::{Collider, Reaction};
pub use config::{Reactor, Replacement, Seed, Selection, StochasticGenConfig, TreeGenConfig};
pub use ensemble::{Ensemble, EnsembleConfig, EnsembleRun};
pub use error::{CollisionError, ConfigError, FormatError, ParseError};
pub use expression::Expression;
pub use generator::{Generator, TreeGenerator};
pub use parse::parse;
pub use reduction::{Outcome, Reducer, Reduction};
pub use soup::{Soup, SoupState, Tape};
pub use standardize::Standardization;
pub use stochastic::StochasticDepthGenerator;
pub use term::Term;
pub use utils::{decode_hex, encode_hex};
