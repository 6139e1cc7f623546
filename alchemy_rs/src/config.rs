//! Configuration for generators and reactors.
//!
//! Every struct here is plain data with a `Default` and serde support, so a
//! configuration can be built in code, from CLI flags, or read from JSON.
//! Validation happens when a generator or soup is constructed from it.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ConfigError, FormatError};
use crate::standardize::Standardization;
use crate::term::Term;
use crate::utils::{decode_hex, encode_hex};

/// A 32-byte RNG seed. `Seed(None)` draws fresh entropy when used.
///
/// Serialized as a 64 character hex string, or `null`. Also read from an
/// integer, as with [`Seed::from_u64`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(into = "Option<String>")]
pub struct Seed(pub Option<[u8; 32]>);

impl Seed {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Seed(Some(bytes))
    }

    /// Expand a `u64` into a full seed (little-endian, zero padded).
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&value.to_le_bytes());
        Seed(Some(bytes))
    }

    pub fn from_hex(s: &str) -> Result<Self, ConfigError> {
        let bytes = decode_hex(s)?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| FormatError::WrongLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Seed(Some(bytes)))
    }

    pub fn to_hex(&self) -> Option<String> {
        self.0.as_ref().map(|bytes| encode_hex(bytes))
    }

    /// The seed bytes, drawing from the thread RNG when unset.
    pub fn get(&self) -> [u8; 32] {
        self.0.unwrap_or_else(|| rand::thread_rng().gen())
    }

    /// Derive the seed of the `index`-th member of a family of runs.
    pub fn derive(&self, index: u64) -> Seed {
        let mut bytes = self.get();
        let mut word = [0u8; 8];
        word.copy_from_slice(&bytes[..8]);
        let mixed = u64::from_le_bytes(word)
            .wrapping_add(index)
            .wrapping_mul(0x9e3779b97f4a7c15);
        bytes[..8].copy_from_slice(&mixed.to_le_bytes());
        Seed(Some(bytes))
    }

    pub fn rng(&self) -> ([u8; 32], ChaCha8Rng) {
        let bytes = self.get();
        (bytes, ChaCha8Rng::from_seed(bytes))
    }
}

impl<'de> Deserialize<'de> for Seed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Int(u64),
            Hex(String),
        }

        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(Seed(None)),
            Some(Repr::Int(value)) => Ok(Seed::from_u64(value)),
            Some(Repr::Hex(s)) => Seed::from_hex(&s).map_err(serde::de::Error::custom),
        }
    }
}

impl From<Seed> for Option<String> {
    fn from(seed: Seed) -> Self {
        seed.to_hex()
    }
}

pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { name, value })
    }
}

pub(crate) fn check_range(name: &'static str, (low, high): (f64, f64)) -> Result<(), ConfigError> {
    check_probability(name, low)?;
    check_probability(name, high)?;
    if low > high {
        return Err(ConfigError::InvalidRange { name, low, high });
    }
    Ok(())
}

/// Configuration of the binary-tree generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeGenConfig {
    /// Exact number of nodes in every generated term.
    pub size: usize,
    pub freevar_probability: f64,
    pub max_free_vars: u32,
    pub standardization: Standardization,
    pub seed: Seed,
}

impl Default for TreeGenConfig {
    fn default() -> Self {
        TreeGenConfig {
            size: 20,
            freevar_probability: 0.5,
            max_free_vars: 3,
            standardization: Standardization::Prefix,
            seed: Seed::default(),
        }
    }
}

impl TreeGenConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size < 1 {
            return Err(ConfigError::InvalidSize(self.size));
        }
        check_probability("freevar_probability", self.freevar_probability)?;
        if self.size == 1 && self.max_free_vars == 0 {
            return Err(ConfigError::Unsatisfiable(
                "a term of size 1 is a lone variable and must be free",
            ));
        }
        Ok(())
    }
}

/// Configuration of the depth-bounded stochastic generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StochasticGenConfig {
    pub abstraction_range: (f64, f64),
    pub application_range: (f64, f64),
    pub min_depth: u32,
    pub max_depth: u32,
    pub free_variable_probability: f64,
    pub max_free_vars: u32,
    pub standardization: Standardization,
    pub seed: Seed,
}

impl Default for StochasticGenConfig {
    fn default() -> Self {
        StochasticGenConfig {
            abstraction_range: (0.3, 0.5),
            application_range: (0.3, 0.5),
            min_depth: 1,
            max_depth: 8,
            free_variable_probability: 0.1,
            max_free_vars: 3,
            standardization: Standardization::Prefix,
            seed: Seed::default(),
        }
    }
}

impl StochasticGenConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("abstraction_range", self.abstraction_range)?;
        check_range("application_range", self.application_range)?;
        check_probability("free_variable_probability", self.free_variable_probability)?;
        if self.min_depth > self.max_depth {
            return Err(ConfigError::DepthOrder {
                min: self.min_depth,
                max: self.max_depth,
            });
        }
        if self.max_depth == 0 && self.max_free_vars == 0 {
            return Err(ConfigError::Unsatisfiable(
                "max_depth 0 admits only a lone variable, which must be free",
            ));
        }
        Ok(())
    }
}

/// How the two reactants of a round are picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Every member is equally likely.
    #[default]
    Uniform,
    /// Members are picked with probability proportional to their size.
    SizeWeighted,
}

/// What a reaction round does to the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Replacement {
    /// The first product takes the place of the argument reactant.
    #[default]
    Parent,
    /// Each product takes the place of a uniformly random member.
    Random,
    /// Both reactants leave the soup and the products join it. For every
    /// product a random member is then removed if the population size is
    /// maintained. Reactants return afterwards unless they are discarded,
    /// in which case failed rounds consume them too.
    Additive {
        #[serde(default)]
        maintain_constant_population_size: bool,
        #[serde(default)]
        discard_parents: bool,
    },
}

/// Reaction semantics of a soup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Reactor {
    /// Maximum β-reductions per product.
    pub reduction_limit: usize,
    /// Maximum node count of a term during reduction.
    pub size_limit: usize,
    /// Each rule `r` turns reactants `a` and `b` into the normal form of `r a b`.
    pub rules: Vec<Term>,
    pub selection: Selection,
    pub replacement: Replacement,
    pub discard_identity: bool,
    pub discard_copy_actions: bool,
    pub discard_free_variable_expressions: bool,
    pub standardization: Standardization,
    pub seed: Seed,
}

impl Default for Reactor {
    fn default() -> Self {
        Reactor {
            reduction_limit: 512,
            size_limit: 1000,
            // λ.λ.1 0: apply the left reactant to the right one
            rules: vec![Term::abs(Term::abs(Term::app(Term::var(1), Term::var(0))))],
            selection: Selection::Uniform,
            replacement: Replacement::Parent,
            discard_identity: false,
            discard_copy_actions: false,
            discard_free_variable_expressions: false,
            standardization: Standardization::Prefix,
            seed: Seed::default(),
        }
    }
}

impl Reactor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reduction_limit == 0 {
            return Err(ConfigError::InvalidReactor {
                name: "reduction_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.size_limit == 0 {
            return Err(ConfigError::InvalidReactor {
                name: "size_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.rules.is_empty() {
            return Err(ConfigError::InvalidReactor {
                name: "rules",
                reason: "at least one reaction rule is required".to_string(),
            });
        }
        if let Some(rule) = self.rules.iter().find(|r| !r.is_well_formed() || !r.is_closed()) {
            return Err(ConfigError::InvalidReactor {
                name: "rules",
                reason: format!("rule {} is not a closed term", rule),
            });
        }
        Ok(())
    }
}
