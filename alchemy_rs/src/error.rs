//! Error types.
//!
//! Construction of generators, reactors and seeds is fallible and reports a
//! [`ConfigError`]. Generation and simulation are total once construction has
//! succeeded.

use serde::Serialize;
use thiserror::Error;

/// Invalid configuration, raised synchronously at construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("term size must be at least 1, got {0}")]
    InvalidSize(usize),

    #[error("probability `{name}` must lie in [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },

    #[error("range `{name}` is malformed: ({low}, {high})")]
    InvalidRange {
        name: &'static str,
        low: f64,
        high: f64,
    },

    #[error("minimum depth {min} exceeds maximum depth {max}")]
    DepthOrder { min: u32, max: u32 },

    #[error("no closed term satisfies this configuration: {0}")]
    Unsatisfiable(&'static str),

    #[error("unknown standardization `{0}` (expected prefix, postfix or none)")]
    UnknownStandardization(String),

    #[error("reactor parameter `{name}` is invalid: {reason}")]
    InvalidReactor { name: &'static str, reason: String },

    #[error("invalid seed: {0}")]
    Seed(#[from] FormatError),
}

/// Malformed hexadecimal input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("hex string has odd length {0}")]
    OddLength(usize),

    #[error("invalid hex character {character:?} at index {index}")]
    InvalidCharacter { character: char, index: usize },

    #[error("expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// A rendered expression that could not be read back into a term.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at offset {position}: {reason}")]
pub struct ParseError {
    pub position: usize,
    pub reason: String,
}

impl ParseError {
    pub fn new(position: usize, reason: impl Into<String>) -> Self {
        ParseError {
            position,
            reason: reason.into(),
        }
    }
}

/// Why a reaction round produced nothing. Never surfaced from a simulation;
/// the round is simply discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionError {
    #[error("collision exceeds reduction limit")]
    ExceedsReductionLimit,

    #[error("expression exceeds size limit during reduction")]
    ExceedsSizeLimit,

    #[error("collision result is identity function")]
    IsIdentity,

    #[error("collision result is isomorphic to parent")]
    IsParent,

    #[error("collision result has free variables")]
    HasFreeVariables,
}
