#![doc = include_str!("../README.md")]

/// Glue for coverage-guided fuzzers that accept a custom mutator
pub mod bridge;
/// Interesting values that can be used during mutations
mod dictionary;
/// The mutation engine
mod engine;
/// Error types
mod error;
/// C ABI for creating, configuring and running engines
pub mod exports;
/// Individual mutators and weighted mutator selection
mod mutate;
/// Engine and driver configuration
mod options;
/// Mutation patterns and block splitting
mod patterns;
/// Small random helpers shared by the mutators
mod random;
/// Weakly linked imports
mod weak_imports;

pub use engine::{Catalog, CatalogEntry, Engine};
pub use error::{Error, Result};
pub use mutate::{MutationStrategy, Mutations, Mutator, DEFAULT_MUTATIONS};
pub use options::{Command, EngineOptions, RuntimeOptions};
pub use patterns::{Pattern, PatternType, Patterns, DEFAULT_PATTERNS};
