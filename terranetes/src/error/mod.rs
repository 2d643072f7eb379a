//! Error types produced by the generation pipeline.

mod constructors;
mod types;

pub use types::{DuplicateBlock, SourceFormat, TerranetesError};

/// Result alias used across the crate.
pub type Result<T, E = TerranetesError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests;
