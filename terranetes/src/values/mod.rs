//! Hierarchical value bindings visible to scripts.
//!
//! A [`ValueStack`] lives in the execution environment of one pipeline run.
//! Layers can be seeded from `values.yaml` files up the directory tree and
//! from the process environment.

mod env;
mod files;
mod stack;

pub use env::{values_from_env, values_from_vars};
pub use files::{DEFAULT_VALUES_FILE, values_from_files};
pub use stack::{Overrides, ScopeGuard, ValueStack};

#[cfg(test)]
mod tests;
