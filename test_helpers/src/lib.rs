//! Test helpers shared across crates.
//!
//! This crate provides environment variable guards and a temporary fixture
//! tree for laying out scripts, library directories and values files.

pub mod env;
pub mod tree;

pub use tree::FixtureTree;
