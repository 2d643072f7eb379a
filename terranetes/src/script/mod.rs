//! Script discovery, compilation and the embedded Lua runner.
//!
//! A script is a Lua chunk with the `.tn` extension. [`Compiler::compile`]
//! runs it inside a scoped [`crate::environment::ExecutionEnv`] and harvests
//! the contexts it produced as [`crate::artifact::Artifact`]s;
//! [`Compiler::render`] writes them.

mod compiler;
mod discovery;
mod library;
pub mod lua;
mod runner;
mod unit;

pub use compiler::{Compiler, FILE_KEY};
pub use discovery::{DEFAULT_EXTENSION, discover, is_script};
pub use library::{DEFAULT_LIBRARY_DIR, DEFAULT_MAX_DEPTH, LibraryResolver};
pub use runner::{Harvest, ScriptRunner};
pub use unit::ScriptUnit;

#[cfg(test)]
mod tests;
