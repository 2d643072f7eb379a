//! Library facade for the `terranetes` binary so integration tests can drive
//! commands without spawning a process.
//!
//! `generate` renders every script under the given paths once; `watch`
//! regenerates scripts as they change until interrupted.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod watch;
