//! The seam between the compiler and a script interpreter.

use camino::Utf8Path;

use crate::Result;
use crate::artifact::Artifact;
use crate::environment::ExecutionEnv;

/// Artifacts collected from one script run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Harvest {
    /// Artifacts bound to top-level names, in declaration order.
    pub declared: Vec<Artifact>,
    /// Explicitly registered artifacts not already in `declared`, in
    /// registration order.
    pub registered: Vec<Artifact>,
}

impl Harvest {
    /// All artifacts, declared first.
    #[must_use]
    pub fn into_artifacts(self) -> Vec<Artifact> {
        let mut artifacts = self.declared;
        artifacts.extend(self.registered);
        artifacts
    }

    /// Number of harvested artifacts.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.declared.len() + self.registered.len()
    }

    /// Returns `true` when nothing was harvested.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Executes one script inside an already scoped environment.
///
/// Implementations read the working directory, the module search path and
/// the value bindings from `env`. Any value scopes they open must be closed
/// again before returning.
pub trait ScriptRunner {
    /// Run the script at `path` and harvest its artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TerranetesError::Script`] for interpreter failures
    /// and [`crate::TerranetesError::Io`] when the script cannot be read.
    fn run(&self, path: &Utf8Path, env: &mut ExecutionEnv) -> Result<Harvest>;
}
