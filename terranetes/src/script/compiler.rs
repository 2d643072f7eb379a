//! Script compilation and rendering inside scoped environments.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use super::discovery::{self, DEFAULT_EXTENSION};
use super::library::LibraryResolver;
use super::lua::LuaRunner;
use super::runner::ScriptRunner;
use super::unit::ScriptUnit;
use crate::environment::{EnvScope, ExecutionEnv};
use crate::render::write_artifact;
use crate::values::Overrides;
use crate::{IoResultExt, Result};

/// Key bound to the path of the script being compiled.
pub const FILE_KEY: &str = "__file__";

/// Compiles scripts into [`ScriptUnit`]s and renders them.
pub struct Compiler {
    runner: Box<dyn ScriptRunner>,
    library: LibraryResolver,
    extension: String,
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("library", &self.library)
            .field("extension", &self.extension)
            .finish_non_exhaustive()
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::lua(false)
    }
}

impl Compiler {
    /// Compiler driving `runner` with default discovery settings.
    #[must_use]
    pub fn new(runner: impl ScriptRunner + 'static) -> Self {
        Self {
            runner: Box::new(runner),
            library: LibraryResolver::default(),
            extension: DEFAULT_EXTENSION.to_owned(),
        }
    }

    /// Compiler backed by the embedded Lua runner.
    ///
    /// `strict` is the default duplicate policy of Terraform contexts.
    #[must_use]
    pub fn lua(strict: bool) -> Self {
        Self::new(LuaRunner::new().with_strict(strict))
    }

    /// Replace the library directory resolver.
    #[must_use]
    pub fn with_library(mut self, library: LibraryResolver) -> Self {
        self.library = library;
        self
    }

    /// Replace the script extension, given without the leading dot.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Script extension.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// List the scripts under `root`.
    ///
    /// # Errors
    ///
    /// See [`discovery::discover`].
    pub fn discover(&self, root: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
        discovery::discover(root, &self.extension)
    }

    /// Run the script at `path` and collect its artifacts.
    ///
    /// While the script runs, `__file__` is bound to its absolute path, the
    /// working directory is the script's directory and the library
    /// directory heads the module search path. `env` is restored on return.
    ///
    /// # Errors
    ///
    /// Propagates I/O, library resolution and script errors.
    pub fn compile(&self, path: &Utf8Path, env: &mut ExecutionEnv) -> Result<ScriptUnit> {
        let resolved = env.resolve(path);
        let script = resolved.canonicalize_utf8().with_path(&resolved)?;
        let base_dir = script
            .parent()
            .map_or_else(|| env.working_dir().to_path_buf(), Utf8Path::to_path_buf);
        let library_dir = self.library.resolve(&base_dir)?;

        let mut scoped = env.enter(unit_scope(&script, &base_dir, library_dir.clone()));
        let harvest = self.runner.run(&script, &mut scoped)?;
        debug!(
            script = %script,
            declared = harvest.declared.len(),
            registered = harvest.registered.len(),
            "harvested artifacts"
        );
        Ok(ScriptUnit::new(
            script,
            base_dir,
            library_dir,
            harvest.into_artifacts(),
        ))
    }

    /// Write every artifact of `unit`, in order.
    ///
    /// Relative outputs resolve against the unit's base directory.
    ///
    /// # Errors
    ///
    /// Propagates the first render or write error.
    pub fn render(&self, unit: &ScriptUnit, env: &mut ExecutionEnv) -> Result<Vec<Utf8PathBuf>> {
        let scoped = env.enter(unit_scope(
            unit.path(),
            unit.base_dir(),
            unit.library_dir().map(Utf8Path::to_path_buf),
        ));
        unit.artifacts()
            .iter()
            .map(|artifact| write_artifact(artifact, &scoped))
            .collect()
    }
}

fn unit_scope(path: &Utf8Path, base_dir: &Utf8Path, library_dir: Option<Utf8PathBuf>) -> EnvScope {
    EnvScope::new()
        .working_dir(base_dir)
        .library_dir(library_dir)
        .values(Overrides::new().set(FILE_KEY, path.as_str()))
}
