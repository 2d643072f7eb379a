//! End-to-end generation: discover, compile and render every script.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::environment::ExecutionEnv;
use crate::merge::merge_map;
use crate::script::{Compiler, LibraryResolver, ScriptUnit};
use crate::settings::Settings;
use crate::values::{ValueStack, values_from_env, values_from_files};
use crate::{Result, TerranetesError};

/// Drives a [`Compiler`] over a file or directory tree.
///
/// Every call to [`Pipeline::generate`] builds its own
/// [`ExecutionEnv`], so one pipeline can be run repeatedly.
///
/// # Examples
///
/// ```rust,no_run
/// use camino::Utf8Path;
/// use terranetes::pipeline::Pipeline;
/// use terranetes::settings::Settings;
///
/// let pipeline = Pipeline::from_settings(&Settings::default());
/// for path in pipeline.generate(Utf8Path::new("infra"))? {
///     println!("wrote {path}");
/// }
/// # Ok::<_, terranetes::TerranetesError>(())
/// ```
#[derive(Debug)]
pub struct Pipeline {
    compiler: Compiler,
    root_values: Map<String, Value>,
    values_file: Option<String>,
    values_from_env: bool,
}

impl Pipeline {
    /// Pipeline around `compiler` with no seeded values.
    #[must_use]
    pub fn new(compiler: Compiler) -> Self {
        Self {
            compiler,
            root_values: Map::new(),
            values_file: None,
            values_from_env: false,
        }
    }

    /// Pipeline configured from `settings` with the Lua runner.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let compiler = Compiler::lua(settings.strict)
            .with_extension(settings.script_extension.clone())
            .with_library(LibraryResolver::new(
                settings.library_dir_name.clone(),
                settings.max_library_depth,
            ));
        Self::new(compiler)
            .with_values_from_files(
                settings
                    .values_from_files
                    .then(|| settings.values_file_name.clone()),
            )
            .with_values_from_env(settings.values_from_env)
    }

    /// Values bound in the root scope of every run. They take precedence
    /// over values files and the environment.
    #[must_use]
    pub fn with_root_values(mut self, values: Map<String, Value>) -> Self {
        self.root_values = values;
        self
    }

    /// Seed values from files called `file_name` at and above the root.
    #[must_use]
    pub fn with_values_from_files(mut self, file_name: Option<String>) -> Self {
        self.values_file = file_name;
        self
    }

    /// Seed values from the process environment.
    #[must_use]
    pub const fn with_values_from_env(mut self, enabled: bool) -> Self {
        self.values_from_env = enabled;
        self
    }

    /// Compiler used for every unit.
    #[must_use]
    pub const fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    /// Compile every script under `root` without writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`TerranetesError::Discovery`] when `root` does not exist and
    /// the first unit error, wrapped in [`TerranetesError::Unit`].
    pub fn compile(&self, root: &Utf8Path) -> Result<Vec<ScriptUnit>> {
        let (scripts, mut env) = self.prepare(root)?;
        scripts
            .iter()
            .map(|script| {
                self.compiler
                    .compile(script, &mut env)
                    .map_err(|err| err.in_unit(script))
            })
            .collect()
    }

    /// Compile and render every script under `root`, in discovery order,
    /// stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`TerranetesError::Discovery`] when `root` does not exist and
    /// the first unit error, wrapped in [`TerranetesError::Unit`].
    pub fn generate(&self, root: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
        let (scripts, mut env) = self.prepare(root)?;
        let mut written = Vec::new();
        for script in &scripts {
            let paths = self
                .compiler
                .compile(script, &mut env)
                .and_then(|unit| self.compiler.render(&unit, &mut env))
                .map_err(|err| err.in_unit(script))?;
            written.extend(paths);
        }
        info!(root = %root, units = scripts.len(), files = written.len(), "generation finished");
        Ok(written)
    }

    fn prepare(&self, root: &Utf8Path) -> Result<(Vec<Utf8PathBuf>, ExecutionEnv)> {
        let resolved = root
            .canonicalize_utf8()
            .map_err(|_| TerranetesError::Discovery {
                path: root.to_path_buf(),
            })?;
        let working_dir = if resolved.is_file() {
            resolved.parent().map_or_else(|| resolved.clone(), Utf8Path::to_path_buf)
        } else {
            resolved.clone()
        };

        let values = self.root_values(&working_dir)?;
        let env = ExecutionEnv::new(working_dir).with_values(ValueStack::with_root(values));
        let scripts = self.compiler.discover(&resolved)?;
        debug!(root = %resolved, scripts = scripts.len(), "prepared run");
        Ok((scripts, env))
    }

    fn root_values(&self, working_dir: &Utf8Path) -> Result<Map<String, Value>> {
        let mut values = Map::new();
        if self.values_from_env {
            merge_map(&mut values, values_from_env());
        }
        if let Some(file_name) = &self.values_file {
            merge_map(&mut values, values_from_files(working_dir, file_name)?);
        }
        merge_map(&mut values, self.root_values.clone());
        Ok(values)
    }
}
