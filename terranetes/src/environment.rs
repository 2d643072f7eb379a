//! Execution environment threaded through compilation and rendering.
//!
//! The effective working directory, the module search path and the value
//! stack live here instead of in process-global state. Scripts see paths
//! resolved against [`ExecutionEnv::working_dir`]; the process working
//! directory is never changed.

use std::ops::{Deref, DerefMut};

use camino::{Utf8Path, Utf8PathBuf};

use crate::values::{Overrides, ValueStack};

/// Working directory, module search path and value bindings of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionEnv {
    working_dir: Utf8PathBuf,
    search_path: Vec<Utf8PathBuf>,
    values: ValueStack,
}

/// Changes applied by [`ExecutionEnv::enter`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvScope {
    working_dir: Option<Utf8PathBuf>,
    library_dir: Option<Utf8PathBuf>,
    overrides: Overrides,
}

impl EnvScope {
    /// Scope that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `dir` as the effective working directory.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Put `dir` at the front of the module search path.
    #[must_use]
    pub fn library_dir(mut self, dir: Option<Utf8PathBuf>) -> Self {
        self.library_dir = dir;
        self
    }

    /// Value overrides for the new value scope.
    #[must_use]
    pub fn values(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }
}

impl ExecutionEnv {
    /// Environment rooted at `working_dir` with empty values.
    #[must_use]
    pub fn new(working_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            search_path: Vec::new(),
            values: ValueStack::default(),
        }
    }

    /// Replace the value stack.
    #[must_use]
    pub fn with_values(mut self, values: ValueStack) -> Self {
        self.values = values;
        self
    }

    /// Effective working directory.
    #[must_use]
    pub fn working_dir(&self) -> &Utf8Path {
        &self.working_dir
    }

    /// Module search path, highest priority first.
    #[must_use]
    pub fn search_path(&self) -> &[Utf8PathBuf] {
        &self.search_path
    }

    /// Value bindings.
    #[must_use]
    pub const fn values(&self) -> &ValueStack {
        &self.values
    }

    /// Mutable value bindings.
    pub const fn values_mut(&mut self) -> &mut ValueStack {
        &mut self.values
    }

    /// Take the value stack out, leaving an empty one behind.
    pub(crate) fn take_values(&mut self) -> ValueStack {
        std::mem::take(&mut self.values)
    }

    /// Put back a value stack taken with [`Self::take_values`].
    pub(crate) fn restore_values(&mut self, values: ValueStack) {
        self.values = values;
    }

    /// Resolve `path` against the effective working directory.
    #[must_use]
    pub fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }

    /// Apply `scope` and return a guard restoring every field on drop.
    pub fn enter(&mut self, scope: EnvScope) -> EnvGuard<'_> {
        let saved_dir = self.working_dir.clone();
        let saved_search_path = self.search_path.clone();
        let value_depth = self.values.depth();

        if let Some(dir) = scope.working_dir {
            self.working_dir = dir;
        }
        if let Some(dir) = scope.library_dir {
            self.search_path.insert(0, dir);
        }
        self.values.push(scope.overrides);

        EnvGuard {
            env: self,
            saved_dir,
            saved_search_path,
            value_depth,
        }
    }
}

/// Guard returned by [`ExecutionEnv::enter`].
#[derive(Debug)]
#[must_use = "the scope is exited as soon as the guard is dropped"]
pub struct EnvGuard<'a> {
    env: &'a mut ExecutionEnv,
    saved_dir: Utf8PathBuf,
    saved_search_path: Vec<Utf8PathBuf>,
    value_depth: usize,
}

impl Deref for EnvGuard<'_> {
    type Target = ExecutionEnv;

    fn deref(&self) -> &Self::Target {
        self.env
    }
}

impl DerefMut for EnvGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.env
    }
}

impl Drop for EnvGuard<'_> {
    fn drop(&mut self) {
        self.env.working_dir = std::mem::take(&mut self.saved_dir);
        self.env.search_path = std::mem::take(&mut self.saved_search_path);
        self.env.values.restore_to(self.value_depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn guard_restores_every_field() {
        let mut env = ExecutionEnv::new("/work");
        {
            let guard = env.enter(
                EnvScope::new()
                    .working_dir("/work/app")
                    .library_dir(Some(Utf8PathBuf::from("/work/terranetes")))
                    .values(Overrides::new().set("__file__", "/work/app/main.tn")),
            );
            assert_eq!(guard.working_dir().as_str(), "/work/app");
            assert_eq!(guard.search_path(), [Utf8PathBuf::from("/work/terranetes")]);
            assert_eq!(
                guard.values().get("__file__"),
                Some(&json!("/work/app/main.tn"))
            );
            assert_eq!(guard.resolve(Utf8Path::new("out.json")), "/work/app/out.json");
        }
        assert_eq!(env.working_dir().as_str(), "/work");
        assert!(env.search_path().is_empty());
        assert_eq!(env.values().get("__file__"), None);
        assert_eq!(env.values().depth(), 1);
    }

    #[rstest]
    fn absolute_paths_resolve_to_themselves() {
        let env = ExecutionEnv::new("/work");
        assert_eq!(env.resolve(Utf8Path::new("/etc/x")), "/etc/x");
    }
}
