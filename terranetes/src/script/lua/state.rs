//! State shared between the API callbacks of one script run.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;

use super::context::ContextHandle;
use crate::script::FILE_KEY;
use crate::values::ValueStack;

#[derive(Debug)]
pub(super) struct RunState {
    script: Utf8PathBuf,
    working_dir: Utf8PathBuf,
    values: ValueStack,
    strict: bool,
    registered: Vec<ContextHandle>,
}

impl RunState {
    pub(super) const fn new(
        script: Utf8PathBuf,
        working_dir: Utf8PathBuf,
        values: ValueStack,
        strict: bool,
    ) -> Self {
        Self {
            script,
            working_dir,
            values,
            strict,
            registered: Vec::new(),
        }
    }

    /// Input path recorded on new contexts: the bound `__file__`, falling
    /// back to the running script.
    pub(super) fn input(&self) -> Utf8PathBuf {
        match self.values.get(FILE_KEY) {
            Some(Value::String(file)) => Utf8PathBuf::from(file),
            _ => self.script.clone(),
        }
    }

    pub(super) fn resolve(&self, path: &str) -> Utf8PathBuf {
        let candidate = Utf8Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.working_dir.join(candidate)
        }
    }

    pub(super) const fn strict(&self) -> bool {
        self.strict
    }

    pub(super) const fn values(&self) -> &ValueStack {
        &self.values
    }

    pub(super) const fn values_mut(&mut self) -> &mut ValueStack {
        &mut self.values
    }

    pub(super) fn take_values(&mut self) -> ValueStack {
        std::mem::take(&mut self.values)
    }

    pub(super) fn register(&mut self, handle: ContextHandle) {
        self.registered.push(handle);
    }

    pub(super) fn registered(&self) -> &[ContextHandle] {
        &self.registered
    }
}
