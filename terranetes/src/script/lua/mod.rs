//! [`ScriptRunner`] backed by an embedded Lua 5.4 interpreter.
//!
//! Every script gets a fresh interpreter with the `tf`, `k8s` and `cfg`
//! tables plus a handful of global helpers installed. Contexts bound to
//! global names, followed by contexts passed to `register`, become the
//! script's artifacts.

mod api;
mod context;
mod convert;
mod handles;
mod state;

use std::cell::RefCell;
use std::rc::Rc;

use camino::{Utf8Path, Utf8PathBuf};
use mlua::{FromLua, Function, Lua, Table};

use self::context::ContextHandle;
use self::state::RunState;
use super::runner::{Harvest, ScriptRunner};
use crate::environment::ExecutionEnv;
use crate::{IoResultExt, Result, TerranetesError};

/// Runs scripts in a fresh Lua interpreter each.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LuaRunner {
    strict: bool,
}

impl LuaRunner {
    /// Runner whose Terraform contexts are permissive unless asked otherwise.
    #[must_use]
    pub const fn new() -> Self {
        Self { strict: false }
    }

    /// Default duplicate policy of `tf.context`.
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Returns `true` when Terraform contexts default to strict mode.
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.strict
    }
}

impl ScriptRunner for LuaRunner {
    fn run(&self, path: &Utf8Path, env: &mut ExecutionEnv) -> Result<Harvest> {
        let source = std::fs::read_to_string(path).with_path(path)?;
        let state = Rc::new(RefCell::new(RunState::new(
            path.to_path_buf(),
            env.working_dir().to_path_buf(),
            env.take_values(),
            self.strict,
        )));

        let outcome = execute(path, &source, env.search_path(), &state);

        let values = state.borrow_mut().take_values();
        env.restore_values(values);
        outcome.map_err(|err| TerranetesError::Script {
            path: path.to_path_buf(),
            source: err,
        })
    }
}

fn execute(
    path: &Utf8Path,
    source: &str,
    search_path: &[Utf8PathBuf],
    state: &Rc<RefCell<RunState>>,
) -> mlua::Result<Harvest> {
    let lua = Lua::new();
    extend_package_path(&lua, search_path)?;
    api::install(&lua, state)?;
    let order = track_globals(&lua)?;
    lua.load(source).set_name(format!("@{path}")).exec()?;
    let registered = state.borrow().registered().to_vec();
    let declared = order.borrow();
    harvest(&lua, &declared, &registered)
}

fn extend_package_path(lua: &Lua, search_path: &[Utf8PathBuf]) -> mlua::Result<()> {
    if search_path.is_empty() {
        return Ok(());
    }
    let package: Table = lua.globals().get("package")?;
    let current: String = package.get("path")?;
    let mut entries: Vec<String> = search_path
        .iter()
        .flat_map(|dir| [format!("{dir}/?.lua"), format!("{dir}/?/init.lua")])
        .collect();
    entries.push(current);
    package.set("path", entries.join(";"))
}

/// Record the names of new globals in assignment order.
fn track_globals(vm: &Lua) -> mlua::Result<Rc<RefCell<Vec<String>>>> {
    let order = Rc::new(RefCell::new(Vec::new()));
    let recorder = Rc::clone(&order);
    let meta = vm.create_table()?;
    meta.set(
        "__newindex",
        vm.create_function(
            move |lua, (table, key, value): (Table, mlua::Value, mlua::Value)| {
                if key.is_string() {
                    recorder
                        .borrow_mut()
                        .push(String::from_lua(key.clone(), lua)?);
                }
                table.raw_set(key, value)
            },
        )?,
    )?;
    let setmetatable: Function = vm.globals().get("setmetatable")?;
    setmetatable.call::<_, ()>((vm.globals(), meta))?;
    Ok(order)
}

fn harvest(lua: &Lua, declared: &[String], registered: &[ContextHandle]) -> mlua::Result<Harvest> {
    let globals = lua.globals();
    let mut seen: Vec<ContextHandle> = Vec::new();
    let mut result = Harvest::default();
    for name in declared {
        let mlua::Value::UserData(data) = globals.raw_get::<_, mlua::Value>(name.as_str())? else {
            continue;
        };
        let Ok(handle) = data.borrow::<ContextHandle>() else {
            continue;
        };
        if !seen.iter().any(|other| other.same(&handle)) {
            result.declared.push(handle.snapshot());
            seen.push(ContextHandle::clone(&handle));
        }
    }
    for handle in registered {
        if !seen.iter().any(|other| other.same(handle)) {
            result.registered.push(handle.snapshot());
            seen.push(handle.clone());
        }
    }
    Ok(result)
}

/// Returns the crate error raised inside a script callback, if any.
///
/// Interpreter errors wrap callback failures; this looks through the
/// wrapping to the [`TerranetesError`] a callback returned.
#[must_use]
pub fn script_cause(err: &mlua::Error) -> Option<&TerranetesError> {
    match err {
        mlua::Error::CallbackError { cause, .. } => script_cause(cause),
        mlua::Error::ExternalError(inner) => inner.downcast_ref::<TerranetesError>(),
        mlua::Error::WithContext { cause, .. } => script_cause(cause),
        _ => None,
    }
}

impl TerranetesError {
    /// Returns the crate error a script callback failed with, looking
    /// through [`TerranetesError::Unit`] and [`TerranetesError::Script`].
    #[must_use]
    pub fn script_cause(&self) -> Option<&Self> {
        match self.root() {
            Self::Script { source, .. } => script_cause(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests;
