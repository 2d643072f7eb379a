//! Global tables and functions installed into every script interpreter.

use std::cell::RefCell;
use std::rc::Rc;

use mlua::{AnyUserData, ExternalResult, FromLua, Function, Lua, MultiValue, Table};
use serde_json::Value;

use super::context::{ContextHandle, ContextOptions};
use super::convert::{body_arg, mapping_arg, to_json, to_lua};
use super::handles::{BlockHandle, BuilderHandle, ObjectHandle};
use super::state::RunState;
use crate::artifact::{Artifact, Payload};
use crate::block::{self, Block};
use crate::document::ConfigDocument;
use crate::kubernetes::{self, KubeKind, KubeManifest, KubeObject};
use crate::terraform::TerraformDocument;
use crate::values::Overrides;
use crate::{IoResultExt, loads};

type Shared = Rc<RefCell<RunState>>;

pub(super) fn install(vm: &Lua, state: &Shared) -> mlua::Result<()> {
    let globals = vm.globals();
    globals.set("tf", terraform_table(vm, state)?)?;
    globals.set("k8s", kubernetes_table(vm, state)?)?;
    globals.set("cfg", config_table(vm, state)?)?;
    install_values(vm, &globals, state)?;
    install_loaders(vm, &globals, state)?;

    let registry = Rc::clone(state);
    globals.set(
        "register",
        vm.create_function(move |_, context: AnyUserData| {
            let handle = ContextHandle::clone(&*context.borrow::<ContextHandle>()?);
            registry.borrow_mut().register(handle);
            Ok(context)
        })?,
    )?;
    globals.set(
        "builder",
        vm.create_function(|_, ()| Ok(BuilderHandle::new()))?,
    )?;
    Ok(())
}

fn new_context(state: &Shared, payload: Payload, output: Option<String>) -> ContextHandle {
    let mut artifact = Artifact::new(payload).with_input(state.borrow().input());
    if let Some(path) = output {
        artifact = artifact.with_output(path);
    }
    ContextHandle::new(artifact)
}

fn blocks(blocks: Vec<Block>) -> Vec<BlockHandle> {
    blocks.into_iter().map(BlockHandle::new).collect()
}

fn objects(objects: Vec<KubeObject>) -> Vec<ObjectHandle> {
    objects.into_iter().map(ObjectHandle::new).collect()
}

fn terraform_table<'lua>(vm: &'lua Lua, state: &Shared) -> mlua::Result<Table<'lua>> {
    let tf = vm.create_table()?;

    let shared = Rc::clone(state);
    tf.set(
        "context",
        vm.create_function(move |lua, options: Option<mlua::Value>| {
            let parsed = ContextOptions::parse(lua, options)?;
            let strict = parsed.strict.unwrap_or_else(|| shared.borrow().strict());
            let doc = TerraformDocument::new().with_strict(strict);
            Ok(new_context(&shared, Payload::Terraform(doc), parsed.output))
        })?,
    )?;

    tf.set(
        "terraform",
        vm.create_function(|lua, body: Option<mlua::Value>| {
            Ok(BlockHandle::new(Block::terraform(body_arg(lua, body)?)))
        })?,
    )?;
    tf.set(
        "locals",
        vm.create_function(|lua, body: Option<mlua::Value>| {
            Ok(BlockHandle::new(Block::locals(body_arg(lua, body)?)))
        })?,
    )?;
    tf.set(
        "variable",
        vm.create_function(|lua, (name, body): (String, Option<mlua::Value>)| {
            Ok(BlockHandle::new(Block::variable(name, body_arg(lua, body)?)))
        })?,
    )?;
    tf.set(
        "output",
        vm.create_function(|lua, (first, body): (mlua::Value, Option<mlua::Value>)| {
            output_block(lua, first, body).map(BlockHandle::new)
        })?,
    )?;
    tf.set(
        "module",
        vm.create_function(|lua, (name, body): (String, Option<mlua::Value>)| {
            Ok(BlockHandle::new(Block::module(name, body_arg(lua, body)?)))
        })?,
    )?;
    tf.set(
        "provider",
        vm.create_function(|lua, (name, body): (String, Option<mlua::Value>)| {
            Ok(BlockHandle::new(Block::provider(name, body_arg(lua, body)?)))
        })?,
    )?;
    tf.set(
        "resource",
        vm.create_function(
            |lua, (type_name, name, body): (String, String, Option<mlua::Value>)| {
                Ok(BlockHandle::new(Block::resource(
                    type_name,
                    name,
                    body_arg(lua, body)?,
                )))
            },
        )?,
    )?;
    tf.set(
        "data",
        vm.create_function(
            |lua, (type_name, name, body): (String, String, Option<mlua::Value>)| {
                Ok(BlockHandle::new(Block::data(
                    type_name,
                    name,
                    body_arg(lua, body)?,
                )))
            },
        )?,
    )?;
    tf.set(
        "variables",
        vm.create_function(|lua, defaults: mlua::Value| {
            Ok(blocks(Block::variables(mapping_arg(lua, defaults, "tf.variables")?)))
        })?,
    )?;
    tf.set(
        "outputs",
        vm.create_function(|lua, values: mlua::Value| {
            Ok(blocks(Block::outputs(mapping_arg(lua, values, "tf.outputs")?)))
        })?,
    )?;
    tf.set(
        "from_hcl",
        vm.create_function(|_, text: String| {
            block::from_hcl(&text).into_lua_err().map(BlockHandle::new)
        })?,
    )?;
    tf.set(
        "many_from_hcl",
        vm.create_function(|_, text: String| {
            block::many_from_hcl(&text).into_lua_err().map(blocks)
        })?,
    )?;
    let file_state = Rc::clone(state);
    tf.set(
        "hcl_file",
        vm.create_function(move |_, path: String| {
            let resolved = file_state.borrow().resolve(&path);
            block::from_hcl_file(&resolved).into_lua_err().map(blocks)
        })?,
    )?;
    Ok(tf)
}

/// `tf.output(name, body)` or the one-entry form `tf.output{name = value}`.
fn output_block<'lua>(
    lua: &'lua Lua,
    first: mlua::Value<'lua>,
    body: Option<mlua::Value<'lua>>,
) -> mlua::Result<Block> {
    if matches!(first, mlua::Value::Table(_)) && body.is_none() {
        let mut entries = mapping_arg(lua, first, "tf.output")?.into_iter();
        return match (entries.next(), entries.next()) {
            (Some((name, value)), None) => Ok(Block::output_value(name, value)),
            _ => Err(mlua::Error::RuntimeError(
                "tf.output{...} expects exactly one name = value entry".to_owned(),
            )),
        };
    }
    let name = String::from_lua(first, lua)?;
    Ok(Block::output(name, body_arg(lua, body)?))
}

fn kubernetes_table<'lua>(vm: &'lua Lua, state: &Shared) -> mlua::Result<Table<'lua>> {
    let k8s = vm.create_table()?;

    let shared = Rc::clone(state);
    k8s.set(
        "context",
        vm.create_function(move |lua, options: Option<mlua::Value>| {
            let parsed = ContextOptions::parse(lua, options)?;
            Ok(new_context(
                &shared,
                Payload::Kubernetes(KubeManifest::new()),
                parsed.output,
            ))
        })?,
    )?;
    k8s.set(
        "object",
        vm.create_function(|lua, (kind_name, body): (String, Option<mlua::Value>)| {
            let kind = KubeKind::from_name(&kind_name);
            Ok(ObjectHandle::new(KubeObject::new(Some(kind), body_arg(lua, body)?)))
        })?,
    )?;
    for kind in KubeKind::KNOWN {
        let name = constructor_name(kind.as_str());
        k8s.set(
            name,
            vm.create_function(move |lua, body: Option<mlua::Value>| {
                Ok(ObjectHandle::new(KubeObject::new(
                    Some(kind.clone()),
                    body_arg(lua, body)?,
                )))
            })?,
        )?;
    }
    k8s.set(
        "from_yaml",
        vm.create_function(|_, text: String| {
            kubernetes::from_yaml(&text).into_lua_err().map(ObjectHandle::new)
        })?,
    )?;
    k8s.set(
        "many_from_yaml",
        vm.create_function(|_, text: String| {
            kubernetes::many_from_yaml(&text).into_lua_err().map(objects)
        })?,
    )?;
    let file_state = Rc::clone(state);
    k8s.set(
        "yaml_file",
        vm.create_function(move |_, path: String| {
            let resolved = file_state.borrow().resolve(&path);
            let text = std::fs::read_to_string(&resolved).with_path(&resolved).into_lua_err()?;
            kubernetes::many_from_yaml(&text).into_lua_err().map(objects)
        })?,
    )?;
    Ok(k8s)
}

/// `ConfigMap` -> `config_map`.
fn constructor_name(kind: &str) -> String {
    let mut name = String::with_capacity(kind.len() + 4);
    for (position, ch) in kind.chars().enumerate() {
        if ch.is_ascii_uppercase() && position > 0 {
            name.push('_');
        }
        name.push(ch.to_ascii_lowercase());
    }
    name
}

fn config_table<'lua>(vm: &'lua Lua, state: &Shared) -> mlua::Result<Table<'lua>> {
    let cfg = vm.create_table()?;
    let constructors: [(&str, fn() -> ConfigDocument); 3] = [
        ("json", ConfigDocument::json),
        ("yaml", ConfigDocument::yaml),
        ("ini", ConfigDocument::ini),
    ];
    for (name, document) in constructors {
        let shared = Rc::clone(state);
        cfg.set(
            name,
            vm.create_function(move |lua, options: Option<mlua::Value>| {
                let parsed = ContextOptions::parse(lua, options)?;
                Ok(new_context(
                    &shared,
                    Payload::Config(document()),
                    parsed.output,
                ))
            })?,
        )?;
    }
    Ok(cfg)
}

fn install_values<'lua>(vm: &'lua Lua, globals: &Table<'lua>, state: &Shared) -> mlua::Result<()> {
    let lookup_state = Rc::clone(state);
    globals.set(
        "value",
        vm.create_function(move |lua, (key, default): (String, Option<mlua::Value>)| {
            let found = lookup_state.borrow().values().get(&key).cloned();
            match found {
                Some(value) => to_lua(lua, &value),
                None => Ok(default.unwrap_or(mlua::Value::Nil)),
            }
        })?,
    )?;

    let set_state = Rc::clone(state);
    globals.set(
        "set_value",
        vm.create_function(move |lua, (key, value): (String, mlua::Value)| {
            let json = to_json(lua, value.clone())?;
            set_state.borrow_mut().values_mut().set(key, json);
            Ok(value)
        })?,
    )?;

    let scope_state = Rc::clone(state);
    globals.set(
        "with_values",
        vm.create_function(move |lua, (layer, body): (mlua::Value, Function)| {
            let mapping = mapping_arg(lua, layer, "with_values")?;
            let depth = {
                let mut run = scope_state.borrow_mut();
                let current = run.values().depth();
                run.values_mut().push(Overrides::new().layer(mapping));
                current
            };
            let result = body.call::<_, MultiValue>(());
            scope_state.borrow_mut().values_mut().restore_to(depth);
            result
        })?,
    )?;
    Ok(())
}

fn install_loaders<'lua>(vm: &'lua Lua, globals: &Table<'lua>, state: &Shared) -> mlua::Result<()> {
    let parsers: [(&str, fn(&str) -> crate::Result<Value>); 3] = [
        ("yaml", loads::yaml),
        ("json", loads::json),
        ("hcl", loads::hcl),
    ];
    for (name, parse) in parsers {
        globals.set(
            name,
            vm.create_function(move |lua, text: String| {
                to_lua(lua, &parse(&text).into_lua_err()?)
            })?,
        )?;
    }

    let file_state = Rc::clone(state);
    globals.set(
        "read_file",
        vm.create_function(move |_, path: String| {
            let resolved = file_state.borrow().resolve(&path);
            std::fs::read_to_string(&resolved).with_path(&resolved).into_lua_err()
        })?,
    )?;
    Ok(())
}
