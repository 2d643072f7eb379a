//! Context handles: the artifacts scripts build up.

use std::cell::RefCell;
use std::rc::Rc;

use camino::Utf8PathBuf;
use mlua::{AnyUserData, ExternalResult, Lua, MetaMethod, UserData, UserDataFields, UserDataMethods};

use super::convert::{items, mapping_arg, to_json, to_lua};
use super::handles::{block_arg, object_arg};
use crate::artifact::{Artifact, Payload};

/// Shared artifact under construction.
#[derive(Clone, Debug)]
pub(super) struct ContextHandle(Rc<RefCell<Artifact>>);

impl ContextHandle {
    pub(super) fn new(artifact: Artifact) -> Self {
        Self(Rc::new(RefCell::new(artifact)))
    }

    pub(super) fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(super) fn snapshot(&self) -> Artifact {
        self.0.borrow().clone()
    }

    fn fork(&self) -> Self {
        Self::new(self.snapshot())
    }

    /// Add a block, object, mapping, or a sequence of blocks or objects.
    fn add<'lua>(&self, lua: &'lua Lua, item: mlua::Value<'lua>) -> mlua::Result<()> {
        let mut artifact = self.0.borrow_mut();
        match artifact.payload_mut() {
            Payload::Terraform(doc) => {
                for element in items(item)? {
                    let block = userdata(&element).and_then(block_arg).ok_or_else(|| {
                        unexpected("terraform", "a block or a list of blocks", &element)
                    })?;
                    doc.add(&block).into_lua_err()?;
                }
            }
            Payload::Kubernetes(manifest) => {
                for element in items(item)? {
                    let object = userdata(&element).and_then(object_arg).ok_or_else(|| {
                        unexpected("kubernetes", "an object or a list of objects", &element)
                    })?;
                    manifest.add(&object);
                }
            }
            Payload::Config(doc) => {
                doc.add(mapping_arg(lua, item, "add")?);
            }
        }
        Ok(())
    }

    fn lookup<'lua>(&self, lua: &'lua Lua, path: &[String]) -> mlua::Result<mlua::Value<'lua>> {
        match self.0.borrow().payload() {
            Payload::Terraform(doc) => match doc.lookup(path) {
                Some(value) => to_lua(lua, value),
                None => Ok(mlua::Value::Nil),
            },
            _ => Err(mlua::Error::RuntimeError(
                "lookup is only available on terraform contexts".to_owned(),
            )),
        }
    }

    fn data<'lua>(&self, lua: &'lua Lua) -> mlua::Result<mlua::Value<'lua>> {
        match self.0.borrow().payload() {
            Payload::Terraform(doc) => to_lua(lua, doc.data()),
            Payload::Kubernetes(manifest) => {
                let rendered: Vec<_> = manifest.objects().iter().map(|o| o.render()).collect();
                to_lua(lua, &serde_json::Value::Array(rendered))
            }
            Payload::Config(doc) => to_lua(lua, &serde_json::Value::Object(doc.data().clone())),
        }
    }
}

const fn userdata<'a, 'lua>(value: &'a mlua::Value<'lua>) -> Option<&'a AnyUserData<'lua>> {
    match value {
        mlua::Value::UserData(data) => Some(data),
        _ => None,
    }
}

fn unexpected(context: &str, expected: &str, got: &mlua::Value) -> mlua::Error {
    mlua::Error::RuntimeError(format!(
        "a {context} context accepts {expected}, got {}",
        got.type_name()
    ))
}

impl UserData for ContextHandle {
    fn add_fields<'lua, F: UserDataFields<'lua, Self>>(fields: &mut F) {
        fields.add_field_method_get("format", |_, this| {
            Ok(this.0.borrow().payload().format_name())
        });
        fields.add_field_method_get("output", |_, this| {
            Ok(this.0.borrow().output().map(|path| path.to_string()))
        });
        fields.add_field_method_set("output", |_, this, output: Option<String>| {
            this.0.borrow_mut().set_output(output.map(Utf8PathBuf::from));
            Ok(())
        });
        fields.add_field_method_get("input", |_, this| {
            Ok(this.0.borrow().input().map(|path| path.to_string()))
        });
    }

    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_function("add", |lua, (this, item): (AnyUserData, mlua::Value)| {
            this.borrow::<Self>()?.add(lua, item)?;
            Ok(this)
        });
        methods.add_meta_function(
            MetaMethod::Add,
            |lua, (this, item): (AnyUserData, mlua::Value)| {
                let fork = this.borrow::<Self>()?.fork();
                fork.add(lua, item)?;
                Ok(fork)
            },
        );
        methods.add_method("lookup", |lua, this, path: mlua::Variadic<String>| {
            this.lookup(lua, &path)
        });
        methods.add_method("data", |lua, this, ()| this.data(lua));
        methods.add_method("render", |_, this, ()| {
            this.0.borrow().render_to_string().into_lua_err()
        });
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            let artifact = this.0.borrow();
            Ok(match artifact.output_path() {
                Ok(path) => format!("{} context -> {path}", artifact.payload().format_name()),
                Err(_) => format!("{} context", artifact.payload().format_name()),
            })
        });
    }
}

/// Options table of `tf.context`, `k8s.context` and `cfg.*`.
#[derive(Debug, Default)]
pub(super) struct ContextOptions {
    pub(super) output: Option<String>,
    pub(super) strict: Option<bool>,
}

impl ContextOptions {
    /// Accepts nothing, an output path, or `{output = ..., strict = ...}`.
    pub(super) fn parse<'lua>(lua: &'lua Lua, value: Option<mlua::Value<'lua>>) -> mlua::Result<Self> {
        match value {
            None | Some(mlua::Value::Nil) => Ok(Self::default()),
            Some(mlua::Value::Table(table)) => Ok(Self {
                output: table.get("output")?,
                strict: table.get("strict")?,
            }),
            Some(scalar) => match to_json(lua, scalar)? {
                serde_json::Value::String(path) => Ok(Self {
                    output: Some(path),
                    strict: None,
                }),
                unsupported => Err(mlua::Error::RuntimeError(format!(
                    "context options must be a table or an output path, got {unsupported}"
                ))),
            },
        }
    }
}
