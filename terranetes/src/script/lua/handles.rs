//! Userdata handles for blocks, Kubernetes objects, live bodies and builders.
//!
//! Handles share their target: two handles to the same block observe each
//! other's edits. `copy` is the only way to get an independent block.

use std::cell::RefCell;
use std::rc::Rc;

use mlua::{
    AnyUserData, ExternalResult, FromLua, Function, Lua, MetaMethod, UserData, UserDataFields,
    UserDataMethods,
};
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::convert::{to_json, to_lua};
use crate::TerranetesError;
use crate::block::Block;
use crate::builder::{AutoNode, PathSegment};
use crate::kubernetes::KubeObject;

/// Shared Terraform block.
#[derive(Clone, Debug)]
pub(super) struct BlockHandle(Rc<RefCell<Block>>);

impl BlockHandle {
    pub(super) fn new(block: Block) -> Self {
        Self(Rc::new(RefCell::new(block)))
    }

    pub(super) fn snapshot(&self) -> Block {
        self.0.borrow().clone()
    }
}

impl UserData for BlockHandle {
    fn add_fields<'lua, F: UserDataFields<'lua, Self>>(fields: &mut F) {
        fields.add_field_method_get("id", |_, this| Ok(this.0.borrow().id().get()));
        fields.add_field_method_get("kind", |_, this| Ok(this.0.borrow().kind().keyword()));
        fields.add_field_method_get("type", |_, this| {
            Ok(this.0.borrow().type_name().map(str::to_owned))
        });
        fields.add_field_method_set("type", |_, this, type_name: String| {
            this.0.borrow_mut().set_type(type_name).into_lua_err()
        });
        fields.add_field_method_get("name", |_, this| {
            Ok(this.0.borrow().name().map(str::to_owned))
        });
        fields.add_field_method_set("name", |_, this, name: String| {
            this.0.borrow_mut().set_name(name).into_lua_err()
        });
        fields.add_field_method_get("body", |lua, this| {
            BodyProxy::child(lua, BodyRoot::Block(Rc::clone(&this.0)), Vec::new())
        });
        fields.add_field_method_set("body", |lua, this, body: mlua::Value| {
            *this.0.borrow_mut().body_mut() = to_json(lua, body)?;
            Ok(())
        });
    }

    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_method("update", |lua, this, partial: mlua::Value| {
            let layer = to_json(lua, partial)?;
            this.0.borrow_mut().update(layer);
            Ok(())
        });
        methods.add_method("copy", |_, this, ()| Ok(Self::new(this.0.borrow().copy())));
        methods.add_method("document", |lua, this, ()| {
            to_lua(lua, &this.0.borrow().to_document())
        });
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            let block = this.0.borrow();
            Ok(format!("{} {}", block.kind(), block.key_path().join(".")))
        });
    }
}

/// Shared Kubernetes object.
#[derive(Clone, Debug)]
pub(super) struct ObjectHandle(Rc<RefCell<KubeObject>>);

impl ObjectHandle {
    pub(super) fn new(object: KubeObject) -> Self {
        Self(Rc::new(RefCell::new(object)))
    }

    pub(super) fn snapshot(&self) -> KubeObject {
        self.0.borrow().clone()
    }

    fn field<'lua>(&self, lua: &'lua Lua, key: &str) -> mlua::Result<mlua::Value<'lua>> {
        BodyProxy::child(
            lua,
            BodyRoot::Object(Rc::clone(&self.0)),
            vec![PathSegment::from(key)],
        )
    }
}

impl UserData for ObjectHandle {
    fn add_fields<'lua, F: UserDataFields<'lua, Self>>(fields: &mut F) {
        fields.add_field_method_get("kind", |_, this| {
            Ok(this.0.borrow().kind().map(str::to_owned))
        });
        fields.add_field_method_set("kind", |_, this, kind: String| {
            this.0.borrow_mut().set_kind(&kind);
            Ok(())
        });
        fields.add_field_method_get("apiVersion", |lua, this| this.field(lua, "apiVersion"));
        fields.add_field_method_set("apiVersion", |lua, this, value: mlua::Value| {
            let converted = to_json(lua, value)?;
            this.0.borrow_mut().set_api_version(converted);
            Ok(())
        });
        fields.add_field_method_get("metadata", |lua, this| this.field(lua, "metadata"));
        fields.add_field_method_set("metadata", |lua, this, value: mlua::Value| {
            let converted = to_json(lua, value)?;
            this.0.borrow_mut().set_metadata(converted);
            Ok(())
        });
        fields.add_field_method_get("spec", |lua, this| this.field(lua, "spec"));
        fields.add_field_method_set("spec", |lua, this, value: mlua::Value| {
            let converted = to_json(lua, value)?;
            this.0.borrow_mut().set_spec(converted);
            Ok(())
        });
        fields.add_field_method_get("body", |lua, this| {
            BodyProxy::child(lua, BodyRoot::Object(Rc::clone(&this.0)), Vec::new())
        });
        fields.add_field_method_set("body", |lua, this, body: mlua::Value| {
            *this.0.borrow_mut().body_mut() = to_json(lua, body)?;
            Ok(())
        });
    }

    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_method("update", |lua, this, partial: mlua::Value| {
            let layer = to_json(lua, partial)?;
            this.0.borrow_mut().update(layer);
            Ok(())
        });
        methods.add_method("copy", |_, this, ()| Ok(Self::new(this.snapshot())));
        methods.add_method("render", |lua, this, ()| to_lua(lua, &this.0.borrow().render()));
    }
}

/// Owner of a body reached through a [`BodyProxy`].
#[derive(Clone, Debug)]
pub(super) enum BodyRoot {
    Block(Rc<RefCell<Block>>),
    Object(Rc<RefCell<KubeObject>>),
}

impl BodyRoot {
    fn read<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        match self {
            Self::Block(block) => f(block.borrow().body()),
            Self::Object(object) => f(object.borrow().body()),
        }
    }

    fn write<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        match self {
            Self::Block(block) => f(block.borrow_mut().body_mut()),
            Self::Object(object) => f(object.borrow_mut().body_mut()),
        }
    }
}

/// Live view of a mapping or sequence inside a body.
///
/// Reading a nested mapping or sequence yields another proxy; reading a
/// scalar yields a copy. Assigning a key writes straight into the owner's
/// body; assigning `nil` removes it.
#[derive(Clone, Debug)]
pub(super) struct BodyProxy {
    root: BodyRoot,
    path: Vec<PathSegment>,
}

enum Child {
    Missing,
    Nested,
    Scalar(Value),
}

impl BodyProxy {
    /// Proxy for nested nodes, a copy for scalars, `nil` when missing.
    pub(super) fn child<'lua>(
        lua: &'lua Lua,
        root: BodyRoot,
        path: Vec<PathSegment>,
    ) -> mlua::Result<mlua::Value<'lua>> {
        let child = root.read(|body| match lookup(body, &path) {
            None => Child::Missing,
            Some(Value::Object(_) | Value::Array(_)) => Child::Nested,
            Some(scalar) => Child::Scalar(scalar.clone()),
        });
        match child {
            Child::Missing => Ok(mlua::Value::Nil),
            Child::Scalar(value) => to_lua(lua, &value),
            Child::Nested => lua
                .create_ser_userdata(Self { root, path })
                .map(mlua::Value::UserData),
        }
    }

    /// Current value of the viewed node, `null` if it no longer exists.
    pub(super) fn snapshot(&self) -> Value {
        self.root
            .read(|body| lookup(body, &self.path).cloned())
            .unwrap_or(Value::Null)
    }

    fn index<'lua>(&self, lua: &'lua Lua, key: mlua::Value<'lua>) -> mlua::Result<mlua::Value<'lua>> {
        let mut path = self.path.clone();
        path.push(segment(lua, key)?);
        Self::child(lua, self.root.clone(), path)
    }

    fn assign<'lua>(
        &self,
        lua: &'lua Lua,
        key: mlua::Value<'lua>,
        value: mlua::Value<'lua>,
    ) -> mlua::Result<()> {
        let step = segment(lua, key)?;
        let stored = match value {
            mlua::Value::Nil => None,
            other => Some(to_json(lua, other)?),
        };
        self.root.write(|body| {
            let node = lookup_mut(body, &self.path).ok_or_else(|| {
                mlua::Error::RuntimeError("body node no longer exists".to_owned())
            })?;
            store(node, step, stored)
        })
    }

    fn len(&self) -> usize {
        self.root.read(|body| match lookup(body, &self.path) {
            Some(Value::Object(map)) => map.len(),
            Some(Value::Array(items)) => items.len(),
            _ => 0,
        })
    }
}

impl Serialize for BodyProxy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl UserData for BodyProxy {
    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::Index, |lua, this, key: mlua::Value| {
            this.index(lua, key)
        });
        methods.add_meta_method(
            MetaMethod::NewIndex,
            |lua, this, (key, value): (mlua::Value, mlua::Value)| this.assign(lua, key, value),
        );
        methods.add_meta_method(MetaMethod::Len, |_, this, ()| Ok(this.len()));
        methods.add_meta_method(MetaMethod::Pairs, |lua, this, ()| {
            let next: Function = lua.globals().get("next")?;
            let table = to_lua(lua, &this.snapshot())?;
            Ok((next, table, mlua::Value::Nil))
        });
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(this.snapshot().to_string())
        });
    }
}

fn segment<'lua>(lua: &'lua Lua, key: mlua::Value<'lua>) -> mlua::Result<PathSegment> {
    match key {
        mlua::Value::Integer(position) => position
            .checked_sub(1)
            .and_then(|index| usize::try_from(index).ok())
            .map(PathSegment::Index)
            .ok_or_else(|| {
                mlua::Error::RuntimeError(format!("sequence positions start at 1, got {position}"))
            }),
        other => String::from_lua(other, lua).map(PathSegment::Key),
    }
}

fn lookup<'v>(root: &'v Value, path: &[PathSegment]) -> Option<&'v Value> {
    path.iter().try_fold(root, |node, segment| match segment {
        PathSegment::Key(key) => node.get(key.as_str()),
        PathSegment::Index(index) => node.get(*index),
    })
}

fn lookup_mut<'v>(root: &'v mut Value, path: &[PathSegment]) -> Option<&'v mut Value> {
    path.iter().try_fold(root, |node, segment| match segment {
        PathSegment::Key(key) => node.get_mut(key.as_str()),
        PathSegment::Index(index) => node.get_mut(*index),
    })
}

const fn shape(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "mapping",
        Value::Array(_) => "sequence",
        _ => "leaf",
    }
}

fn store(target: &mut Value, step: PathSegment, stored: Option<Value>) -> mlua::Result<()> {
    match (target, step) {
        (Value::Object(map), PathSegment::Key(key)) => {
            match stored {
                Some(value) => map.insert(key, value),
                None => map.remove(&key),
            };
            Ok(())
        }
        (Value::Array(items), PathSegment::Index(index)) => {
            let len = items.len();
            match stored {
                Some(value) if index < len => {
                    if let Some(slot) = items.get_mut(index) {
                        *slot = value;
                    }
                }
                Some(value) if index == len => items.push(value),
                None if index + 1 == len => {
                    items.pop();
                }
                _ => {
                    return Err(mlua::Error::RuntimeError(format!(
                        "position {} is out of range for a sequence of {len} items",
                        index + 1
                    )));
                }
            }
            Ok(())
        }
        (node, access) => Err(TerranetesError::AccessMismatch {
            actual: shape(node),
            requested: match access {
                PathSegment::Key(_) => "mapping",
                PathSegment::Index(_) => "sequence",
            },
        })
        .into_lua_err(),
    }
}

/// Explicit auto-structuring builder exposed as `builder()`.
///
/// `b:key("spec"):key("ports"):index(1):key("port"):set(80)` shapes unset
/// nodes on the way; conflicting accesses raise an `AccessMismatch` error.
#[derive(Clone, Debug)]
pub(super) struct BuilderHandle {
    root: Rc<RefCell<AutoNode>>,
    path: Vec<PathSegment>,
}

impl BuilderHandle {
    pub(super) fn new() -> Self {
        Self {
            root: Rc::new(RefCell::new(AutoNode::default())),
            path: Vec::new(),
        }
    }

    fn descend(&self, segment: PathSegment) -> mlua::Result<Self> {
        let mut path = self.path.clone();
        path.push(segment);
        self.root.borrow_mut().walk(&path).into_lua_err()?;
        Ok(Self {
            root: Rc::clone(&self.root),
            path,
        })
    }

    /// Current value of the node this handle points at.
    pub(super) fn snapshot(&self) -> mlua::Result<Value> {
        let mut root = self.root.borrow_mut();
        let node = root.walk(&self.path).into_lua_err()?;
        Ok(node.clone().into_value())
    }
}

impl UserData for BuilderHandle {
    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_method("key", |_, this, name: String| {
            this.descend(PathSegment::Key(name))
        });
        methods.add_method("index", |lua, this, position: mlua::Value| {
            match segment(lua, position)? {
                index @ PathSegment::Index(_) => this.descend(index),
                PathSegment::Key(key) => Err(mlua::Error::RuntimeError(format!(
                    "index expects an integer position, got '{key}'"
                ))),
            }
        });
        methods.add_method("set", |lua, this, value: mlua::Value| {
            let leaf = to_json(lua, value)?;
            this.root
                .borrow_mut()
                .walk(&this.path)
                .into_lua_err()?
                .set(leaf);
            Ok(())
        });
        methods.add_method("value", |lua, this, ()| to_lua(lua, &this.snapshot()?));
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(this.snapshot()?.to_string())
        });
    }
}

/// Block handle passed as a userdata argument.
pub(super) fn block_arg(data: &AnyUserData) -> Option<Block> {
    data.borrow::<BlockHandle>().ok().map(|handle| handle.snapshot())
}

/// Kubernetes object handle passed as a userdata argument.
pub(super) fn object_arg(data: &AnyUserData) -> Option<KubeObject> {
    data.borrow::<ObjectHandle>()
        .ok()
        .map(|handle| handle.snapshot())
}
