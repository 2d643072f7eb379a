//! Moving data between Lua and `serde_json`.

use mlua::{Lua, LuaSerdeExt, SerializeOptions};
use serde_json::{Map, Value};

use super::handles::{BodyProxy, BuilderHandle};

fn options() -> SerializeOptions {
    SerializeOptions::new()
        .serialize_none_to_null(false)
        .serialize_unit_to_null(false)
}

/// JSON to Lua; `null` becomes `nil`.
pub(super) fn to_lua<'lua>(lua: &'lua Lua, value: &Value) -> mlua::Result<mlua::Value<'lua>> {
    lua.to_value_with(value, options())
}

/// Lua to JSON. Body proxies and builders contribute their current value.
pub(super) fn to_json<'lua>(lua: &'lua Lua, value: mlua::Value<'lua>) -> mlua::Result<Value> {
    if let mlua::Value::UserData(data) = &value {
        if let Ok(proxy) = data.borrow::<BodyProxy>() {
            return Ok(proxy.snapshot());
        }
        if let Ok(builder) = data.borrow::<BuilderHandle>() {
            return builder.snapshot();
        }
    }
    lua.from_value(value)
}

/// Optional body argument; `nil` or absent means an empty mapping.
pub(super) fn body_arg<'lua>(lua: &'lua Lua, value: Option<mlua::Value<'lua>>) -> mlua::Result<Value> {
    match value {
        None | Some(mlua::Value::Nil) => Ok(Value::Object(Map::new())),
        Some(body) => to_json(lua, body),
    }
}

/// Lua table that must convert to a JSON mapping.
pub(super) fn mapping_arg<'lua>(
    lua: &'lua Lua,
    value: mlua::Value<'lua>,
    what: &str,
) -> mlua::Result<Map<String, Value>> {
    match to_json(lua, value)? {
        Value::Object(map) => Ok(map),
        other => Err(mlua::Error::RuntimeError(format!(
            "{what} expects a table of key/value pairs, got {other}"
        ))),
    }
}

/// Sequence of userdata items, or a single item.
pub(super) fn items<'lua>(value: mlua::Value<'lua>) -> mlua::Result<Vec<mlua::Value<'lua>>> {
    match value {
        mlua::Value::Table(table) => table.sequence_values::<mlua::Value>().collect(),
        other => Ok(vec![other]),
    }
}
