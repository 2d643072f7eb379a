//! Serialisers shared by the payload types.

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::{Result, TerranetesError};

/// JSON with sorted keys and a four-space indent.
pub(crate) fn json_pretty(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .map_err(|err| TerranetesError::render("json", &err))?;
    String::from_utf8(buf).map_err(|err| TerranetesError::render("json", &err))
}

/// A single YAML document.
pub(crate) fn yaml(value: &Value) -> Result<String> {
    serde_yaml::to_string(value).map_err(|err| TerranetesError::render("yaml", &err))
}

/// A YAML stream with one document per value, separated by `---`.
pub(crate) fn yaml_stream<'a, I>(values: I) -> Result<String>
where
    I: IntoIterator<Item = &'a Value>,
{
    let documents = values.into_iter().map(yaml).collect::<Result<Vec<_>>>()?;
    Ok(documents.join("---\n"))
}
