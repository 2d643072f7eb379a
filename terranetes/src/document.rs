//! Generic JSON, YAML and INI configuration documents.

use serde_json::{Map, Value};

use crate::merge::merge_map;
use crate::{Result, TerranetesError, emit};

/// Output syntax of a [`ConfigDocument`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON, sorted keys, four-space indent.
    Json,
    /// A single YAML document.
    Yaml,
    /// INI sections of scalar values.
    Ini,
}

impl ConfigFormat {
    /// Lowercase format name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Ini => "ini",
        }
    }

    /// File suffix of rendered documents.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Json => ".json",
            Self::Yaml => ".yaml",
            Self::Ini => ".ini",
        }
    }
}

/// A mapping rendered in one [`ConfigFormat`].
///
/// JSON and YAML documents deep-merge added data. INI documents replace
/// each added section wholesale.
///
/// # Examples
///
/// ```rust
/// use serde_json::{Map, json};
/// use terranetes::document::ConfigDocument;
///
/// let mut ini = ConfigDocument::ini();
/// let mut section = Map::new();
/// section.insert("server".to_owned(), json!({"port": 8080, "tls": true}));
/// ini.add(section);
/// assert_eq!(ini.render()?, "[server]\nport = 8080\ntls = true\n");
/// # Ok::<_, terranetes::TerranetesError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigDocument {
    format: ConfigFormat,
    data: Map<String, Value>,
}

impl ConfigDocument {
    /// Empty document in `format`.
    #[must_use]
    pub fn new(format: ConfigFormat) -> Self {
        Self {
            format,
            data: Map::new(),
        }
    }

    /// Empty JSON document.
    #[must_use]
    pub fn json() -> Self {
        Self::new(ConfigFormat::Json)
    }

    /// Empty YAML document.
    #[must_use]
    pub fn yaml() -> Self {
        Self::new(ConfigFormat::Yaml)
    }

    /// Empty INI document.
    #[must_use]
    pub fn ini() -> Self {
        Self::new(ConfigFormat::Ini)
    }

    /// Output syntax.
    #[must_use]
    pub const fn format(&self) -> ConfigFormat {
        self.format
    }

    /// Accumulated data.
    #[must_use]
    pub const fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Add `partial` to the document.
    pub fn add(&mut self, partial: Map<String, Value>) -> &mut Self {
        match self.format {
            ConfigFormat::Ini => self.data.extend(partial),
            ConfigFormat::Json | ConfigFormat::Yaml => merge_map(&mut self.data, partial),
        }
        self
    }

    /// Copy of this document with `partial` added; `self` is untouched.
    #[must_use]
    pub fn with(&self, partial: Map<String, Value>) -> Self {
        let mut fork = self.clone();
        fork.add(partial);
        fork
    }

    /// Render in the document's format.
    ///
    /// # Errors
    ///
    /// Returns [`TerranetesError::InvalidIni`] when INI data is nested
    /// deeper than one section level and [`TerranetesError::Render`] when
    /// serialisation fails.
    pub fn render(&self) -> Result<String> {
        match self.format {
            ConfigFormat::Json => emit::json_pretty(&Value::Object(self.data.clone())),
            ConfigFormat::Yaml => emit::yaml(&Value::Object(self.data.clone())),
            ConfigFormat::Ini => render_ini(&self.data),
        }
    }
}

fn render_ini(data: &Map<String, Value>) -> Result<String> {
    let mut sections = Vec::with_capacity(data.len());
    for (section, entries) in data {
        let Value::Object(entries) = entries else {
            return Err(invalid_ini(section, "top-level entries must be sections"));
        };
        let mut text = format!("[{section}]\n");
        for (key, value) in entries {
            let scalar = ini_scalar(value)
                .ok_or_else(|| invalid_ini(&format!("{section}.{key}"), "values must be scalars"))?;
            text.push_str(&format!("{key} = {scalar}\n"));
        }
        sections.push(text);
    }
    Ok(sections.join("\n"))
}

fn ini_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => Some(text.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn invalid_ini(key: &str, message: &str) -> TerranetesError {
    TerranetesError::InvalidIni {
        key: key.to_owned(),
        message: message.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use rstest::rstest;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[rstest]
    fn json_documents_deep_merge() -> Result<()> {
        let mut doc = ConfigDocument::json();
        doc.add(map(json!({"VAR": "VALUE", "nested": {"a": 1}})))
            .add(map(json!({"nested": {"b": 2}})));
        assert_eq!(
            doc.render()?,
            "{\n    \"VAR\": \"VALUE\",\n    \"nested\": {\n        \"a\": 1,\n        \"b\": 2\n    }\n}"
        );
        Ok(())
    }

    #[rstest]
    fn yaml_documents_render_single_document() -> Result<()> {
        let doc = ConfigDocument::yaml().with(map(json!({"b": [1, 2], "a": "x"})));
        assert_eq!(doc.render()?, "a: x\nb:\n- 1\n- 2\n");
        Ok(())
    }

    #[rstest]
    fn ini_sections_replace_wholesale() -> Result<()> {
        let mut doc = ConfigDocument::ini();
        doc.add(map(json!({"db": {"host": "a", "port": 1}, "log": {"level": "info"}})))
            .add(map(json!({"db": {"host": "b"}})));
        assert_eq!(doc.render()?, "[db]\nhost = b\n\n[log]\nlevel = info\n");
        Ok(())
    }

    #[rstest]
    #[case(json!({"top": "scalar"}), "top")]
    #[case(json!({"db": {"nested": {"x": 1}}}), "db.nested")]
    #[case(json!({"db": {"list": [1]}}), "db.list")]
    fn ini_rejects_deep_or_flat_data(#[case] data: Value, #[case] key: &str) {
        let doc = ConfigDocument::ini().with(map(data));
        let err = doc.render().expect_err("invalid ini");
        assert!(matches!(err, TerranetesError::InvalidIni { key: ref k, .. } if k == key));
    }
}
