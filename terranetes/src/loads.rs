//! Parsers turning YAML, JSON and HCL text into nested [`Value`]s.
//!
//! HCL blocks are converted to nested mappings the way Terraform's JSON
//! syntax expects: the block keyword, then each label, then the body.
//! Repeated blocks deep-merge, so two `locals` blocks become one mapping.

use camino::Utf8Path;
use hcl::structure::{Body, Structure};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::merge::merge_value;
use crate::{IoResultExt, Result, SourceFormat, TerranetesError};

/// Parse a single YAML document. Text without a document yields `null`.
///
/// # Errors
///
/// Returns [`TerranetesError::Parse`] when the text is not valid YAML or
/// holds more than one document.
pub fn yaml(text: &str) -> Result<Value> {
    let mut documents = serde_yaml::Deserializer::from_str(text);
    let Some(first) = documents.next() else {
        return Ok(Value::Null);
    };
    let value = Value::deserialize(first)
        .map_err(|err| TerranetesError::parse(SourceFormat::Yaml, text, err))?;
    if documents.next().is_some() {
        return Err(TerranetesError::parse(
            SourceFormat::Yaml,
            text,
            "expected a single YAML document",
        ));
    }
    Ok(value)
}

/// Parse every document of a YAML stream, skipping empty documents.
///
/// # Errors
///
/// Returns [`TerranetesError::Parse`] when any document is invalid.
pub fn yaml_all(text: &str) -> Result<Vec<Value>> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document)
            .map_err(|err| TerranetesError::parse(SourceFormat::Yaml, text, err))?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

/// Parse a JSON document.
///
/// # Errors
///
/// Returns [`TerranetesError::Parse`] when the text is not valid JSON.
pub fn json(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|err| TerranetesError::parse(SourceFormat::Json, text, err))
}

/// Parse HCL text into a nested mapping.
///
/// Text that contains no attributes or blocks is rejected.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
///
/// let value = terranetes::loads::hcl(r#"resource "type" "name" { a = "b" }"#)?;
/// assert_eq!(value, json!({"resource": {"type": {"name": {"a": "b"}}}}));
/// # Ok::<_, terranetes::TerranetesError>(())
/// ```
///
/// # Errors
///
/// Returns [`TerranetesError::Parse`] wrapping the parser error and the
/// offending text.
pub fn hcl(text: &str) -> Result<Value> {
    let body =
        hcl::parse(text).map_err(|err| TerranetesError::parse(SourceFormat::Hcl, text, err))?;
    let value = body_to_value(body, text)?;
    if value.as_object().is_none_or(Map::is_empty) {
        return Err(TerranetesError::parse(
            SourceFormat::Hcl,
            text,
            "no blocks or attributes found",
        ));
    }
    Ok(value)
}

fn body_to_value(body: Body, text: &str) -> Result<Value> {
    let mut acc = Value::Object(Map::new());
    for structure in body {
        match structure {
            Structure::Attribute(attribute) => {
                let value = serde_json::to_value(hcl::Value::from(attribute.expr))
                    .map_err(|err| TerranetesError::parse(SourceFormat::Hcl, text, err))?;
                if let Some(map) = acc.as_object_mut() {
                    map.insert(attribute.key.as_str().to_owned(), value);
                }
            }
            Structure::Block(block) => {
                let mut nested = body_to_value(block.body, text)?;
                for label in block.labels.iter().rev() {
                    nested = singleton(label.as_str(), nested);
                }
                merge_value(&mut acc, singleton(block.identifier.as_str(), nested));
            }
        }
    }
    Ok(acc)
}

pub(crate) fn singleton(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_owned(), value);
    Value::Object(map)
}

/// Load a file, choosing the parser from its extension.
///
/// `.yaml`/`.yml` files are YAML, `.json` JSON, `.hcl`/`.tf` HCL.
///
/// # Errors
///
/// Returns [`TerranetesError::Io`] when the file cannot be read and
/// [`TerranetesError::Parse`] when the contents are invalid or the extension
/// is not recognised.
pub fn load_file(path: &Utf8Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).with_path(path)?;
    match path.extension().map(str::to_ascii_lowercase).as_deref() {
        Some("yaml" | "yml") => yaml(&text),
        Some("json") => json(&text),
        Some("hcl" | "tf") => hcl(&text),
        _ => Err(TerranetesError::parse(
            SourceFormat::Yaml,
            path.as_str(),
            "unknown file extension",
        )),
    }
}

#[cfg(test)]
mod tests {
    //! Parser behaviour for the supported syntaxes.

    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn hcl_nests_labels_and_merges_repeated_blocks() {
        let value = hcl(r#"
            locals {
              other {
                nested {
                  value = "value"
                }
              }
            }

            locals {
              locals = "whatever"
            }
        "#)
        .expect("parse hcl");
        assert_eq!(
            value,
            json!({"locals": {"other": {"nested": {"value": "value"}}, "locals": "whatever"}})
        );
    }

    #[rstest]
    fn hcl_nested_labelled_block() {
        let value = hcl(r#"
            terraform {
              backend "foo" {
                foo = "bar"
                bar = ["baz"]
                map = {
                  a = "b"
                }
              }
            }
        "#)
        .expect("parse hcl");
        assert_eq!(
            value,
            json!({"terraform": {"backend": {"foo": {
                "foo": "bar", "bar": ["baz"], "map": {"a": "b"}
            }}}})
        );
    }

    #[rstest]
    #[case("   ")]
    #[case("resource \"a\" {")]
    fn hcl_rejects_blank_and_broken_input(#[case] text: &str) {
        let err = hcl(text).expect_err("input should not parse");
        assert!(err.to_string().starts_with("Unable to parse"));
    }

    #[rstest]
    fn yaml_all_skips_empty_documents() {
        let docs = yaml_all("---\napiVersion: v1\nkind: Service\n---\napiVersion: v2\nkind: Deployment\n")
            .expect("parse yaml stream");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs.get(1), Some(&json!({"apiVersion": "v2", "kind": "Deployment"})));
    }

    #[rstest]
    fn json_errors_carry_text() {
        let err = json("{nope").expect_err("invalid json");
        assert!(err.to_string().contains("{nope"));
    }
}
