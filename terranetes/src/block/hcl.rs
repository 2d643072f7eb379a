//! Building blocks from HCL text.

use camino::Utf8Path;
use serde_json::{Map, Value};
use tracing::debug;

use super::{Block, BlockKind, Identity};
use crate::{IoResultExt, Result, SourceFormat, TerranetesError, loads};

/// Parse `text` into blocks, sorted by [`Block::sort_key`].
///
/// Zero-identity keywords produce one block holding the whole section,
/// one-identity keywords one block per label, and two-identity keywords one
/// block per type and name pair.
///
/// # Examples
///
/// ```rust
/// use terranetes::block::many_from_hcl;
///
/// let blocks = many_from_hcl(r#"
///     variable "b" {}
///     variable "a" {}
/// "#)?;
/// let names: Vec<_> = blocks.iter().filter_map(|b| b.name()).collect();
/// assert_eq!(names, ["a", "b"]);
/// # Ok::<_, terranetes::TerranetesError>(())
/// ```
///
/// # Errors
///
/// Returns [`TerranetesError::Parse`] when the text does not parse (blank
/// input included) and [`TerranetesError::UnknownBlockKind`] for keywords
/// outside the block table.
pub fn many_from_hcl(text: &str) -> Result<Vec<Block>> {
    let mut blocks = Vec::new();
    for (keyword, value) in sections(text, "document", loads::hcl(text)?)? {
        let kind = BlockKind::from_keyword(&keyword)
            .ok_or_else(|| TerranetesError::UnknownBlockKind { keyword })?;
        let section = sections(text, kind.keyword(), value)?;
        match kind.arity() {
            0 => blocks.push(Block::build(kind, Identity::Anonymous, Value::Object(section))),
            1 => {
                for (name, body) in section {
                    blocks.push(Block::build(kind, Identity::named(name), body));
                }
            }
            _ => {
                for (type_name, named) in section {
                    for (name, body) in sections(text, &type_name, named)? {
                        let identity = Identity::type_named(type_name.clone(), name);
                        blocks.push(Block::build(kind, identity, body));
                    }
                }
            }
        }
    }
    blocks.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    debug!(count = blocks.len(), "parsed hcl blocks");
    Ok(blocks)
}

/// Parse `text`, which must hold exactly one block.
///
/// # Errors
///
/// Returns [`TerranetesError::BlockCount`] when zero or several blocks are
/// found, plus every error of [`many_from_hcl`].
pub fn from_hcl(text: &str) -> Result<Block> {
    let mut blocks = many_from_hcl(text)?;
    match blocks.len() {
        1 => blocks.pop().ok_or(TerranetesError::BlockCount {
            expected: 1,
            found: 0,
        }),
        found => Err(TerranetesError::BlockCount { expected: 1, found }),
    }
}

/// Read `path` and parse its contents with [`many_from_hcl`].
///
/// # Errors
///
/// Returns [`TerranetesError::Io`] when the file cannot be read, plus every
/// error of [`many_from_hcl`].
pub fn from_hcl_file(path: &Utf8Path) -> Result<Vec<Block>> {
    let text = std::fs::read_to_string(path).with_path(path)?;
    many_from_hcl(&text)
}

fn sections(text: &str, label: &str, value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(TerranetesError::parse(
            SourceFormat::Hcl,
            text,
            format!("'{label}' must be a block, found {}", shape(&other)),
        )),
    }
}

const fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a block",
    }
}
