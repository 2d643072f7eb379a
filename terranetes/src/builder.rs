//! Auto-structuring builder for nested data.
//!
//! Nodes start [`AutoNode::Unset`] and take on a shape the first time they
//! are accessed: a key access turns them into a mapping, an index access into
//! a sequence. Accessing a node as a shape it does not have is an error rather
//! than a silent conversion.
//!
//! ```rust
//! use serde_json::json;
//! use terranetes::builder::{AutoNode, PathSegment};
//!
//! let mut root = AutoNode::default();
//! root.walk(&["spec".into(), "ports".into(), PathSegment::Index(1), "port".into()])?
//!     .set(json!(8080));
//! assert_eq!(
//!     root.into_value(),
//!     json!({"spec": {"ports": [null, {"port": 8080}]}})
//! );
//! # Ok::<_, terranetes::TerranetesError>(())
//! ```

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::{Result, TerranetesError};

/// Most unset items an index access may pad into a sequence.
pub const MAX_SEQUENCE_GAP: usize = 1024;

/// One step of a path through an [`AutoNode`] tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    /// Mapping key.
    Key(String),
    /// Sequence position.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// A node whose shape is fixed by its first access.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum AutoNode {
    /// Not accessed yet.
    #[default]
    Unset,
    /// Keyed children.
    Mapping(BTreeMap<String, AutoNode>),
    /// Positional children; gaps stay unset.
    Sequence(Vec<AutoNode>),
    /// Terminal value.
    Leaf(Value),
}

impl AutoNode {
    const fn shape(&self) -> &'static str {
        match self {
            Self::Unset => "unset node",
            Self::Mapping(_) => "mapping",
            Self::Sequence(_) => "sequence",
            Self::Leaf(_) => "leaf",
        }
    }

    /// Child under `name`, turning an unset node into a mapping.
    ///
    /// # Errors
    ///
    /// Returns [`TerranetesError::AccessMismatch`] when the node is a
    /// sequence or a leaf.
    pub fn key(&mut self, name: &str) -> Result<&mut Self> {
        if matches!(self, Self::Unset) {
            *self = Self::Mapping(BTreeMap::new());
        }
        match self {
            Self::Mapping(children) => Ok(children.entry(name.to_owned()).or_default()),
            other => Err(mismatch(other.shape(), "mapping")),
        }
    }

    /// Child at `index`, turning an unset node into a sequence and padding
    /// it with at most [`MAX_SEQUENCE_GAP`] unset nodes.
    ///
    /// # Errors
    ///
    /// Returns [`TerranetesError::AccessMismatch`] when the node is a
    /// mapping or a leaf and [`TerranetesError::SequenceGap`] when `index`
    /// lies too far past the end.
    pub fn index(&mut self, index: usize) -> Result<&mut Self> {
        if matches!(self, Self::Unset) {
            *self = Self::Sequence(Vec::new());
        }
        match self {
            Self::Sequence(items) => {
                let len = items.len();
                if index.saturating_sub(len) > MAX_SEQUENCE_GAP {
                    return Err(TerranetesError::SequenceGap {
                        index,
                        len,
                        limit: MAX_SEQUENCE_GAP,
                    });
                }
                if len <= index {
                    items.resize_with(index + 1, Self::default);
                }
                items
                    .get_mut(index)
                    .ok_or_else(|| mismatch("sequence", "sequence"))
            }
            other => Err(mismatch(other.shape(), "sequence")),
        }
    }

    /// Follow `path`, shaping unset nodes along the way.
    ///
    /// # Errors
    ///
    /// Returns [`TerranetesError::AccessMismatch`] at the first segment that
    /// conflicts with an existing shape.
    pub fn walk(&mut self, path: &[PathSegment]) -> Result<&mut Self> {
        let mut node = self;
        for segment in path {
            node = match segment {
                PathSegment::Key(name) => node.key(name)?,
                PathSegment::Index(index) => node.index(*index)?,
            };
        }
        Ok(node)
    }

    /// Replace this node with a leaf.
    pub fn set(&mut self, value: Value) {
        *self = Self::Leaf(value);
    }

    /// Convert the tree to plain data. Unset nodes become empty mappings,
    /// except inside sequences where they become `null`.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Unset => Value::Object(Map::new()),
            Self::Mapping(children) => Value::Object(
                children
                    .into_iter()
                    .map(|(key, child)| (key, child.into_value()))
                    .collect(),
            ),
            Self::Sequence(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| match item {
                        Self::Unset => Value::Null,
                        other => other.into_value(),
                    })
                    .collect(),
            ),
            Self::Leaf(value) => value,
        }
    }
}

const fn mismatch(actual: &'static str, requested: &'static str) -> TerranetesError {
    TerranetesError::AccessMismatch { actual, requested }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn untouched_root_is_empty_mapping() {
        assert_eq!(AutoNode::default().into_value(), json!({}));
    }

    #[rstest]
    fn keys_create_nested_mappings() -> anyhow::Result<()> {
        let mut root = AutoNode::default();
        root.key("a")?.key("b")?.set(json!(1));
        root.key("a")?.key("c")?;
        assert_eq!(root.into_value(), json!({"a": {"b": 1, "c": {}}}));
        Ok(())
    }

    #[rstest]
    fn index_pads_with_nulls() -> anyhow::Result<()> {
        let mut root = AutoNode::default();
        root.index(2)?.set(json!("third"));
        assert_eq!(root.into_value(), json!([null, null, "third"]));
        Ok(())
    }

    #[rstest]
    fn far_indices_are_rejected_without_growing() -> anyhow::Result<()> {
        let mut root = AutoNode::default();
        root.index(MAX_SEQUENCE_GAP)?;
        let err = root.index(usize::MAX).expect_err("index too far");
        assert!(matches!(
            err,
            TerranetesError::SequenceGap { index: usize::MAX, len, .. } if len == MAX_SEQUENCE_GAP + 1
        ));
        assert!(matches!(&root, AutoNode::Sequence(items) if items.len() == MAX_SEQUENCE_GAP + 1));
        Ok(())
    }

    #[rstest]
    #[case(vec![PathSegment::Key("a".into())], PathSegment::Index(0), "mapping")]
    #[case(vec![PathSegment::Index(0)], PathSegment::Key("a".into()), "sequence")]
    fn conflicting_access_is_rejected(
        #[case] first: Vec<PathSegment>,
        #[case] second: PathSegment,
        #[case] actual_shape: &str,
    ) -> anyhow::Result<()> {
        let mut root = AutoNode::default();
        root.walk(&first)?;
        let err = root.walk(&[second]).expect_err("shape conflict");
        assert!(matches!(
            err,
            TerranetesError::AccessMismatch { actual, .. } if actual == actual_shape
        ));
        Ok(())
    }

    #[rstest]
    fn leaves_refuse_children() {
        let mut root = AutoNode::default();
        root.set(json!("scalar"));
        assert!(root.key("a").is_err());
    }
}
