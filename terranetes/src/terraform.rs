//! Aggregation of blocks into one Terraform JSON document.

use serde_json::{Map, Value};
use tracing::debug;

use crate::block::Block;
use crate::merge::merge_value;
use crate::{Result, TerranetesError, emit};

/// One Terraform JSON document built from blocks.
///
/// Adding a block deep-merges its storage form into the document, so later
/// edits of the block never reach into the document. In strict mode an add
/// whose exact key path already exists is rejected.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use terranetes::block::Block;
/// use terranetes::terraform::TerraformDocument;
///
/// let mut doc = TerraformDocument::new();
/// doc.add(&Block::resource("a", "b", json!({"count": 1})))?
///     .add(&Block::resource("a", "c", json!({"count": 2})))?;
/// assert_eq!(doc.lookup(&["resource", "a", "c", "count"]), Some(&json!(2)));
/// # Ok::<_, terranetes::TerranetesError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TerraformDocument {
    data: Value,
    strict: bool,
}

impl Default for TerraformDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl TerraformDocument {
    /// Empty, permissive document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Value::Object(Map::new()),
            strict: false,
        }
    }

    /// Empty document rejecting duplicate key paths.
    #[must_use]
    pub fn strict() -> Self {
        Self::new().with_strict(true)
    }

    /// Set the duplicate policy.
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Whether duplicate key paths are rejected.
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.strict
    }

    /// Merged document data.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Merge `block` into the document.
    ///
    /// # Errors
    ///
    /// Returns [`TerranetesError::DuplicateBlock`] in strict mode when the
    /// block's key path is already present.
    pub fn add(&mut self, block: &Block) -> Result<&mut Self> {
        let key_path = block.key_path();
        if self.strict {
            if let Some(existing) = self.lookup(key_path.as_slice()) {
                return Err(TerranetesError::duplicate(
                    block.with_body(existing.clone()),
                    block.clone(),
                ));
            }
        }
        debug!(key_path = %key_path.join("."), "adding block");
        merge_value(&mut self.data, block.to_document());
        Ok(self)
    }

    /// Merge every block in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// See [`Self::add`].
    pub fn add_all<'a, I>(&mut self, blocks: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = &'a Block>,
    {
        for block in blocks {
            self.add(block)?;
        }
        Ok(self)
    }

    /// Copy of this document with `block` added; `self` is untouched.
    ///
    /// # Errors
    ///
    /// See [`Self::add`].
    pub fn with_block(&self, block: &Block) -> Result<Self> {
        let mut fork = self.clone();
        fork.add(block)?;
        Ok(fork)
    }

    /// Copy of this document with `blocks` added; `self` is untouched.
    ///
    /// # Errors
    ///
    /// See [`Self::add`].
    pub fn with_blocks<'a, I>(&self, blocks: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Block>,
    {
        let mut fork = self.clone();
        fork.add_all(blocks)?;
        Ok(fork)
    }

    /// Walk `path` through the document.
    ///
    /// Returns `None` when a key is missing or an intermediate node is not a
    /// mapping.
    #[must_use]
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        path.iter()
            .try_fold(&self.data, |node, key| node.as_object()?.get(key.as_ref()))
    }

    /// Render as JSON with sorted keys and a four-space indent.
    ///
    /// # Errors
    ///
    /// Returns [`TerranetesError::Render`] when serialisation fails.
    pub fn render(&self) -> Result<String> {
        emit::json_pretty(&self.data)
    }
}
