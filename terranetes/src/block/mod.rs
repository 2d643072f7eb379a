//! Terraform blocks with zero, one or two identity fields.
//!
//! A [`Block`] stores its identity as plain attributes; the export key path
//! (`kind`, then type, then name) is computed when the block is exported, so
//! renaming never rewrites the body.

mod hcl;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Map, Value, json};

use crate::loads::singleton;
use crate::merge::merge_value;
use crate::{Result, TerranetesError};

pub use self::hcl::{from_hcl, from_hcl_file, many_from_hcl};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u64);

impl BlockId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// The Terraform keyword a block is exported under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockKind {
    /// `terraform { ... }`
    Terraform,
    /// `locals { ... }`
    Locals,
    /// `variable "name" { ... }`
    Variable,
    /// `output "name" { ... }`
    Output,
    /// `module "name" { ... }`
    Module,
    /// `provider "name" { ... }`
    Provider,
    /// `resource "type" "name" { ... }`
    Resource,
    /// `data "type" "name" { ... }`
    Data,
}

impl BlockKind {
    /// Every kind, in keyword-table order.
    pub const ALL: [Self; 8] = [
        Self::Terraform,
        Self::Locals,
        Self::Variable,
        Self::Output,
        Self::Module,
        Self::Provider,
        Self::Resource,
        Self::Data,
    ];

    /// Keyword used in HCL and in the exported document.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Terraform => "terraform",
            Self::Locals => "locals",
            Self::Variable => "variable",
            Self::Output => "output",
            Self::Module => "module",
            Self::Provider => "provider",
            Self::Resource => "resource",
            Self::Data => "data",
        }
    }

    /// Number of identity fields blocks of this kind carry.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Terraform | Self::Locals => 0,
            Self::Variable | Self::Output | Self::Module | Self::Provider => 1,
            Self::Resource | Self::Data => 2,
        }
    }

    /// Look up the kind for an HCL keyword.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.keyword() == keyword)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Identity fields of a block.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Identity {
    /// No identity fields.
    Anonymous,
    /// A single name.
    Named {
        /// Block name.
        name: String,
    },
    /// A type and a name.
    TypeNamed {
        /// Resource or data source type.
        type_name: String,
        /// Block name.
        name: String,
    },
}

impl Identity {
    /// Build a one-field identity.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named { name: name.into() }
    }

    /// Build a two-field identity.
    #[must_use]
    pub fn type_named(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self::TypeNamed {
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// Number of identity fields.
    #[must_use]
    pub const fn arity(&self) -> usize {
        match self {
            Self::Anonymous => 0,
            Self::Named { .. } => 1,
            Self::TypeNamed { .. } => 2,
        }
    }

    fn segments(&self) -> Vec<&str> {
        match self {
            Self::Anonymous => Vec::new(),
            Self::Named { name } => vec![name.as_str()],
            Self::TypeNamed { type_name, name } => vec![type_name.as_str(), name.as_str()],
        }
    }
}

/// A Terraform configuration block.
///
/// Cloning a block is a deep copy that receives a fresh [`BlockId`].
/// Equality compares kind, identity and body, never the id.
#[derive(Debug)]
pub struct Block {
    id: BlockId,
    kind: BlockKind,
    identity: Identity,
    body: Value,
}

impl Clone for Block {
    fn clone(&self) -> Self {
        Self::build(self.kind, self.identity.clone(), self.body.clone())
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.identity == other.identity && self.body == other.body
    }
}

impl Block {
    fn build(kind: BlockKind, identity: Identity, body: Value) -> Self {
        Self {
            id: BlockId::next(),
            kind,
            identity,
            body,
        }
    }

    /// Create a block, checking the identity against the kind's arity.
    ///
    /// # Errors
    ///
    /// Returns [`TerranetesError::IdentityArity`] when `identity` does not
    /// carry the number of fields `kind` takes.
    pub fn new(kind: BlockKind, identity: Identity, body: Value) -> Result<Self> {
        check_arity(kind, &identity)?;
        Ok(Self::build(kind, identity, body))
    }

    /// `terraform` settings block.
    #[must_use]
    pub fn terraform(body: Value) -> Self {
        Self::build(BlockKind::Terraform, Identity::Anonymous, body)
    }

    /// `locals` block.
    #[must_use]
    pub fn locals(body: Value) -> Self {
        Self::build(BlockKind::Locals, Identity::Anonymous, body)
    }

    /// `variable` block.
    #[must_use]
    pub fn variable(name: impl Into<String>, body: Value) -> Self {
        Self::build(BlockKind::Variable, Identity::named(name), body)
    }

    /// `output` block.
    #[must_use]
    pub fn output(name: impl Into<String>, body: Value) -> Self {
        Self::build(BlockKind::Output, Identity::named(name), body)
    }

    /// `output` block whose body is `{"value": value}`.
    #[must_use]
    pub fn output_value(name: impl Into<String>, value: Value) -> Self {
        Self::output(name, json!({ "value": value }))
    }

    /// `module` block.
    #[must_use]
    pub fn module(name: impl Into<String>, body: Value) -> Self {
        Self::build(BlockKind::Module, Identity::named(name), body)
    }

    /// `provider` block.
    #[must_use]
    pub fn provider(name: impl Into<String>, body: Value) -> Self {
        Self::build(BlockKind::Provider, Identity::named(name), body)
    }

    /// `resource` block.
    #[must_use]
    pub fn resource(type_name: impl Into<String>, name: impl Into<String>, body: Value) -> Self {
        Self::build(BlockKind::Resource, Identity::type_named(type_name, name), body)
    }

    /// `data` block.
    #[must_use]
    pub fn data(type_name: impl Into<String>, name: impl Into<String>, body: Value) -> Self {
        Self::build(BlockKind::Data, Identity::type_named(type_name, name), body)
    }

    /// One `variable` block per entry, each with body `{"default": value}`.
    #[must_use]
    pub fn variables(defaults: Map<String, Value>) -> Vec<Self> {
        defaults
            .into_iter()
            .map(|(name, value)| Self::variable(name, json!({ "default": value })))
            .collect()
    }

    /// One `output` block per entry, each with body `{"value": value}`.
    #[must_use]
    pub fn outputs(values: Map<String, Value>) -> Vec<Self> {
        values
            .into_iter()
            .map(|(name, value)| Self::output_value(name, value))
            .collect()
    }

    /// Block with the same kind and identity but a different body.
    pub(crate) fn with_body(&self, body: Value) -> Self {
        Self::build(self.kind, self.identity.clone(), body)
    }

    /// Identifier assigned at construction.
    #[must_use]
    pub const fn id(&self) -> BlockId {
        self.id
    }

    /// Block keyword.
    #[must_use]
    pub const fn kind(&self) -> BlockKind {
        self.kind
    }

    /// Current identity fields.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Type field of two-identity blocks.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        match &self.identity {
            Identity::TypeNamed { type_name, .. } => Some(type_name),
            _ => None,
        }
    }

    /// Name field of one- and two-identity blocks.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.identity {
            Identity::Named { name } | Identity::TypeNamed { name, .. } => Some(name),
            Identity::Anonymous => None,
        }
    }

    /// Block body.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }

    /// Mutable block body.
    pub const fn body_mut(&mut self) -> &mut Value {
        &mut self.body
    }

    /// Replace the identity fields.
    ///
    /// # Errors
    ///
    /// Returns [`TerranetesError::IdentityArity`] when `identity` does not
    /// match the kind's arity.
    pub fn rename(&mut self, identity: Identity) -> Result<()> {
        check_arity(self.kind, &identity)?;
        self.identity = identity;
        Ok(())
    }

    /// Change the name field.
    ///
    /// # Errors
    ///
    /// Returns [`TerranetesError::IdentityArity`] for anonymous kinds.
    pub fn set_name(&mut self, new_name: impl Into<String>) -> Result<()> {
        match &mut self.identity {
            Identity::Named { name } | Identity::TypeNamed { name, .. } => {
                *name = new_name.into();
                Ok(())
            }
            Identity::Anonymous => Err(arity_error(self.kind)),
        }
    }

    /// Change the type field.
    ///
    /// # Errors
    ///
    /// Returns [`TerranetesError::IdentityArity`] unless the kind takes two
    /// identity fields.
    pub fn set_type(&mut self, new_type: impl Into<String>) -> Result<()> {
        match &mut self.identity {
            Identity::TypeNamed { type_name, .. } => {
                *type_name = new_type.into();
                Ok(())
            }
            _ => Err(arity_error(self.kind)),
        }
    }

    /// Deep-merge `partial` into the body.
    pub fn update(&mut self, partial: Value) {
        merge_value(&mut self.body, partial);
    }

    /// Keys the block is stored under when exported.
    #[must_use]
    pub fn key_path(&self) -> Vec<String> {
        std::iter::once(self.kind.keyword())
            .chain(self.identity.segments())
            .map(ToOwned::to_owned)
            .collect()
    }

    /// Storage form: the body nested under the key path.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_json::json;
    /// use terranetes::block::Block;
    ///
    /// let block = Block::resource("aws_s3_bucket", "logs", json!({"acl": "private"}));
    /// assert_eq!(
    ///     block.to_document(),
    ///     json!({"resource": {"aws_s3_bucket": {"logs": {"acl": "private"}}}})
    /// );
    /// ```
    #[must_use]
    pub fn to_document(&self) -> Value {
        self.key_path()
            .iter()
            .rev()
            .fold(self.body.clone(), |inner, key| singleton(key, inner))
    }

    /// Independent deep copy with a fresh id.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Canonical ordering key: keyword, then type, then name.
    #[must_use]
    pub fn sort_key(&self) -> (&'static str, &str, &str) {
        (
            self.kind.keyword(),
            self.type_name().unwrap_or(""),
            self.name().unwrap_or(""),
        )
    }
}

const fn check_arity(kind: BlockKind, identity: &Identity) -> Result<()> {
    if identity.arity() == kind.arity() {
        Ok(())
    } else {
        Err(arity_error(kind))
    }
}

const fn arity_error(kind: BlockKind) -> TerranetesError {
    TerranetesError::IdentityArity {
        kind: kind.keyword(),
        arity: kind.arity(),
    }
}
