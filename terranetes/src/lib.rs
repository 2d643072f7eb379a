//! Core crate for `terranetes`.
//!
//! Small Lua scripts build Terraform blocks, Kubernetes objects and plain
//! configuration data; this crate merges that data into documents and
//! writes them as Terraform JSON, Kubernetes YAML streams or JSON, YAML and
//! INI files.
//!
//! The [`pipeline::Pipeline`] discovers `.tn` scripts, compiles each one in
//! its own scoped [`environment::ExecutionEnv`] and renders the artifacts it
//! produced:
//!
//! ```rust,no_run
//! use camino::Utf8Path;
//! use terranetes::pipeline::Pipeline;
//! use terranetes::script::Compiler;
//!
//! for path in Pipeline::new(Compiler::default()).generate(Utf8Path::new("infra"))? {
//!     println!("wrote {path}");
//! }
//! # Ok::<_, terranetes::TerranetesError>(())
//! ```
//!
//! The building blocks are usable on their own:
//!
//! ```rust
//! use serde_json::json;
//! use terranetes::block::Block;
//! use terranetes::terraform::TerraformDocument;
//!
//! let mut doc = TerraformDocument::new();
//! doc.add(&Block::resource("aws_s3_bucket", "logs", json!({"acl": "private"})))?;
//! assert_eq!(
//!     doc.lookup(&["resource", "aws_s3_bucket", "logs", "acl"]),
//!     Some(&json!("private"))
//! );
//! # Ok::<_, terranetes::TerranetesError>(())
//! ```

pub mod artifact;
pub mod block;
pub mod builder;
pub mod document;
mod emit;
pub mod environment;
mod error;
pub mod kubernetes;
pub mod loads;
pub mod merge;
pub mod pipeline;
pub mod render;
mod result_ext;
pub mod script;
pub mod settings;
pub mod terraform;
pub mod values;

pub use error::{DuplicateBlock, Result, SourceFormat, TerranetesError};
pub use result_ext::IoResultExt;
