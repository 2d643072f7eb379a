//! Primary error enum for the generation pipeline.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::block::Block;

/// Serialisation syntax a parse failure originated from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SourceFormat {
    /// HCL block text.
    Hcl,
    /// YAML, single or multi-document.
    Yaml,
    /// JSON.
    Json,
}

impl SourceFormat {
    /// Returns the lowercase name used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hcl => "hcl",
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict-mode collision between two blocks sharing one export key path.
#[derive(Debug, Clone)]
pub struct DuplicateBlock {
    /// Block rebuilt from the entry already present in the document.
    pub existing: Block,
    /// Block whose addition was rejected.
    pub incoming: Block,
}

/// Errors that can occur while compiling and rendering scripts.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TerranetesError {
    /// The discovery root does not exist.
    #[error("no such file or directory: '{path}'")]
    Discovery {
        /// Root passed to discovery.
        path: Utf8PathBuf,
    },

    /// An external parser rejected its input.
    #[error("Unable to parse {format} source: {source}\n--- source ---\n{source_text}")]
    Parse {
        /// Syntax that failed to parse.
        format: SourceFormat,
        /// The offending text.
        source_text: String,
        /// Underlying parser error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A top-level HCL keyword has no block constructor.
    #[error("unknown block kind '{keyword}'")]
    UnknownBlockKind {
        /// The unrecognised keyword.
        keyword: String,
    },

    /// Strict-mode aggregate already holds a block at the same key path.
    #[error(
        "duplicate block {}: already defined as {:?}",
        .0.incoming.key_path().join("."),
        .0.existing.body()
    )]
    DuplicateBlock(Box<DuplicateBlock>),

    /// Neither an explicit output path nor an input path was available.
    #[error("no output path for {format} artifact: set an explicit output")]
    MissingOutputTarget {
        /// Format of the artifact that could not be placed.
        format: &'static str,
    },

    /// Library directory search walked past its depth bound.
    #[error("directory tree too deep while searching upward from '{start}' (limit {max_depth})")]
    TraversalDepthExceeded {
        /// Directory the search started from.
        start: Utf8PathBuf,
        /// Configured bound.
        max_depth: usize,
    },

    /// `from_hcl` and friends expected a different number of blocks.
    #[error("expected exactly {expected} block(s) but found {found}")]
    BlockCount {
        /// Required number of blocks.
        expected: usize,
        /// Number of blocks parsed.
        found: usize,
    },

    /// An identity operation does not match the kind's arity.
    #[error("block kind '{kind}' takes {arity} identity field(s)")]
    IdentityArity {
        /// Block keyword.
        kind: &'static str,
        /// Number of identity fields the kind takes.
        arity: usize,
    },

    /// A Kubernetes object body is unusable.
    #[error("invalid kubernetes object: {message}")]
    InvalidObject {
        /// Explanation of the problem.
        message: String,
    },

    /// INI output only supports sections of scalars.
    #[error("invalid ini data at '{key}': {message}")]
    InvalidIni {
        /// Offending key.
        key: String,
        /// Explanation of the problem.
        message: String,
    },

    /// An auto-structured node was accessed as the wrong shape.
    #[error("node is a {actual} but was accessed as a {requested}")]
    AccessMismatch {
        /// Shape the node already has.
        actual: &'static str,
        /// Shape implied by the access.
        requested: &'static str,
    },

    /// An auto-structured sequence was indexed too far past its end.
    #[error("position {index} is more than {limit} past the end of a sequence of {len} items")]
    SequenceGap {
        /// Zero-based index requested.
        index: usize,
        /// Length of the sequence at the time of access.
        len: usize,
        /// Largest number of unset items that may be padded in.
        limit: usize,
    },

    /// The script interpreter reported an error.
    #[error("script '{path}' failed: {source}")]
    Script {
        /// Script being executed.
        path: Utf8PathBuf,
        /// Interpreter error, including the traceback.
        #[source]
        source: mlua::Error,
    },

    /// Wraps a failure with the script unit it belongs to.
    #[error("while processing '{path}': {source}")]
    Unit {
        /// Script unit being compiled or rendered.
        path: Utf8PathBuf,
        /// Underlying failure.
        #[source]
        source: Box<TerranetesError>,
    },

    /// Filesystem access failed.
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// Path being accessed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialising a payload failed.
    #[error("failed to serialise {format} output: {message}")]
    Render {
        /// Output format.
        format: &'static str,
        /// Serialiser message.
        message: String,
    },

    /// Settings could not be assembled from their layers.
    #[error("failed to load settings: {0}")]
    Settings(#[from] Box<figment::Error>),
}
