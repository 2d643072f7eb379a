//! Constructors and inspection helpers for `TerranetesError`.

use camino::{Utf8Path, Utf8PathBuf};

use super::types::{DuplicateBlock, SourceFormat, TerranetesError};
use crate::block::Block;

impl TerranetesError {
    /// Construct a parse error that keeps both the source text and the
    /// parser's own error.
    #[must_use]
    pub fn parse(
        format: SourceFormat,
        source_text: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Parse {
            format,
            source_text: source_text.into(),
            source: source.into(),
        }
    }

    /// Construct an I/O error for `path`.
    #[must_use]
    pub fn io(path: &Utf8Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Construct a strict-mode duplicate error.
    #[must_use]
    pub fn duplicate(existing: Block, incoming: Block) -> Self {
        Self::DuplicateBlock(Box::new(DuplicateBlock { existing, incoming }))
    }

    /// Construct a render error from any serialiser failure.
    #[must_use]
    pub fn render(format: &'static str, err: &impl std::fmt::Display) -> Self {
        Self::Render {
            format,
            message: err.to_string(),
        }
    }

    /// Attach the script unit path to an error raised while processing it.
    ///
    /// Errors that already name their unit are returned untouched.
    #[must_use]
    pub fn in_unit(self, path: &Utf8Path) -> Self {
        match self {
            Self::Unit { .. } | Self::Script { .. } => self,
            other => Self::Unit {
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }

    /// Returns the innermost error, looking through [`Self::Unit`] wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Unit { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns the path of the script unit the error belongs to, if known.
    #[must_use]
    pub const fn unit_path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Unit { path, .. } | Self::Script { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<figment::Error> for TerranetesError {
    fn from(err: figment::Error) -> Self {
        Self::Settings(Box::new(err))
    }
}
