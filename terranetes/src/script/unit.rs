//! Compiled scripts.

use camino::{Utf8Path, Utf8PathBuf};

use crate::artifact::Artifact;

/// One compiled script and the artifacts it produced.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptUnit {
    path: Utf8PathBuf,
    base_dir: Utf8PathBuf,
    library_dir: Option<Utf8PathBuf>,
    artifacts: Vec<Artifact>,
}

impl ScriptUnit {
    pub(crate) const fn new(
        path: Utf8PathBuf,
        base_dir: Utf8PathBuf,
        library_dir: Option<Utf8PathBuf>,
        artifacts: Vec<Artifact>,
    ) -> Self {
        Self {
            path,
            base_dir,
            library_dir,
            artifacts,
        }
    }

    /// Script source path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Directory containing the script; relative outputs resolve here.
    #[must_use]
    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    /// Library directory visible to the script's `require`.
    #[must_use]
    pub fn library_dir(&self) -> Option<&Utf8Path> {
        self.library_dir.as_deref()
    }

    /// Harvested artifacts in render order.
    #[must_use]
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }
}
