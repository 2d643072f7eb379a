//! Temporary directory trees for filesystem-driven tests.
//!
//! # Examples
//!
//! ```
//! use terranetes_test_helpers::FixtureTree;
//!
//! let tree = FixtureTree::with_files([("infra/main.tn", "-- empty")])?;
//! assert!(tree.path("infra/main.tn").is_file());
//! # Ok::<_, anyhow::Error>(())
//! ```

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// A temporary directory removed when the value is dropped.
#[derive(Debug)]
pub struct FixtureTree {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl FixtureTree {
    /// Create an empty tree.
    ///
    /// The root is canonicalised so it compares equal to paths produced by
    /// code that canonicalises its inputs.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or its path is
    /// not UTF-8.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temporary directory")?;
        let canonical = dir
            .path()
            .canonicalize()
            .context("canonicalise temporary directory")?;
        let root = Utf8PathBuf::from_path_buf(canonical)
            .map_err(|path| anyhow!("non-UTF-8 temporary directory: {}", path.display()))?;
        Ok(Self { _dir: dir, root })
    }

    /// Create a tree holding `files`, given as `(relative path, contents)`.
    ///
    /// # Errors
    ///
    /// Returns an error when any file cannot be written.
    pub fn with_files<I, P, C>(files: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: AsRef<str>,
    {
        let tree = Self::new()?;
        for (path, contents) in files {
            tree.write(path.as_ref(), contents.as_ref())?;
        }
        Ok(tree)
    }

    /// Root directory of the tree.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Absolute path of `relative` inside the tree.
    #[must_use]
    pub fn path(&self, relative: &str) -> Utf8PathBuf {
        self.root.join(relative)
    }

    /// Write `contents` to `relative`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error when the directories or the file cannot be written.
    pub fn write(&self, relative: &str, contents: &str) -> Result<Utf8PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
        std::fs::write(&path, contents).with_context(|| format!("write {path}"))?;
        Ok(path)
    }

    /// Create the directory `relative` and its parents.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn mkdir(&self, relative: &str) -> Result<Utf8PathBuf> {
        let path = self.path(relative);
        std::fs::create_dir_all(&path).with_context(|| format!("create {path}"))?;
        Ok(path)
    }

    /// Read `relative` back as a string.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read.
    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.path(relative);
        std::fs::read_to_string(&path).with_context(|| format!("read {path}"))
    }
}
