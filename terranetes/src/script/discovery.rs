//! Script discovery under a root path.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::{Result, TerranetesError};

/// Default extension of script files.
pub const DEFAULT_EXTENSION: &str = "tn";

/// Returns `true` when `path` names a file with extension `extension`.
#[must_use]
pub fn is_script(path: &Utf8Path, extension: &str) -> bool {
    path.extension() == Some(extension)
}

/// List the scripts under `root`.
///
/// A file root is returned as is, whatever its extension. A directory root is
/// walked recursively with entries sorted by file name; only files ending in
/// `.{extension}` are returned. Symlinks to files count as files; linked
/// directories are not descended into. Entries whose paths are not UTF-8 are
/// skipped.
///
/// # Errors
///
/// Returns [`TerranetesError::Discovery`] when `root` does not exist and
/// [`TerranetesError::Io`] when a directory cannot be read.
pub fn discover(root: &Utf8Path, extension: &str) -> Result<Vec<Utf8PathBuf>> {
    if !root.exists() {
        return Err(TerranetesError::Discovery {
            path: root.to_path_buf(),
        });
    }
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut scripts = Vec::new();
    for walked in WalkDir::new(root).sort_by_file_name() {
        let entry = walked.map_err(|err| {
            let path = err
                .path()
                .and_then(Utf8Path::from_path)
                .unwrap_or(root)
                .to_path_buf();
            TerranetesError::io(&path, std::io::Error::from(err))
        })?;
        if !entry.path().is_file() {
            continue;
        }
        let Some(path) = Utf8Path::from_path(entry.path()) else {
            debug!(path = ?entry.path(), "skipping non UTF-8 path");
            continue;
        };
        if is_script(path, extension) {
            scripts.push(path.to_path_buf());
        }
    }
    debug!(root = %root, count = scripts.len(), "discovered scripts");
    Ok(scripts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use rstest::rstest;
    use test_helpers::FixtureTree;

    #[rstest]
    fn directories_are_walked_in_name_order() -> Result<()> {
        let tree = FixtureTree::with_files([
            ("b.tn", ""),
            ("a/z.tn", ""),
            ("a/notes.txt", ""),
            ("a/b/c.tn", ""),
            ("c.tnx", ""),
        ])?;
        let found = discover(tree.root(), DEFAULT_EXTENSION)?;
        assert_eq!(
            found,
            [tree.path("a/b/c.tn"), tree.path("a/z.tn"), tree.path("b.tn")]
        );
        Ok(())
    }

    #[cfg(unix)]
    #[rstest]
    fn linked_scripts_are_discovered() -> Result<()> {
        let tree = FixtureTree::with_files([
            ("shared/real.lua", "out = cfg.json()"),
            ("app/local.tn", ""),
        ])?;
        std::os::unix::fs::symlink(tree.path("shared/real.lua"), tree.path("app/main.tn"))?;
        std::os::unix::fs::symlink(tree.path("shared/gone.lua"), tree.path("app/dangling.tn"))?;

        let found = discover(&tree.path("app"), DEFAULT_EXTENSION)?;

        assert_eq!(found, [tree.path("app/local.tn"), tree.path("app/main.tn")]);
        Ok(())
    }

    #[rstest]
    fn file_roots_are_returned_verbatim() -> Result<()> {
        let tree = FixtureTree::with_files([("only.lua", "")])?;
        let file = tree.path("only.lua");
        assert_eq!(discover(&file, DEFAULT_EXTENSION)?, [file.clone()]);
        Ok(())
    }

    #[rstest]
    fn missing_roots_fail() -> Result<()> {
        let tree = FixtureTree::new()?;
        let missing = tree.path("nope");
        let err = discover(&missing, DEFAULT_EXTENSION).expect_err("root is missing");
        assert!(matches!(err, TerranetesError::Discovery { ref path } if *path == missing));
        Ok(())
    }

    #[rstest]
    #[case("main.tn", true)]
    #[case("main.tn.bak", false)]
    #[case("tn", false)]
    fn extension_matching(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_script(Utf8Path::new(path), "tn"), expected);
    }
}
