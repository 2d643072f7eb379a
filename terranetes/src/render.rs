//! Writes rendered artifacts to disk.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::{Dir, OpenOptions};
use tracing::info;

use crate::artifact::Artifact;
use crate::environment::ExecutionEnv;
use crate::{IoResultExt, Result, TerranetesError};

/// Render `artifact` and write it to its destination.
///
/// Relative destinations resolve against the environment's working
/// directory. Parent directories are created and existing files truncated.
///
/// # Errors
///
/// Returns [`TerranetesError::MissingOutputTarget`] when the artifact has no
/// destination, the payload's render error, or [`TerranetesError::Io`] when
/// writing fails.
pub fn write_artifact(artifact: &Artifact, env: &ExecutionEnv) -> Result<Utf8PathBuf> {
    let path = env.resolve(&artifact.output_path()?);
    let contents = artifact.render_to_string()?;
    write_file(&path, &contents)?;
    info!(path = %path, format = artifact.payload().format_name(), "wrote artifact");
    Ok(path)
}

fn write_file(path: &Utf8Path, contents: &str) -> Result<()> {
    let (parent, file_name) = match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => (parent, name),
        _ => {
            return Err(TerranetesError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file path"),
            ));
        }
    };
    let dir = ensure_dir(parent)?;
    let mut file = dir
        .open_with(
            file_name,
            OpenOptions::new().write(true).create(true).truncate(true),
        )
        .with_path(path)?;
    file.write_all(contents.as_bytes()).with_path(path)
}

fn ensure_dir(path: &Utf8Path) -> Result<Dir> {
    match Dir::open_ambient_dir(path, ambient_authority()) {
        Ok(dir) => Ok(dir),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Dir::create_ambient_dir_all(path, ambient_authority()).with_path(path)?;
            Dir::open_ambient_dir(path, ambient_authority()).with_path(path)
        }
        Err(err) => Err(TerranetesError::io(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Payload;
    use crate::document::ConfigDocument;
    use anyhow::Result;
    use rstest::rstest;
    use serde_json::{Map, json};
    use test_helpers::FixtureTree;

    #[rstest]
    fn relative_outputs_land_under_working_dir() -> Result<()> {
        let tree = FixtureTree::new()?;
        let env = ExecutionEnv::new(tree.path("app"));
        let mut data = Map::new();
        data.insert("k".to_owned(), json!("v"));
        let mut doc = ConfigDocument::json();
        doc.add(data);
        let artifact = Artifact::new(Payload::Config(doc)).with_output("nested/out.json");

        let written = write_artifact(&artifact, &env)?;

        assert_eq!(written, tree.path("app/nested/out.json"));
        assert_eq!(tree.read("app/nested/out.json")?, "{\n    \"k\": \"v\"\n}");
        Ok(())
    }

    #[rstest]
    fn existing_files_are_truncated() -> Result<()> {
        let tree = FixtureTree::with_files([("out.ini", "a much longer previous content\n")])?;
        let env = ExecutionEnv::new(tree.root());
        let artifact = Artifact::new(Payload::Config(ConfigDocument::ini())).with_output("out.ini");
        write_artifact(&artifact, &env)?;
        assert_eq!(tree.read("out.ini")?, "");
        Ok(())
    }
}
