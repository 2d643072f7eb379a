//! Values collected from `values.yaml` files in a directory and its ancestors.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value};
use tracing::debug;

use crate::merge::merge_value;
use crate::{IoResultExt, Result, SourceFormat, TerranetesError, loads};

/// Conventional name of values files.
pub const DEFAULT_VALUES_FILE: &str = "values.yaml";

/// Merge every `file_name` found from the filesystem root down to `start`.
///
/// Files in directories closer to `start` override those further up.
/// Empty files contribute nothing.
///
/// # Errors
///
/// Returns [`TerranetesError::Discovery`] when `start` does not exist,
/// [`TerranetesError::Io`] when a file cannot be read and
/// [`TerranetesError::Parse`] when a file is not a YAML mapping.
pub fn values_from_files(start: &Utf8Path, file_name: &str) -> Result<Map<String, Value>> {
    let resolved = start
        .canonicalize_utf8()
        .map_err(|_| TerranetesError::Discovery {
            path: start.to_path_buf(),
        })?;

    let mut found: Vec<Utf8PathBuf> = resolved
        .ancestors()
        .map(|dir| dir.join(file_name))
        .filter(|candidate| candidate.is_file())
        .collect();
    found.reverse();

    let mut acc = Value::Object(Map::new());
    for path in found {
        debug!(path = %path, "loading values file");
        let text = std::fs::read_to_string(&path).with_path(&path)?;
        match loads::yaml(&text).map_err(|err| err.in_unit(&path))? {
            Value::Null => {}
            layer @ Value::Object(_) => merge_value(&mut acc, layer),
            _ => {
                return Err(TerranetesError::parse(
                    SourceFormat::Yaml,
                    text,
                    format!("values file '{path}' must contain a mapping"),
                )
                .in_unit(&path));
            }
        }
    }

    Ok(match acc {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}
