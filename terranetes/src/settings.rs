//! Layered pipeline settings.
//!
//! Settings are merged from, lowest precedence first: built-in defaults, a
//! TOML file (`terranetes.toml` unless another path is given), environment
//! variables prefixed with `TERRANETES_`, and caller overrides.

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::script::{DEFAULT_EXTENSION, DEFAULT_LIBRARY_DIR, DEFAULT_MAX_DEPTH};
use crate::values::DEFAULT_VALUES_FILE;
use crate::{Result, TerranetesError};

/// Settings file looked up when no explicit path is given.
pub const CONFIG_FILE: &str = "terranetes.toml";

/// Prefix of environment variables overriding settings.
pub const ENV_PREFIX: &str = "TERRANETES_";

/// Pipeline and watcher settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Reject duplicate Terraform blocks unless a context opts out.
    pub strict: bool,
    /// Script extension, without the leading dot.
    pub script_extension: String,
    /// Name of the library directory searched for upwards.
    pub library_dir_name: String,
    /// Bound on the upward library directory search.
    pub max_library_depth: usize,
    /// Name of hierarchical values files.
    pub values_file_name: String,
    /// Seed values from values files above the generation root.
    pub values_from_files: bool,
    /// Seed values from the process environment.
    pub values_from_env: bool,
    /// Ignore dotfiles when watching.
    pub ignore_dotfiles: bool,
    /// Watcher debounce window in milliseconds.
    pub debounce_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strict: false,
            script_extension: DEFAULT_EXTENSION.to_owned(),
            library_dir_name: DEFAULT_LIBRARY_DIR.to_owned(),
            max_library_depth: DEFAULT_MAX_DEPTH,
            values_file_name: DEFAULT_VALUES_FILE.to_owned(),
            values_from_files: false,
            values_from_env: false,
            ignore_dotfiles: true,
            debounce_ms: 200,
        }
    }
}

/// Caller overrides merged above every other layer. Unset fields leave the
/// lower layers alone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SettingsOverrides {
    /// Overrides [`Settings::strict`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
    /// Overrides [`Settings::values_from_files`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values_from_files: Option<bool>,
    /// Overrides [`Settings::values_from_env`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values_from_env: Option<bool>,
    /// Overrides [`Settings::ignore_dotfiles`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_dotfiles: Option<bool>,
}

impl Settings {
    /// Figment holding the defaults, the settings file and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`TerranetesError::Io`] when an explicit `config` path does not
    /// name a file. The default file is optional.
    pub fn figment(config: Option<&Utf8Path>) -> Result<Figment> {
        let file = match config {
            Some(path) if !path.is_file() => {
                return Err(TerranetesError::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "settings file not found"),
                ));
            }
            Some(path) => path.to_path_buf(),
            None => Utf8PathBuf::from(CONFIG_FILE),
        };
        Ok(Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file.as_std_path()))
            .merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Load settings without caller overrides.
    ///
    /// # Errors
    ///
    /// See [`Self::load_with`].
    pub fn load(config: Option<&Utf8Path>) -> Result<Self> {
        Self::load_with(config, &SettingsOverrides::default())
    }

    /// Load settings with `overrides` on top.
    ///
    /// # Errors
    ///
    /// Returns [`TerranetesError::Settings`] when a layer cannot be parsed
    /// or holds a value of the wrong type.
    pub fn load_with(config: Option<&Utf8Path>, overrides: &SettingsOverrides) -> Result<Self> {
        Ok(Self::figment(config)?
            .merge(Serialized::defaults(overrides))
            .extract()?)
    }
}
