//! Error types for the `terranetes` binary.

use camino::Utf8PathBuf;
use terranetes::TerranetesError;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Generation or settings failure.
    #[error(transparent)]
    Terranetes(#[from] TerranetesError),

    /// The file watcher could not be created or attached.
    #[error("failed to watch '{path}': {source}")]
    Watch {
        /// Directory being watched.
        path: Utf8PathBuf,
        /// Watcher error.
        #[source]
        source: notify_debouncer_mini::notify::Error,
    },

    /// The interrupt handler could not be installed.
    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    /// The log subscriber could not be installed.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// Result alias for CLI commands.
pub type Result<T, E = CliError> = std::result::Result<T, E>;
