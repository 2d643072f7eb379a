//! Upward search for the shared library directory.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::{Result, TerranetesError};

/// Default name of the library directory.
pub const DEFAULT_LIBRARY_DIR: &str = "terranetes";

/// Default bound on the number of parent directories visited.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Finds the nearest ancestor directory with a given name.
///
/// # Examples
///
/// ```rust,no_run
/// use camino::Utf8Path;
/// use terranetes::script::LibraryResolver;
///
/// let resolver = LibraryResolver::default();
/// if let Some(dir) = resolver.resolve(Utf8Path::new("/srv/infra/app"))? {
///     println!("modules load from {dir}");
/// }
/// # Ok::<_, terranetes::TerranetesError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryResolver {
    dir_name: String,
    max_depth: usize,
}

impl Default for LibraryResolver {
    fn default() -> Self {
        Self::new(DEFAULT_LIBRARY_DIR, DEFAULT_MAX_DEPTH)
    }
}

impl LibraryResolver {
    /// Resolver for directories called `dir_name`, visiting at most
    /// `max_depth` parents.
    #[must_use]
    pub fn new(dir_name: impl Into<String>, max_depth: usize) -> Self {
        Self {
            dir_name: dir_name.into(),
            max_depth,
        }
    }

    /// Name searched for.
    #[must_use]
    pub fn dir_name(&self) -> &str {
        &self.dir_name
    }

    /// Maximum number of parents visited.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Walk from `start` towards the root and return the first
    /// `start/.../<dir_name>` directory found.
    ///
    /// # Errors
    ///
    /// Returns [`TerranetesError::TraversalDepthExceeded`] when more than
    /// `max_depth` parents would have to be visited.
    pub fn resolve(&self, start: &Utf8Path) -> Result<Option<Utf8PathBuf>> {
        let mut here = start;
        let mut depth = 0;
        loop {
            let candidate = here.join(&self.dir_name);
            if candidate.is_dir() {
                debug!(start = %start, library = %candidate, "resolved library directory");
                return Ok(Some(candidate));
            }
            let Some(parent) = here.parent() else {
                debug!(start = %start, "no library directory");
                return Ok(None);
            };
            if depth >= self.max_depth {
                return Err(TerranetesError::TraversalDepthExceeded {
                    start: start.to_path_buf(),
                    max_depth: self.max_depth,
                });
            }
            depth += 1;
            here = parent;
        }
    }
}
