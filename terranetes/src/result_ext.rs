//! Extensions for mapping foreign errors to `TerranetesError` concisely.
//!
//! These helpers reduce repetitive `.map_err(|e| TerranetesError::…)`
//! patterns at filesystem boundaries.
//!
//! # Examples
//!
//! ```
//! use camino::Utf8Path;
//! use terranetes::{IoResultExt, Result};
//!
//! fn read(path: &Utf8Path) -> Result<String> {
//!     std::fs::read_to_string(path).with_path(path)
//! }
//! # assert!(read(Utf8Path::new("/does/not/exist")).is_err());
//! ```

use camino::Utf8Path;

use crate::{Result, TerranetesError};

/// Attach a path to `std::io::Error` results.
pub trait IoResultExt<T> {
    /// Convert into a [`TerranetesError::Io`] naming `path`.
    ///
    /// # Errors
    ///
    /// Propagates the original error wrapped with `path`.
    fn with_path(self, path: &Utf8Path) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: &Utf8Path) -> Result<T> {
        self.map_err(|err| TerranetesError::io(path, err))
    }
}
