//! Helpers for safely mutating environment variables in tests.
//!
//! Each mutation acquires a global re-entrant mutex and returns an RAII guard
//! that restores the previous state when dropped. Stacked guards for the same
//! key restore in LIFO order. Use [`lock`] when a test reads the environment
//! as a whole and must not observe other tests' mutations.
//!
//! # Examples
//!
//! ```
//! use terranetes_test_helpers::env;
//!
//! let _g = env::set_var("TERRANETES_DOC_KEY", "VALUE");
//! assert_eq!(std::env::var("TERRANETES_DOC_KEY").ok().as_deref(), Some("VALUE"));
//! ```

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::env;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::sync::LazyLock;

static ENV_MUTEX: LazyLock<ReentrantMutex<()>> = LazyLock::new(ReentrantMutex::default);

/// RAII guard restoring an environment variable to its prior value on drop.
#[must_use = "dropping restores the prior value"]
pub struct EnvVarGuard {
    key: String,
    original: Option<OsString>,
}

impl fmt::Debug for EnvVarGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvVarGuard")
            .field("key", &self.key)
            .field("had_original", &self.original.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        let _guard = ENV_MUTEX.lock();
        match self.original.take() {
            // SAFETY: `ENV_MUTEX` is held for the duration of the write.
            Some(value) => unsafe { env::set_var(&self.key, value) },
            // SAFETY: as above.
            None => unsafe { env::remove_var(&self.key) },
        }
    }
}

fn mutate<F>(key: String, mutator: F) -> EnvVarGuard
where
    F: FnOnce(&str),
{
    let _guard = ENV_MUTEX.lock();
    let original = env::var_os(&key);
    mutator(&key);
    EnvVarGuard { key, original }
}

/// Sets an environment variable and returns a guard restoring its prior value.
pub fn set_var<K, V>(key: K, value: V) -> EnvVarGuard
where
    K: Into<String>,
    V: AsRef<OsStr>,
{
    // SAFETY: `mutate` holds `ENV_MUTEX` while the closure runs.
    mutate(key.into(), |k| unsafe { env::set_var(k, value.as_ref()) })
}

/// Removes an environment variable and returns a guard restoring its prior value.
pub fn remove_var<K>(key: K) -> EnvVarGuard
where
    K: Into<String>,
{
    // SAFETY: `mutate` holds `ENV_MUTEX` while the closure runs.
    mutate(key.into(), |k| unsafe { env::remove_var(k) })
}

/// RAII guard serialising environment access for its lifetime.
#[must_use = "dropping releases the environment lock"]
pub struct EnvLock {
    _guard: ReentrantMutexGuard<'static, ()>,
}

impl fmt::Debug for EnvLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvLock").finish_non_exhaustive()
    }
}

/// Acquire the global environment lock.
///
/// The lock is re-entrant, so guards created while it is held do not block.
///
/// # Examples
/// ```
/// use terranetes_test_helpers::env;
///
/// let _lock = env::lock();
/// let _guard = env::set_var("TERRANETES_DOC_LOCKED", "1");
/// ```
pub fn lock() -> EnvLock {
    EnvLock {
        _guard: ENV_MUTEX.lock(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current(key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    #[test]
    fn set_var_restores_absent_key() {
        let key = "TERRANETES_HELPERS_ABSENT";
        let _lock = lock();
        let cleared = remove_var(key);
        {
            let _g = set_var(key, "during");
            assert_eq!(current(key).as_deref(), Some("during"));
        }
        assert_eq!(current(key), None);
        drop(cleared);
    }

    #[test]
    fn stacked_guards_restore_in_reverse_order() {
        let key = "TERRANETES_HELPERS_STACKED";
        let _lock = lock();
        let outer = set_var(key, "outer");
        let inner = set_var(key, "inner");
        assert_eq!(current(key).as_deref(), Some("inner"));
        drop(inner);
        assert_eq!(current(key).as_deref(), Some("outer"));
        drop(outer);
    }
}
