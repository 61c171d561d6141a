//! Temporary installation of variables into the process environment.
//!
//! Resolution itself never touches the process environment. A backup run
//! for a record read from an env file, however, expects that file's
//! assignments to be exported while it runs. [`ScopedEnv`] does that and
//! puts everything back afterwards.

use crate::core::ConfigRecord;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::env;
use std::ffi::OsString;

/// Serialises every mutation of the process environment made by this crate.
static ENV_LOCK: ReentrantMutex<()> = parking_lot::const_reentrant_mutex(());

/// Guard holding variables installed into the process environment.
///
/// Each [`set`](ScopedEnv::set) records the previous value of the key (or its
/// absence). Dropping the guard restores them in reverse order, so a key set
/// twice ends up with the value it had before the first set. While a guard is
/// alive other threads cannot create one; the same thread may nest them.
///
/// # Examples
///
/// ```rust,no_run
/// use backup_config_resolver::core::ScopedEnv;
///
/// {
///     let mut scope = ScopedEnv::new();
///     scope.set("BACKUP_SOURCES", "/srv/data");
///     assert_eq!(std::env::var("BACKUP_SOURCES").unwrap(), "/srv/data");
/// }
/// // restored here
/// ```
pub struct ScopedEnv {
    saved: Vec<(String, Option<OsString>)>,
    _lock: ReentrantMutexGuard<'static, ()>,
}

impl ScopedEnv {
    /// Start an empty scope, waiting for other threads' scopes to end.
    pub fn new() -> Self {
        Self {
            saved: Vec::new(),
            _lock: ENV_LOCK.lock(),
        }
    }

    /// Install all of `record.additional_env_vars` for the lifetime of the
    /// returned guard.
    pub fn for_record(record: &ConfigRecord) -> Self {
        let mut scope = Self::new();
        for (key, value) in &record.additional_env_vars {
            scope.set(key, value);
        }
        scope
    }

    /// Set `key` to `value` until the scope ends.
    ///
    /// Keys or values the platform cannot store (empty keys, `=` in keys, NUL
    /// bytes) are skipped.
    #[allow(unsafe_code)]
    pub fn set(&mut self, key: &str, value: &str) {
        if key.is_empty() || key.contains('=') || key.contains('\0') || value.contains('\0') {
            tracing::warn!(key, "skipping variable that cannot be exported");
            return;
        }
        self.saved.push((key.to_string(), env::var_os(key)));
        // SAFETY: every environment mutation in this crate happens under
        // ENV_LOCK, which this guard holds.
        unsafe {
            env::set_var(key, value);
        }
    }

    /// Number of assignments that will be undone.
    pub fn len(&self) -> usize {
        self.saved.len()
    }

    /// Whether nothing has been set.
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }
}

impl Default for ScopedEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScopedEnv {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        while let Some((key, previous)) = self.saved.pop() {
            // SAFETY: see `set`; the lock is released only after this loop.
            unsafe {
                match previous {
                    Some(value) => env::set_var(&key, value),
                    None => env::remove_var(&key),
                }
            }
        }
    }
}
