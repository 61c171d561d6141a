//! `KEY` / `KEY_FILE` secret indirection.

use super::Lookup;
use std::fs;

/// Suffix of the companion key pointing at a file that holds the value.
pub const FILE_SUFFIX: &str = "_FILE";

/// Resolve `key` either directly or through its `KEY_FILE` companion.
///
/// - only `KEY` set: its value
/// - only `KEY_FILE` set: the full contents of the referenced file
/// - both set: `None`, the value is ambiguous
/// - neither set: `None`
///
/// A `KEY_FILE` that cannot be read also yields `None`; a required field
/// then fails its own validation downstream.
pub fn resolve<L: Lookup + ?Sized>(lookup: &L, key: &str) -> Option<String> {
    let file_key = format!("{key}{FILE_SUFFIX}");
    match (lookup.lookup(key), lookup.lookup(&file_key)) {
        (Some(value), None) => Some(value),
        (None, Some(location)) => match fs::read_to_string(&location) {
            Ok(contents) => Some(contents),
            Err(e) => {
                tracing::warn!(
                    key,
                    path = %location,
                    error = %e,
                    "could not read secret file, treating key as unset"
                );
                None
            }
        },
        (Some(_), Some(_)) => {
            tracing::warn!(key, "both {} and {} are set, ignoring both", key, file_key);
            None
        }
        (None, None) => None,
    }
}

/// A [`Lookup`] applying secret indirection to every key it is asked for.
#[derive(Debug, Clone)]
pub struct SecretLookup<L> {
    inner: L,
}

impl<L: Lookup> SecretLookup<L> {
    /// Wrap `inner`.
    pub fn new(inner: L) -> Self {
        Self { inner }
    }
}

impl<L: Lookup> Lookup for SecretLookup<L> {
    fn lookup(&self, key: &str) -> Option<String> {
        resolve(&self.inner, key)
    }
}
