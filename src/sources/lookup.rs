//! Key lookup capability shared by every configuration source.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A read-only view of key/value pairs, modelled after `std::env::var`.
///
/// Each source supplies its own implementation (the process environment,
/// the assignments of an env file layered over the process environment, ...).
/// Secret indirection and schema population are written purely against this
/// trait.
pub trait Lookup {
    /// Return the value for `key`, or `None` if it is not set.
    fn lookup(&self, key: &str) -> Option<String>;
}

impl<L: Lookup + ?Sized> Lookup for &L {
    fn lookup(&self, key: &str) -> Option<String> {
        (**self).lookup(key)
    }
}

impl<L: Lookup + ?Sized> Lookup for Arc<L> {
    fn lookup(&self, key: &str) -> Option<String> {
        (**self).lookup(key)
    }
}

impl Lookup for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl Lookup for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Adapter turning a closure into a [`Lookup`].
pub struct FnLookup<F>(pub F);

impl<F> Lookup for FnLookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }
}

/// The live process environment.
///
/// Values that are not valid unicode are treated as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Lookup for ProcessEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Two lookups consulted most-specific first.
///
/// `Layered::new(file_vars, ProcessEnv)` answers from `file_vars` when the key
/// is present there and only then asks the process environment.
#[derive(Debug, Clone)]
pub struct Layered<A, B> {
    top: A,
    bottom: B,
}

impl<A, B> Layered<A, B> {
    /// Stack `top` over `bottom`.
    pub fn new(top: A, bottom: B) -> Self {
        Self { top, bottom }
    }
}

impl<A: Lookup, B: Lookup> Lookup for Layered<A, B> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.top.lookup(key).or_else(|| self.bottom.lookup(key))
    }
}
