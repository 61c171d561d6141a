//! Builder for constructing Resolver instances.

use crate::core::resolver::{Ambient, Resolver};
use crate::sources::{
    DEFAULT_ENV_DIR, DEFAULT_LABEL_PREFIX, LABEL_PREFIX_ENV, Lookup, ProcessEnv, VolumeInventory,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Builder for constructing a [`Resolver`].
///
/// Provides a fluent interface for configuring where each strategy reads
/// from.
///
/// # Examples
///
/// ```rust,no_run
/// use backup_config_resolver::prelude::*;
/// use backup_config_resolver::sources::{StaticInventory, Volume};
///
/// let inventory = StaticInventory::new(vec![Volume::new(
///     "db-data",
///     [("dvbackup.schedule", "@hourly")],
/// )]);
///
/// let resolver = Resolver::builder()
///     .with_label_prefix("dvbackup.")
///     .with_inventory(inventory)
///     .build();
/// let records = resolver.resolve(Strategy::Labels)?;
/// # Ok::<(), ConfigError>(())
/// ```
pub struct ResolverBuilder {
    env_dir: PathBuf,
    label_prefix: String,
    inventory: Option<Arc<dyn VolumeInventory>>,
    ambient: Option<Ambient>,
    #[cfg(feature = "validation")]
    validate: bool,
}

impl ResolverBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            env_dir: PathBuf::from(DEFAULT_ENV_DIR),
            label_prefix: DEFAULT_LABEL_PREFIX.to_string(),
            inventory: None,
            ambient: None,
            #[cfg(feature = "validation")]
            validate: false,
        }
    }

    /// Create a builder whose label prefix honours the `LABEL_PREFIX`
    /// environment variable.
    pub fn from_env() -> Self {
        let builder = Self::new();
        match ProcessEnv.lookup(LABEL_PREFIX_ENV) {
            Some(prefix) if !prefix.is_empty() => builder.with_label_prefix(prefix),
            _ => builder,
        }
    }

    /// Set the env-file directory read by the `confd` strategy.
    pub fn with_env_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_dir = path.into();
        self
    }

    /// Set the label namespace read by the `labels` strategy.
    pub fn with_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = prefix.into();
        self
    }

    /// Set the volume inventory queried by the `labels` strategy.
    pub fn with_inventory<I: VolumeInventory + 'static>(mut self, inventory: I) -> Self {
        self.inventory = Some(Arc::new(inventory));
        self
    }

    /// Set an already shared volume inventory.
    pub fn with_shared_inventory(mut self, inventory: Arc<dyn VolumeInventory>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    /// Read ambient values from `lookup` instead of the process environment.
    ///
    /// Mostly useful in tests, where mutating the process environment is
    /// unsafe.
    pub fn with_ambient<L: Lookup + Send + Sync + 'static>(mut self, lookup: L) -> Self {
        self.ambient = Some(Arc::new(lookup));
        self
    }

    /// Validate every resolved record before returning it.
    #[cfg(feature = "validation")]
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    /// Build the resolver.
    pub fn build(self) -> Resolver {
        Resolver {
            env_dir: self.env_dir,
            label_prefix: self.label_prefix,
            inventory: self.inventory,
            ambient: self.ambient.unwrap_or_else(|| Arc::new(ProcessEnv)),
            #[cfg(feature = "validation")]
            validate: self.validate,
        }
    }
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    /// Create a new builder for constructing a resolver.
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::new()
    }
}
