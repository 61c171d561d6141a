//! Environment variable configuration source.

use super::{ConfigSource, Lookup, ProcessEnv};
use crate::core::ConfigRecord;
use crate::error::{Result, ResultExt};

/// Provenance of records read from the environment.
pub const ENV_SOURCE_NAME: &str = "from environment";

/// Environment variable configuration source.
///
/// Produces exactly one record from the process environment, or from any
/// other [`Lookup`] standing in for it.
///
/// # Examples
///
/// ```rust,no_run
/// use backup_config_resolver::sources::EnvSource;
///
/// let record = EnvSource::new().load_record()?;
/// assert_eq!(record.source, "from environment");
/// # Ok::<(), backup_config_resolver::error::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct EnvSource<L = ProcessEnv> {
    lookup: L,
}

impl EnvSource {
    /// Create a source reading the process environment.
    pub fn new() -> Self {
        Self { lookup: ProcessEnv }
    }
}

impl Default for EnvSource {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Lookup> EnvSource<L> {
    /// Create a source reading from `lookup` instead of the process
    /// environment.
    pub fn with_lookup(lookup: L) -> Self {
        Self { lookup }
    }

    /// Resolve the single record.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be converted to its field type.
    pub fn load_record(&self) -> Result<ConfigRecord> {
        let mut record = ConfigRecord::from_lookup(&self.lookup)
            .context("error loading config from environment")?;
        record.source = ENV_SOURCE_NAME.to_string();
        Ok(record)
    }
}

impl<L: Lookup + Send + Sync> ConfigSource for EnvSource<L> {
    fn load(&self) -> Result<Vec<ConfigRecord>> {
        tracing::debug!("loading configuration from environment");
        Ok(vec![self.load_record()?])
    }

    fn name(&self) -> String {
        "env".to_string()
    }
}
