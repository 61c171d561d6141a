//! Strategy selection and dispatch.

use crate::core::ConfigRecord;
use crate::error::{ConfigError, Result, ResultExt};
use crate::sources::{
    ConfigSource, EnvDirSource, EnvSource, LabelSource, Lookup, VolumeInventory,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "validation")]
use crate::core::Validate;

/// The environment every source falls back to for keys it does not set.
pub type Ambient = Arc<dyn Lookup + Send + Sync>;

/// Where configuration records come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// One record from the process environment.
    Env,
    /// One record per file of the env-file directory, or the environment if
    /// the directory does not exist.
    Confd,
    /// One record per volume carrying namespaced labels.
    Labels,
}

impl Strategy {
    /// The identifier accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::Confd => "confd",
            Self::Labels => "labels",
        }
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    /// Parse `env`, `confd` (or its older name `envfile`) or `labels`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "env" => Ok(Self::Env),
            "confd" | "envfile" => Ok(Self::Confd),
            "labels" => Ok(Self::Labels),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves configuration records with a chosen [`Strategy`].
///
/// This is the single entry point for consumers of backup configuration.
/// Resolution is stateless: calling [`resolve`](Resolver::resolve) twice with
/// the same inputs yields the same records.
///
/// # Examples
///
/// ```rust,no_run
/// use backup_config_resolver::prelude::*;
///
/// let resolver = Resolver::builder().with_env_dir("/etc/dockervolumebackup/conf.d").build();
/// for record in resolver.resolve(Strategy::Confd)? {
///     println!("{} runs at {}", record.source, record.backup_cron_expression);
/// }
/// # Ok::<(), ConfigError>(())
/// ```
pub struct Resolver {
    pub(crate) env_dir: PathBuf,
    pub(crate) label_prefix: String,
    pub(crate) inventory: Option<Arc<dyn VolumeInventory>>,
    pub(crate) ambient: Ambient,
    #[cfg(feature = "validation")]
    pub(crate) validate: bool,
}

impl Resolver {
    /// The env-file directory used by [`Strategy::Confd`].
    pub fn env_dir(&self) -> &Path {
        &self.env_dir
    }

    /// The label namespace used by [`Strategy::Labels`].
    pub fn label_prefix(&self) -> &str {
        &self.label_prefix
    }

    /// Resolve records with `strategy`.
    ///
    /// - [`Strategy::Env`] yields exactly one record.
    /// - [`Strategy::Confd`] yields one record per file; a missing directory
    ///   falls back to [`Strategy::Env`].
    /// - [`Strategy::Labels`] yields one record per labelled volume, possibly
    ///   none.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; no partial results are returned.
    pub fn resolve(&self, strategy: Strategy) -> Result<Vec<ConfigRecord>> {
        tracing::info!(%strategy, "resolving configuration");

        let records = match strategy {
            Strategy::Env => self.env_source().load()?,
            Strategy::Confd => {
                let source = EnvDirSource::with_ambient(&self.env_dir, self.ambient.clone());
                match source.load() {
                    Ok(records) => records,
                    Err(e) if e.is_not_found() => {
                        tracing::info!(
                            directory = %self.env_dir.display(),
                            "env directory not found, falling back to environment"
                        );
                        return self.resolve(Strategy::Env);
                    }
                    Err(e) => return Err(e.context("error loading config files")),
                }
            }
            Strategy::Labels => {
                let inventory = self.inventory.clone().ok_or_else(|| {
                    ConfigError::LoadError(
                        "no volume inventory configured for the labels strategy".to_string(),
                    )
                })?;
                LabelSource::with_base(inventory, self.env_source())
                    .with_prefix(self.label_prefix.clone())
                    .load()
                    .context("error loading labels")?
            }
        };

        self.check(&records)?;
        tracing::info!(%strategy, count = records.len(), "resolved configuration");
        Ok(records)
    }

    /// Parse `strategy` and resolve with it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownStrategy`] for an unrecognised
    /// identifier, otherwise as [`resolve`](Resolver::resolve).
    pub fn resolve_str(&self, strategy: &str) -> Result<Vec<ConfigRecord>> {
        self.resolve(strategy.parse()?)
    }

    fn env_source(&self) -> EnvSource<Ambient> {
        EnvSource::with_lookup(self.ambient.clone())
    }

    #[cfg(feature = "validation")]
    fn check(&self, records: &[ConfigRecord]) -> Result<()> {
        if !self.validate {
            return Ok(());
        }
        for record in records {
            record.validate().map_err(|e| {
                ConfigError::from(e).context(format!("invalid configuration {}", record.source))
            })?;
        }
        Ok(())
    }

    #[cfg(not(feature = "validation"))]
    fn check(&self, _records: &[ConfigRecord]) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{ENV_SOURCE_NAME, StaticInventory, Volume};
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn ambient(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("env".parse::<Strategy>().unwrap(), Strategy::Env);
        assert_eq!("confd".parse::<Strategy>().unwrap(), Strategy::Confd);
        assert_eq!("envfile".parse::<Strategy>().unwrap(), Strategy::Confd);
        assert_eq!("labels".parse::<Strategy>().unwrap(), Strategy::Labels);
        assert!(matches!(
            "yaml".parse::<Strategy>(),
            Err(ConfigError::UnknownStrategy(s)) if s == "yaml"
        ));
    }

    #[test]
    fn test_resolve_env() {
        let resolver = Resolver::builder()
            .with_ambient(ambient(&[("BACKUP_ARCHIVE", "/mnt")]))
            .build();
        let records = resolver.resolve(Strategy::Env).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, ENV_SOURCE_NAME);
        assert_eq!(records[0].backup_archive, "/mnt");
    }

    #[test]
    fn test_confd_falls_back_to_env() {
        let temp_dir = TempDir::new().unwrap();
        let resolver = Resolver::builder()
            .with_env_dir(temp_dir.path().join("conf.d"))
            .with_ambient(ambient(&[("BACKUP_ARCHIVE", "/ambient")]))
            .build();

        let records = resolver.resolve(Strategy::Confd).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, ENV_SOURCE_NAME);
        assert_eq!(records[0].backup_archive, "/ambient");
    }

    #[test]
    fn test_confd_error_is_wrapped() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("bad.env"), "$(rm -rf /)\n").unwrap();
        let resolver = Resolver::builder()
            .with_env_dir(temp_dir.path())
            .with_ambient(ambient(&[]))
            .build();

        let err = resolver.resolve(Strategy::Confd).unwrap_err();
        assert!(err.to_string().starts_with("error loading config files"));
        assert!(matches!(err.root_cause(), ConfigError::Expansion { line: 1, .. }));
    }

    #[test]
    fn test_labels_without_inventory() {
        let resolver = Resolver::builder().with_ambient(ambient(&[])).build();
        assert!(matches!(
            resolver.resolve(Strategy::Labels),
            Err(ConfigError::LoadError(_))
        ));
    }

    #[test]
    fn test_labels_with_no_matching_volumes() {
        let resolver = Resolver::builder()
            .with_ambient(ambient(&[]))
            .with_inventory(StaticInventory::new(vec![Volume::new("plain", [("a", "b")])]))
            .build();
        assert!(resolver.resolve(Strategy::Labels).unwrap().is_empty());
    }

    #[test]
    fn test_labels_inventory_failure() {
        let resolver = Resolver::builder()
            .with_ambient(ambient(&[]))
            .with_inventory(|| -> Result<Vec<Volume>> {
                Err(ConfigError::Inventory("daemon unreachable".to_string()))
            })
            .build();
        let err = resolver.resolve(Strategy::Labels).unwrap_err();
        assert!(err.to_string().starts_with("error loading labels"));
        assert!(err.to_string().contains("daemon unreachable"));
    }

    #[test]
    fn test_resolve_str_unknown() {
        let resolver = Resolver::builder().with_ambient(ambient(&[])).build();
        assert!(matches!(
            resolver.resolve_str("swarm"),
            Err(ConfigError::UnknownStrategy(_))
        ));
    }

    #[cfg(feature = "validation")]
    #[test]
    fn test_validation_rejects_bad_records() {
        let resolver = Resolver::builder()
            .with_ambient(ambient(&[("BACKUP_CRON_EXPRESSION", "whenever")]))
            .with_validation(true)
            .build();
        let err = resolver.resolve(Strategy::Env).unwrap_err();
        assert!(err.to_string().contains("invalid configuration from environment"));

        let lenient = Resolver::builder()
            .with_ambient(ambient(&[("BACKUP_CRON_EXPRESSION", "whenever")]))
            .build();
        assert!(lenient.resolve(Strategy::Env).is_ok());
    }
}
