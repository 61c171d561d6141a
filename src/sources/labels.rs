//! Volume-label configuration source.

use super::inventory::{VolumeInventory, scan_volume_labels};
use super::{ConfigSource, EnvSource, Lookup, ProcessEnv};
use crate::core::record::{NotificationLevel, parse_notification_url, split_list};
use crate::core::{ConfigRecord, LabelOverride, cron};
use crate::error::{ConfigError, Result, ResultExt, ValidationError};
use std::collections::HashMap;
use std::sync::Arc;

/// Namespace of the labels this tool reads.
pub const DEFAULT_LABEL_PREFIX: &str = "dvbackup.";

/// Environment variable overriding [`DEFAULT_LABEL_PREFIX`].
pub const LABEL_PREFIX_ENV: &str = "LABEL_PREFIX";

/// Label-based configuration source.
///
/// Each volume carrying at least one label in the configured namespace
/// becomes one backup job. The job starts from the ambient environment
/// configuration and the volume's labels override it field by field.
pub struct LabelSource<L = ProcessEnv> {
    inventory: Arc<dyn VolumeInventory>,
    prefix: String,
    base: EnvSource<L>,
}

impl LabelSource {
    /// Create a source over `inventory` using [`DEFAULT_LABEL_PREFIX`] and the
    /// process environment as the base configuration.
    pub fn new(inventory: Arc<dyn VolumeInventory>) -> Self {
        Self::with_base(inventory, EnvSource::new())
    }
}

impl<L: Lookup> LabelSource<L> {
    /// Create a source whose records start from `base`.
    pub fn with_base(inventory: Arc<dyn VolumeInventory>, base: EnvSource<L>) -> Self {
        Self {
            inventory,
            prefix: DEFAULT_LABEL_PREFIX.to_string(),
            base,
        }
    }

    /// Use a different label namespace.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn load_volume(&self, name: &str, labels: &HashMap<String, String>) -> Result<ConfigRecord> {
        let mut record = self.base.load_record()?;

        let mut overlay = parse_basic_labels(labels, &self.prefix)
            .with_context(|| format!("error parsing labels for volume {}", name))?;
        parse_advanced_labels(labels, &self.prefix, &mut overlay)
            .with_context(|| format!("error parsing labels for volume {}", name))?;

        tracing::debug!(volume = name, fields = ?overlay.specified(), "applying label overrides");
        overlay.apply_to(&mut record);
        record.source = name.to_string();
        Ok(record)
    }
}

impl<L: Lookup + Send + Sync> ConfigSource for LabelSource<L> {
    fn load(&self) -> Result<Vec<ConfigRecord>> {
        let volumes = scan_volume_labels(self.inventory.as_ref(), &self.prefix)
            .context("error retrieving volume labels")?;

        let mut records = Vec::with_capacity(volumes.len());
        for (name, labels) in &volumes {
            records.push(self.load_volume(name, labels)?);
        }
        Ok(records)
    }

    fn name(&self) -> String {
        format!("labels:{}", self.prefix)
    }
}

/// Label keys with `prefix` removed where present.
fn normalize<'a>(labels: &'a HashMap<String, String>, prefix: &str) -> HashMap<&'a str, &'a str> {
    labels
        .iter()
        .map(|(key, value)| {
            let key = key.strip_prefix(prefix).unwrap_or(key);
            (key, value.as_str())
        })
        .collect()
}

fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ValidationError::invalid_field(key, reason).into()
}

/// Parse the basic labels into a fresh override:
///
/// - `schedule`: cron expression controlling when to run a backup
/// - `target`: backup archive path
/// - `rotation`: number of days to keep backups
///
/// Keys may be given with or without `prefix`.
///
/// # Errors
///
/// Returns a validation error if `schedule` is not a cron expression or
/// `rotation` is not a non-negative integer.
pub fn parse_basic_labels(labels: &HashMap<String, String>, prefix: &str) -> Result<LabelOverride> {
    let labels = normalize(labels, prefix);
    let mut overlay = LabelOverride::default();

    if let Some(&value) = labels.get("schedule") {
        cron::validate(value)
            .map_err(|e| invalid("schedule", format!("invalid schedule value {}: {}", value, e)))?;
        overlay.backup_cron_expression = value.to_string();
    }

    if let Some(&value) = labels.get("target") {
        overlay.backup_archive = value.to_string();
    }

    if let Some(&value) = labels.get("rotation") {
        overlay.backup_retention_days = value
            .trim()
            .parse()
            .map_err(|_| invalid("rotation", format!("invalid rotation value {}", value)))?;
    }

    Ok(overlay)
}

/// Parse the advanced labels into `overlay`:
///
/// - `gpg-passphrase`, `gpg-public-key-ring`, `age-passphrase`
/// - `age-public-keys`: comma separated
/// - `stop-during-backup`
/// - `notification-urls`: comma separated absolute URLs
/// - `notification-level`: `info` or `error`, case-insensitive
/// - `email-recipient`, `email-sender`
/// - `smtp-host`, `smtp-port`, `smtp-username`, `smtp-password`
///
/// Unknown keys are ignored.
///
/// # Errors
///
/// Returns a validation error for a malformed URL, an unknown notification
/// level or a non-numeric SMTP port.
pub fn parse_advanced_labels(
    labels: &HashMap<String, String>,
    prefix: &str,
    overlay: &mut LabelOverride,
) -> Result<()> {
    let labels = normalize(labels, prefix);

    for (&key, &value) in &labels {
        match key {
            "gpg-passphrase" => overlay.gpg_passphrase = value.to_string(),
            "gpg-public-key-ring" => overlay.gpg_public_key_ring = value.to_string(),
            "age-passphrase" => overlay.age_passphrase = value.to_string(),
            "age-public-keys" => overlay.age_public_keys = split_list(value),
            "stop-during-backup" => overlay.backup_stop_during_backup_label = value.to_string(),
            "notification-urls" => {
                let urls = split_list(value);
                for url in &urls {
                    parse_notification_url(url).map_err(ConfigError::from)?;
                }
                overlay.notification_urls = urls;
            }
            "notification-level" => {
                overlay.notification_level = value
                    .parse::<NotificationLevel>()
                    .map_err(ConfigError::from)?;
            }
            "smtp-port" => {
                overlay.email_smtp_port = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid("smtp-port", format!("invalid smtp-port value {}", value)))?;
            }
            "email-recipient" => overlay.email_notification_recipient = value.to_string(),
            "email-sender" => overlay.email_notification_sender = value.to_string(),
            "smtp-host" => overlay.email_smtp_host = value.to_string(),
            "smtp-username" => overlay.email_smtp_username = value.to_string(),
            "smtp-password" => overlay.email_smtp_password = value.to_string(),
            "schedule" | "target" | "rotation" => {}
            unknown => tracing::debug!(label = unknown, "ignoring unknown label"),
        }
    }

    Ok(())
}
