//! The resolved configuration record and its environment schema.

use crate::error::ValidationError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How a raw environment value is turned into a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Passed through as a string; numbers and booleans are coerced during
    /// deserialization.
    Scalar,
    /// Comma separated, see [`split_list`].
    List,
}

/// One environment-backed field of [`ConfigRecord`].
#[derive(Debug, Clone, Copy)]
pub struct SchemaField {
    /// Environment variable name. The record field is its lower-cased form.
    pub key: &'static str,
    /// Value conversion.
    pub kind: FieldKind,
    /// Value used when the key is not set.
    pub default: &'static str,
}

impl SchemaField {
    const fn scalar(key: &'static str, default: &'static str) -> Self {
        Self {
            key,
            kind: FieldKind::Scalar,
            default,
        }
    }

    const fn list(key: &'static str) -> Self {
        Self {
            key,
            kind: FieldKind::List,
            default: "",
        }
    }

    /// Name of the [`ConfigRecord`] field this entry populates.
    pub fn field_name(&self) -> String {
        self.key.to_ascii_lowercase()
    }
}

/// Every environment-backed field of [`ConfigRecord`].
///
/// Each entry is looked up through secret indirection, so any of these keys
/// can also be supplied as `KEY_FILE`.
pub const SCHEMA: &[SchemaField] = &[
    SchemaField::scalar("BACKUP_CRON_EXPRESSION", "@daily"),
    SchemaField::scalar("BACKUP_FILENAME", "backup-%Y-%m-%dT%H-%M-%S.tar.gz"),
    SchemaField::scalar("BACKUP_FILENAME_EXPAND", "false"),
    SchemaField::scalar("BACKUP_LATEST_SYMLINK", ""),
    SchemaField::scalar("BACKUP_ARCHIVE", "/archive"),
    SchemaField::scalar("BACKUP_SOURCES", "/backup"),
    SchemaField::scalar("BACKUP_RETENTION_DAYS", "0"),
    SchemaField::scalar("BACKUP_PRUNING_PREFIX", ""),
    SchemaField::scalar("BACKUP_STOP_DURING_BACKUP_LABEL", "true"),
    SchemaField::scalar("GPG_PASSPHRASE", ""),
    SchemaField::scalar("GPG_PUBLIC_KEY_RING", ""),
    SchemaField::scalar("AGE_PASSPHRASE", ""),
    SchemaField::list("AGE_PUBLIC_KEYS"),
    SchemaField::list("NOTIFICATION_URLS"),
    SchemaField::scalar("NOTIFICATION_LEVEL", "error"),
    SchemaField::scalar("EMAIL_NOTIFICATION_RECIPIENT", ""),
    SchemaField::scalar("EMAIL_NOTIFICATION_SENDER", "noreply@nohost"),
    SchemaField::scalar("EMAIL_SMTP_HOST", ""),
    SchemaField::scalar("EMAIL_SMTP_PORT", "587"),
    SchemaField::scalar("EMAIL_SMTP_USERNAME", ""),
    SchemaField::scalar("EMAIL_SMTP_PASSWORD", ""),
    SchemaField::scalar("AWS_S3_BUCKET_NAME", ""),
    SchemaField::scalar("AWS_ENDPOINT", "s3.amazonaws.com"),
    SchemaField::scalar("AWS_ACCESS_KEY_ID", ""),
    SchemaField::scalar("AWS_SECRET_ACCESS_KEY", ""),
    SchemaField::scalar("WEBDAV_URL", ""),
    SchemaField::scalar("WEBDAV_USERNAME", ""),
    SchemaField::scalar("WEBDAV_PASSWORD", ""),
    SchemaField::scalar("SSH_HOST_NAME", ""),
    SchemaField::scalar("SSH_PORT", "22"),
    SchemaField::scalar("SSH_USER", ""),
    SchemaField::scalar("SSH_PASSWORD", ""),
    SchemaField::scalar("EXEC_LABEL", ""),
    SchemaField::scalar("EXEC_FORWARD_OUTPUT", "false"),
];

/// Split a comma separated list, trimming entries and dropping blank ones.
///
/// `""` and `" , "` both yield an empty list.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a notification target, which must be an absolute URL.
pub fn parse_notification_url(value: &str) -> Result<url::Url, ValidationError> {
    url::Url::parse(value).map_err(|e| {
        ValidationError::invalid_field(
            "notification-urls",
            format!("invalid notification url {}: {}", value, e),
        )
    })
}

/// Which events trigger a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum NotificationLevel {
    /// Not specified.
    #[default]
    Unset,
    /// Notify on every run.
    Info,
    /// Notify on failures only.
    Error,
}

impl NotificationLevel {
    /// The canonical lower-case spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unset => "",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

impl FromStr for NotificationLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" => Ok(Self::Unset),
            "info" => Ok(Self::Info),
            "error" => Ok(Self::Error),
            _ => Err(ValidationError::invalid_field(
                "notification-level",
                format!("invalid notification level {}", s),
            )),
        }
    }
}

impl TryFrom<String> for NotificationLevel {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, ValidationError> {
        value.parse()
    }
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full configuration of one backup job.
///
/// Field names are the lower-cased environment variable names listed in
/// [`SCHEMA`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigRecord {
    /// Cron expression controlling when the job runs.
    pub backup_cron_expression: String,
    /// Archive file name, may contain strftime placeholders.
    pub backup_filename: String,
    /// Expand environment variables in `backup_filename`.
    pub backup_filename_expand: bool,
    /// Name of a symlink pointing at the most recent archive.
    pub backup_latest_symlink: String,
    /// Local directory archives are written to.
    pub backup_archive: String,
    /// Directory that gets archived.
    pub backup_sources: String,
    /// Days to keep archives; 0 keeps them forever.
    pub backup_retention_days: u32,
    /// Only archives with this prefix are pruned.
    pub backup_pruning_prefix: String,
    /// Value of the label marking containers to stop during backup.
    pub backup_stop_during_backup_label: String,

    /// Symmetric GPG passphrase.
    pub gpg_passphrase: String,
    /// Armored GPG public key ring.
    pub gpg_public_key_ring: String,
    /// Age passphrase.
    pub age_passphrase: String,
    /// Age recipient public keys.
    pub age_public_keys: Vec<String>,

    /// Notification target URLs.
    pub notification_urls: Vec<String>,
    /// Which runs trigger notifications.
    pub notification_level: NotificationLevel,
    /// Recipient of email notifications.
    pub email_notification_recipient: String,
    /// Sender of email notifications.
    pub email_notification_sender: String,
    /// SMTP host.
    pub email_smtp_host: String,
    /// SMTP port.
    pub email_smtp_port: u16,
    /// SMTP user.
    pub email_smtp_username: String,
    /// SMTP password.
    pub email_smtp_password: String,

    /// S3 bucket receiving archives.
    pub aws_s3_bucket_name: String,
    /// S3 endpoint.
    pub aws_endpoint: String,
    /// S3 access key id.
    pub aws_access_key_id: String,
    /// S3 secret access key.
    pub aws_secret_access_key: String,

    /// WebDAV server URL.
    pub webdav_url: String,
    /// WebDAV user.
    pub webdav_username: String,
    /// WebDAV password.
    pub webdav_password: String,

    /// SSH host receiving archives.
    pub ssh_host_name: String,
    /// SSH port.
    pub ssh_port: u16,
    /// SSH user.
    pub ssh_user: String,
    /// SSH password.
    pub ssh_password: String,

    /// Only run exec hooks of containers carrying this label value.
    pub exec_label: String,
    /// Forward output of exec hooks.
    pub exec_forward_output: bool,

    /// Where this record came from: `from environment`, an env file name or
    /// a volume name.
    #[serde(skip)]
    pub source: String,

    /// Assignments read from the env file this record was built from.
    #[serde(skip)]
    pub additional_env_vars: BTreeMap<String, String>,
}
