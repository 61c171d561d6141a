//! Configuration validation support.

use crate::core::cron;
use crate::core::record::{ConfigRecord, parse_notification_url};
use crate::error::ValidationError;

/// Trait for configuration validation.
///
/// Resolution only rejects values it cannot represent. Implementations of
/// this trait check the semantic constraints a backup run relies on, and the
/// resolver can be asked to apply them to every record it returns.
///
/// # Examples
///
/// ```rust
/// use backup_config_resolver::core::Validate;
/// use backup_config_resolver::error::ValidationError;
///
/// struct Retention {
///     days: u32,
/// }
///
/// impl Validate for Retention {
///     fn validate(&self) -> Result<(), ValidationError> {
///         if self.days > 3650 {
///             return Err(ValidationError::invalid_field(
///                 "days",
///                 "must be at most ten years",
///             ));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validate {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Should return a `ValidationError` describing what validation failed.
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for ConfigRecord {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        if self.source.is_empty() {
            errors.push(ValidationError::invalid_field("source", "must not be empty"));
        }

        if let Err(e) = cron::validate(&self.backup_cron_expression) {
            errors.push(ValidationError::invalid_field(
                "BACKUP_CRON_EXPRESSION",
                format!("{:?}: {}", self.backup_cron_expression, e),
            ));
        }

        for url in &self.notification_urls {
            if let Err(e) = parse_notification_url(url) {
                errors.push(e);
            }
        }

        for (field, list) in [
            ("AGE_PUBLIC_KEYS", &self.age_public_keys),
            ("NOTIFICATION_URLS", &self.notification_urls),
        ] {
            if list.iter().any(|entry| entry.trim().is_empty()) {
                errors.push(ValidationError::invalid_field(field, "contains an empty entry"));
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }
}
