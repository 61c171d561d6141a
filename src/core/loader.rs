//! Populates a [`ConfigRecord`] by walking the environment schema.

use crate::core::record::{ConfigRecord, FieldKind, SCHEMA, SchemaField, split_list};
use crate::error::{ConfigError, Result};
use crate::sources::{Lookup, SecretLookup};

/// Builds complete [`ConfigRecord`]s from a [`Lookup`].
///
/// Every key in [`SCHEMA`] is resolved through secret indirection; keys that
/// are not set fall back to their schema default. Values are merged with the
/// `config` crate and deserialized into the record, which coerces numbers and
/// booleans from their string form.
pub struct ConfigLoader<L> {
    lookup: SecretLookup<L>,
}

impl<L: Lookup> ConfigLoader<L> {
    /// Create a loader reading from `lookup`.
    pub fn new(lookup: L) -> Self {
        Self {
            lookup: SecretLookup::new(lookup),
        }
    }

    /// Populate a record.
    ///
    /// The returned record has an empty `source`; callers tag provenance.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be converted to its field type,
    /// e.g. a non-numeric `BACKUP_RETENTION_DAYS`.
    pub fn load(&self) -> Result<ConfigRecord> {
        let mut builder = config::Config::builder();

        for field in SCHEMA {
            let name = field.field_name();
            builder = builder
                .set_default(&name, to_value(field, field.default))
                .map_err(|e| {
                    ConfigError::LoadError(format!("Failed to set default for {}: {}", field.key, e))
                })?;

            if let Some(raw) = self.lookup.lookup(field.key) {
                builder = builder.set_override(&name, to_value(field, &raw)).map_err(|e| {
                    ConfigError::LoadError(format!("Failed to set {}: {}", field.key, e))
                })?;
            }
        }

        let config = builder
            .build()
            .map_err(|e| ConfigError::LoadError(format!("Failed to build configuration: {}", e)))?;

        config.try_deserialize::<ConfigRecord>().map_err(|e| {
            ConfigError::DeserializationError(format!(
                "failed to process configuration values: {}",
                e
            ))
        })
    }
}

fn to_value(field: &SchemaField, raw: &str) -> config::Value {
    match field.kind {
        FieldKind::Scalar => config::Value::from(raw.to_string()),
        FieldKind::List => config::Value::from(split_list(raw)),
    }
}

impl ConfigRecord {
    /// Populate a record from `lookup`, see [`ConfigLoader`].
    pub fn from_lookup<L: Lookup>(lookup: L) -> Result<Self> {
        ConfigLoader::new(lookup).load()
    }
}
