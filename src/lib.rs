//! # backup-config-resolver
//!
//! Configuration resolution for scheduled volume backups.
//!
//! ## Overview
//!
//! A backup agent needs one [`ConfigRecord`](core::ConfigRecord) per backup
//! job. This crate produces those records from one of three strategies:
//!
//! - **env**: a single record from the process environment
//! - **confd**: one record per env file in a directory, each file read the way
//!   a shell would `source` it
//! - **labels**: one record per volume carrying namespaced labels, overlaid on
//!   the environment record
//!
//! Every environment key can be supplied indirectly as `KEY_FILE`, naming a
//! file that holds the value.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use backup_config_resolver::prelude::*;
//!
//! let resolver = Resolver::builder()
//!     .with_env_dir("/etc/dockervolumebackup/conf.d")
//!     .build();
//!
//! for record in resolver.resolve_str("confd")? {
//!     println!("{}: {} -> {}", record.source, record.backup_sources, record.backup_archive);
//! }
//! # Ok::<(), ConfigError>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `validation` (default): the [`Validate`](core::Validate) trait and
//!   [`ResolverBuilder::with_validation`](core::ResolverBuilder::with_validation)

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod sources;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{ConfigRecord, NotificationLevel, Resolver, ResolverBuilder, Strategy};
    pub use crate::error::{ConfigError, Result, ValidationError};
    pub use crate::sources::{ConfigSource, VolumeInventory};

    #[cfg(feature = "validation")]
    pub use crate::core::Validate;
}
