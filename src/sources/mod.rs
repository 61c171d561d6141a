//! Configuration source implementations.

mod config_source;
mod env;
mod env_dir;
mod inventory;
mod labels;
mod lookup;
pub mod secret;
pub mod shell;

pub use config_source::ConfigSource;
pub use env::{ENV_SOURCE_NAME, EnvSource};
pub use env_dir::{DEFAULT_ENV_DIR, EnvDirSource, source_env_file};
pub use inventory::{StaticInventory, Volume, VolumeInventory, scan_volume_labels};
pub use labels::{
    DEFAULT_LABEL_PREFIX, LABEL_PREFIX_ENV, LabelSource, parse_advanced_labels, parse_basic_labels,
};
pub use lookup::{FnLookup, Layered, Lookup, ProcessEnv};
pub use secret::SecretLookup;
