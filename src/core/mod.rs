//! Record model, merging and strategy dispatch.

mod builder;
pub mod cron;
mod loader;
mod overlay;
pub mod record;
mod resolver;
mod scoped_env;

#[cfg(feature = "validation")]
mod validation;

pub use builder::ResolverBuilder;
pub use loader::ConfigLoader;
pub use overlay::{LabelOverride, Sparse, merge};
pub use record::{ConfigRecord, NotificationLevel, SCHEMA};
pub use resolver::{Ambient, Resolver, Strategy};
pub use scoped_env::ScopedEnv;

#[cfg(feature = "validation")]
pub use validation::Validate;
