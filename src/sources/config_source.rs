//! Configuration source trait.

use crate::core::ConfigRecord;
use crate::error::Result;

/// A strategy producing resolved configuration records.
///
/// Implement this trait to add a new way of discovering backup jobs. Every
/// record returned must be fully populated and carry a non-empty `source`.
pub trait ConfigSource: Send + Sync {
    /// Resolve all records this source knows about.
    ///
    /// Either every record is returned or none is: the first failure aborts
    /// the whole call.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or any value is invalid.
    fn load(&self) -> Result<Vec<ConfigRecord>>;

    /// Get a human-readable name for this source (for logging/debugging).
    fn name(&self) -> String;
}
