//! Volume inventory: the external collaborator behind the `labels` strategy.

use crate::error::Result;
use std::collections::{BTreeMap, HashMap};

/// A storage volume and its metadata labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Volume {
    /// Volume name, used as the provenance of records derived from it.
    pub name: String,
    /// All labels attached to the volume, namespaced or not.
    pub labels: HashMap<String, String>,
}

impl Volume {
    /// Create a volume with the given labels.
    pub fn new<I, K, V>(name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Lists the volumes managed by the container daemon.
///
/// How the daemon connection is established is up to the implementation.
/// Resolution performs exactly one call per resolve and does not retry.
pub trait VolumeInventory: Send + Sync {
    /// Return every managed volume.
    ///
    /// # Errors
    ///
    /// Returns an error if the inventory cannot be queried.
    fn list_volumes(&self) -> Result<Vec<Volume>>;
}

impl<F> VolumeInventory for F
where
    F: Fn() -> Result<Vec<Volume>> + Send + Sync,
{
    fn list_volumes(&self) -> Result<Vec<Volume>> {
        self()
    }
}

/// A fixed, in-memory inventory.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    volumes: Vec<Volume>,
}

impl StaticInventory {
    /// Create an inventory holding `volumes`.
    pub fn new(volumes: Vec<Volume>) -> Self {
        Self { volumes }
    }

    /// Add a volume.
    pub fn with_volume(mut self, volume: Volume) -> Self {
        self.volumes.push(volume);
        self
    }
}

impl VolumeInventory for StaticInventory {
    fn list_volumes(&self) -> Result<Vec<Volume>> {
        Ok(self.volumes.clone())
    }
}

/// Map volume names to their labels that carry `prefix`, with the prefix
/// stripped. Volumes without any such label are left out.
///
/// # Errors
///
/// Returns an error if the inventory query fails.
pub fn scan_volume_labels(
    inventory: &dyn VolumeInventory,
    prefix: &str,
) -> Result<BTreeMap<String, HashMap<String, String>>> {
    let volumes = inventory
        .list_volumes()
        .map_err(|e| e.context("error scanning volume labels"))?;

    let mut result = BTreeMap::new();
    for volume in volumes {
        let labels: HashMap<String, String> = volume
            .labels
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .map(|stripped| (stripped.to_string(), value))
            })
            .collect();
        if labels.is_empty() {
            continue;
        }
        result.insert(volume.name, labels);
    }
    Ok(result)
}
