//! Loading the asset-pipeline LOD manifest into validated group tables.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::level::{LevelTable, LodGroupDesc};

fn default_true() -> bool {
    true
}

/// Top-level document produced by the asset pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupManifest {
    #[serde(rename = "lodGroups")]
    pub lod_groups: Vec<LodGroupDesc>,
    /// Global LOD switch for everything in this manifest.
    #[serde(rename = "enableLOD", default = "default_true")]
    pub enable_lod: bool,
    /// Manifest-wide bias added to each group's own bias.
    #[serde(rename = "lodBias", default)]
    pub lod_bias: f32,
}

/// Validated LOD groups, keyed by base asset name.
///
/// Malformed groups are rejected with a logged [`ConfigError`] and recorded;
/// the rest of the manifest loads normally. Tables are shared behind `Arc`
/// since every instance of an asset reads the same immutable levels.
#[derive(Debug)]
pub struct GroupRegistry {
    groups: FxHashMap<String, Arc<LevelTable>>,
    rejected: FxHashMap<String, ConfigError>,
    descs: FxHashMap<String, LodGroupDesc>,
    enable_lod: bool,
    lod_bias: f32,
}

impl GroupRegistry {
    /// Parse and validate a pipeline manifest from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let manifest: GroupManifest = serde_json::from_str(json)?;
        Ok(Self::from_manifest(manifest))
    }

    /// Validate an already-parsed manifest.
    pub fn from_manifest(manifest: GroupManifest) -> Self {
        let mut groups = FxHashMap::default();
        let mut rejected = FxHashMap::default();
        let mut descs = FxHashMap::default();

        for desc in manifest.lod_groups {
            match LevelTable::new(&desc) {
                Ok(table) => {
                    descs.insert(desc.base_name.clone(), desc);
                    groups.insert(table.base_name().to_string(), Arc::new(table));
                }
                Err(err) => {
                    let name = if desc.base_name.is_empty() {
                        "<unnamed>".to_string()
                    } else {
                        desc.base_name.clone()
                    };
                    warn!(group = %name, error = %err, "rejecting LOD group");
                    rejected.insert(name, err);
                }
            }
        }

        info!(
            loaded = groups.len(),
            rejected = rejected.len(),
            "LOD group manifest processed"
        );

        Self {
            groups,
            rejected,
            descs,
            enable_lod: manifest.enable_lod,
            lod_bias: manifest.lod_bias,
        }
    }

    /// Look up a validated table by base asset name.
    pub fn get(&self, base_name: &str) -> Option<Arc<LevelTable>> {
        self.groups.get(base_name).cloned()
    }

    /// The original descriptor for a loaded group (behavior knobs included).
    pub fn desc(&self, base_name: &str) -> Option<&LodGroupDesc> {
        self.descs.get(base_name)
    }

    /// Why a group was rejected, if it was.
    pub fn rejection(&self, base_name: &str) -> Option<&ConfigError> {
        self.rejected.get(base_name)
    }

    /// Iterate over all loaded tables.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<LevelTable>)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn enable_lod(&self) -> bool {
        self.enable_lod
    }

    pub fn lod_bias(&self) -> f32 {
        self.lod_bias
    }
}
