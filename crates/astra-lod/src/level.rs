//! LOD level tables: the immutable, validated sequence of detail tiers for one asset.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Opaque mesh identifier assigned by the asset pipeline.
///
/// The LOD core never dereferences it; resolution is the asset registry's job.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeshUuid(String);

impl MeshUuid {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for MeshUuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bounding sphere used to normalize projected screen coverage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

/// One discrete detail tier of a LOD group. Read-only after table construction.
#[derive(Clone, Debug)]
pub struct LodLevel {
    /// Mesh rendered at this tier.
    pub mesh: MeshUuid,
    /// Coverage threshold in `(0, 1]`: this tier wins once effective
    /// coverage reaches it. Level 0 carries the largest threshold.
    pub screen_percentage: f32,
    /// Triangle count of the simplified mesh. Informational only.
    pub triangle_count: u32,
    /// Vertex count of the simplified mesh. Informational only.
    pub vertex_count: u32,
    /// Bounds of the mesh at this tier.
    pub bounds: BoundingSphere,
}

/// Serde-facing form of one level, matching the asset-pipeline JSON schema.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LodLevelDesc {
    pub mesh_uuid: MeshUuid,
    pub screen_percentage: f32,
    #[serde(default)]
    pub triangle_count: u32,
    #[serde(default)]
    pub vertex_count: u32,
    #[serde(default)]
    pub bounds_center: [f32; 3],
    #[serde(default = "default_bounds_radius")]
    pub bounds_radius: f32,
}

fn default_bounds_radius() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_crossfade_duration() -> f32 {
    0.1
}

/// Serde-facing form of a whole LOD group as exported by the asset pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LodGroupDesc {
    pub base_name: String,
    #[serde(rename = "enableLOD", default = "default_true")]
    pub enable_lod: bool,
    #[serde(default)]
    pub lod_bias: f32,
    #[serde(default = "default_true")]
    pub enable_crossfade: bool,
    #[serde(default = "default_crossfade_duration")]
    pub crossfade_duration: f32,
    /// Ordered from highest detail (level 0) to coarsest.
    pub levels: Vec<LodLevelDesc>,
}

/// Validated, immutable view of a group's levels, sorted by descending detail.
///
/// Construction rejects malformed descriptors instead of normalizing them;
/// a rejected group falls back to [`LevelTable::single`].
#[derive(Clone, Debug)]
pub struct LevelTable {
    base_name: String,
    levels: Vec<LodLevel>,
}

impl LevelTable {
    /// Validate a pipeline descriptor into a usable table.
    pub fn new(desc: &LodGroupDesc) -> Result<Self, ConfigError> {
        if desc.base_name.is_empty() {
            return Err(ConfigError::EmptyBaseName);
        }
        if desc.levels.is_empty() {
            return Err(ConfigError::EmptyLevels {
                group: desc.base_name.clone(),
            });
        }

        let mut levels = Vec::with_capacity(desc.levels.len());
        let mut previous: Option<f32> = None;
        for (index, level) in desc.levels.iter().enumerate() {
            if level.mesh_uuid.is_empty() {
                return Err(ConfigError::EmptyMeshUuid {
                    group: desc.base_name.clone(),
                    index,
                });
            }
            // The negated form also rejects NaN thresholds.
            if !(level.screen_percentage > 0.0 && level.screen_percentage <= 1.0) {
                return Err(ConfigError::ThresholdOutOfRange {
                    group: desc.base_name.clone(),
                    index,
                    value: level.screen_percentage,
                });
            }
            if let Some(prev) = previous
                && level.screen_percentage >= prev
            {
                return Err(ConfigError::ThresholdNotDecreasing {
                    group: desc.base_name.clone(),
                    index,
                    value: level.screen_percentage,
                    previous: prev,
                });
            }
            previous = Some(level.screen_percentage);

            levels.push(LodLevel {
                mesh: level.mesh_uuid.clone(),
                screen_percentage: level.screen_percentage,
                triangle_count: level.triangle_count,
                vertex_count: level.vertex_count,
                bounds: BoundingSphere {
                    center: Vec3::from_array(level.bounds_center),
                    radius: level.bounds_radius,
                },
            });
        }

        Ok(Self {
            base_name: desc.base_name.clone(),
            levels,
        })
    }

    /// Degenerate single-level table for assets whose group was rejected
    /// or that never had LOD data: selection always returns the base mesh.
    pub fn single(base_name: impl Into<String>, mesh: MeshUuid, bounds: BoundingSphere) -> Self {
        Self {
            base_name: base_name.into(),
            levels: vec![LodLevel {
                mesh,
                screen_percentage: 1.0,
                triangle_count: 0,
                vertex_count: 0,
                bounds,
            }],
        }
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Levels in descending-detail order. Never empty.
    pub fn levels(&self) -> &[LodLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always `false`: construction guarantees at least one level.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Index of the coarsest level.
    pub fn coarsest(&self) -> usize {
        self.levels.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(thresholds: &[f32]) -> LodGroupDesc {
        LodGroupDesc {
            base_name: "rock".to_string(),
            enable_lod: true,
            lod_bias: 0.0,
            enable_crossfade: true,
            crossfade_duration: 0.1,
            levels: thresholds
                .iter()
                .enumerate()
                .map(|(i, &t)| LodLevelDesc {
                    mesh_uuid: MeshUuid::new(format!("mesh-{i}")),
                    screen_percentage: t,
                    triangle_count: 1000 >> i,
                    vertex_count: 600 >> i,
                    bounds_center: [0.0; 3],
                    bounds_radius: 1.0,
                })
                .collect(),
        }
    }

    /// A well-formed descriptor validates and keeps its level order.
    #[test]
    fn test_valid_table_construction() {
        let table = LevelTable::new(&desc(&[1.0, 0.5, 0.25])).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.coarsest(), 2);
        assert_eq!(table.levels()[1].screen_percentage, 0.5);
        assert_eq!(table.levels()[2].mesh.as_str(), "mesh-2");
    }

    /// An empty level list is a configuration error, not a silent default.
    #[test]
    fn test_empty_levels_rejected() {
        let err = LevelTable::new(&desc(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyLevels { .. }));
    }

    /// Thresholds that fail to strictly decrease are rejected.
    #[test]
    fn test_non_decreasing_thresholds_rejected() {
        let err = LevelTable::new(&desc(&[1.0, 0.5, 0.5])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ThresholdNotDecreasing { index: 2, .. }
        ));
    }

    /// Thresholds outside (0, 1] are rejected, including NaN.
    #[test]
    fn test_threshold_range_enforced() {
        assert!(matches!(
            LevelTable::new(&desc(&[1.0, 0.0])).unwrap_err(),
            ConfigError::ThresholdOutOfRange { index: 1, .. }
        ));
        assert!(matches!(
            LevelTable::new(&desc(&[1.2])).unwrap_err(),
            ConfigError::ThresholdOutOfRange { index: 0, .. }
        ));
        assert!(matches!(
            LevelTable::new(&desc(&[f32::NAN])).unwrap_err(),
            ConfigError::ThresholdOutOfRange { index: 0, .. }
        ));
    }

    /// A level without a mesh reference is rejected.
    #[test]
    fn test_empty_mesh_uuid_rejected() {
        let mut d = desc(&[1.0, 0.5]);
        d.levels[1].mesh_uuid = MeshUuid::new("");
        assert!(matches!(
            LevelTable::new(&d).unwrap_err(),
            ConfigError::EmptyMeshUuid { index: 1, .. }
        ));
    }

    /// An empty baseName is rejected.
    #[test]
    fn test_empty_base_name_rejected() {
        let mut d = desc(&[1.0]);
        d.base_name = String::new();
        assert!(matches!(
            LevelTable::new(&d).unwrap_err(),
            ConfigError::EmptyBaseName
        ));
    }

    /// The fallback table has exactly one level that always wins.
    #[test]
    fn test_single_level_fallback() {
        let table = LevelTable::single(
            "rock",
            MeshUuid::new("base-mesh"),
            BoundingSphere {
                center: Vec3::ZERO,
                radius: 1.0,
            },
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.coarsest(), 0);
        assert_eq!(table.levels()[0].mesh.as_str(), "base-mesh");
    }

    /// Group descriptors parse from the pipeline's JSON field names.
    #[test]
    fn test_desc_parses_pipeline_json() {
        let json = r#"{
            "baseName": "rock",
            "enableLOD": true,
            "lodBias": 0.25,
            "enableCrossfade": true,
            "crossfadeDuration": 0.2,
            "levels": [
                {
                    "meshUuid": "3f2a-00",
                    "screenPercentage": 1.0,
                    "triangleCount": 5000,
                    "vertexCount": 2600,
                    "boundsCenter": [0.0, 1.0, 0.0],
                    "boundsRadius": 2.5
                },
                { "meshUuid": "3f2a-01", "screenPercentage": 0.5 }
            ]
        }"#;
        let desc: LodGroupDesc = serde_json::from_str(json).unwrap();
        assert_eq!(desc.base_name, "rock");
        assert_eq!(desc.lod_bias, 0.25);
        assert_eq!(desc.crossfade_duration, 0.2);
        assert_eq!(desc.levels.len(), 2);
        assert_eq!(desc.levels[0].triangle_count, 5000);
        assert_eq!(desc.levels[0].bounds_radius, 2.5);
        // Omitted optional fields fall back to defaults.
        assert_eq!(desc.levels[1].bounds_radius, 1.0);

        let table = LevelTable::new(&desc).unwrap();
        assert_eq!(table.levels()[0].bounds.center, Vec3::new(0.0, 1.0, 0.0));
    }
}
