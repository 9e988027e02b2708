//! LOD configuration error types.

/// Errors raised while validating or parsing LOD group configuration.
///
/// A `ConfigError` is fatal for the group that produced it: the group is
/// rejected at load time and instances referencing it fall back to a
/// single-level table instead of crashing the frame pass.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The group descriptor has an empty `baseName`.
    #[error("LOD group has an empty baseName")]
    EmptyBaseName,

    /// The group has no levels at all.
    #[error("LOD group '{group}' has no levels")]
    EmptyLevels { group: String },

    /// A level references no mesh.
    #[error("LOD group '{group}' level {index} has an empty meshUuid")]
    EmptyMeshUuid { group: String, index: usize },

    /// A level's screen-percentage threshold is outside `(0, 1]`.
    #[error("LOD group '{group}' level {index}: screenPercentage {value} is outside (0, 1]")]
    ThresholdOutOfRange {
        group: String,
        index: usize,
        value: f32,
    },

    /// Thresholds must be strictly decreasing from level 0 (highest detail)
    /// to the last level (coarsest).
    #[error(
        "LOD group '{group}' level {index}: screenPercentage {value} must be \
         strictly below the previous level's {previous}"
    )]
    ThresholdNotDecreasing {
        group: String,
        index: usize,
        value: f32,
        previous: f32,
    },

    /// The pipeline manifest could not be parsed at all.
    #[error("failed to parse LOD group manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}
