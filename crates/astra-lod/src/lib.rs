//! Screen-coverage mesh LOD: level tables, selection, and crossfade transitions.
//!
//! Each frame the renderer supplies a projected screen coverage per visible
//! instance. The selector maps coverage to a detail level, the crossfade
//! state machine blends between levels over a configured duration, and the
//! renderer reads back a `(current, pending, blend weight)` triple per
//! instance to submit one or two draw calls.

mod crossfade;
mod error;
mod group;
mod instance;
mod level;
mod selector;

pub use crossfade::FadeState;
pub use error::ConfigError;
pub use group::{GroupManifest, GroupRegistry};
pub use instance::{
    FrameInput, InstanceArena, InstanceId, LodConfig, LodInstance, LodOutput, MeshRegistry,
    ResolveAll,
};
pub use level::{BoundingSphere, LevelTable, LodGroupDesc, LodLevel, LodLevelDesc, MeshUuid};
pub use selector::{effective_coverage, projected_coverage, select, select_with_hysteresis};
