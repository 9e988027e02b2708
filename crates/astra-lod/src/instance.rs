//! Per-instance LOD state and the per-frame evaluation pass.
//!
//! Instance state lives in a dense slot arena so the pass iterates flat
//! memory. Each slot is independently owned: the pass has no cross-instance
//! dependency and may be split across workers, with only a barrier before
//! the overlay snapshot. This implementation walks it on one thread.

use std::sync::Arc;

use tracing::warn;

use crate::crossfade::FadeState;
use crate::level::{LevelTable, LodGroupDesc, MeshUuid};
use crate::selector;

/// Per-instance-type LOD behavior knobs.
#[derive(Clone, Debug, PartialEq)]
pub struct LodConfig {
    pub enable_lod: bool,
    /// 0 is neutral; positive favors higher detail.
    pub lod_bias: f32,
    pub enable_crossfade: bool,
    /// Seconds; 0 disables fading even when `enable_crossfade` is set.
    pub crossfade_duration: f32,
    /// Hysteresis dead-band around thresholds. 0 disables it.
    pub hysteresis: f32,
    /// Debug override: pin selection to this level, bypassing the selector.
    /// Clamped to the table; crossfade still applies on the way there.
    pub force_level: Option<usize>,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            enable_lod: true,
            lod_bias: 0.0,
            enable_crossfade: true,
            crossfade_duration: 0.1,
            hysteresis: 0.0,
            force_level: None,
        }
    }
}

impl LodConfig {
    /// Behavior knobs as exported by the asset pipeline for one group.
    pub fn from_group(desc: &LodGroupDesc) -> Self {
        Self {
            enable_lod: desc.enable_lod,
            lod_bias: desc.lod_bias,
            enable_crossfade: desc.enable_crossfade,
            crossfade_duration: desc.crossfade_duration.max(0.0),
            hysteresis: 0.0,
            force_level: None,
        }
    }
}

/// Identifies a registered instance. Stable for the instance's lifetime;
/// slots are reused after unregistration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceId(u32);

impl InstanceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Asset-registry seam: answers whether a mesh id currently resolves.
/// Residency and streaming are the registry's concern, not the LOD core's.
pub trait MeshRegistry {
    fn contains(&self, mesh: &MeshUuid) -> bool;
}

/// Registry that resolves everything. Useful for tests and tools that do
/// not track residency.
pub struct ResolveAll;

impl MeshRegistry for ResolveAll {
    fn contains(&self, _mesh: &MeshUuid) -> bool {
        true
    }
}

/// What the renderer needs to draw one instance this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LodOutput {
    /// Level rendered at the dominant weight.
    pub current: usize,
    /// Level being faded in, if a crossfade is in flight.
    pub pending: Option<usize>,
    /// Opacity of `pending`: 0 = fully current, 1 = fully pending.
    pub blend_weight: f32,
    /// Mesh for `current`. `None` is the unresolved-mesh sentinel: the
    /// renderer keeps the last known good mesh for this instance.
    pub mesh: Option<MeshUuid>,
}

/// Mutable LOD state for one visible instance. Exclusively owned by its
/// arena slot; no sharing across instances.
#[derive(Clone, Debug)]
pub struct LodInstance {
    table: Arc<LevelTable>,
    config: LodConfig,
    fade: FadeState,
    last_coverage: f32,
    last_good_mesh: Option<MeshUuid>,
    output: LodOutput,
}

impl LodInstance {
    fn new(table: Arc<LevelTable>, config: LodConfig) -> Self {
        let mesh = table.levels()[0].mesh.clone();
        Self {
            table,
            config,
            fade: FadeState::stable(0),
            last_coverage: 0.0,
            last_good_mesh: None,
            output: LodOutput {
                current: 0,
                pending: None,
                blend_weight: 0.0,
                mesh: Some(mesh),
            },
        }
    }

    pub fn table(&self) -> &Arc<LevelTable> {
        &self.table
    }

    pub fn config(&self) -> &LodConfig {
        &self.config
    }

    pub fn fade(&self) -> &FadeState {
        &self.fade
    }

    /// Coverage from the most recent evaluation, post-clamp.
    pub fn last_coverage(&self) -> f32 {
        self.last_coverage
    }

    /// Mesh from the most recent frame whose level resolved.
    pub fn last_good_mesh(&self) -> Option<&MeshUuid> {
        self.last_good_mesh.as_ref()
    }

    /// Result of the most recent evaluation.
    pub fn output(&self) -> &LodOutput {
        &self.output
    }

    /// Evaluate one frame: select, retarget, advance the fade, resolve.
    ///
    /// Bad coverage is recovered locally (non-finite values reuse the last
    /// evaluated coverage) so a single bad frame never halts the pass.
    fn evaluate(&mut self, coverage: f32, dt: f32, registry: &dyn MeshRegistry) {
        let coverage = if coverage.is_finite() {
            coverage.clamp(0.0, 1.0)
        } else {
            warn!(
                group = self.table.base_name(),
                "non-finite coverage, reusing last value"
            );
            self.last_coverage
        };
        self.last_coverage = coverage;

        if self.config.enable_lod && self.table.len() > 1 {
            let desired = match self.config.force_level {
                Some(level) => level.min(self.table.coarsest()),
                None => selector::select_with_hysteresis(
                    self.table.levels(),
                    coverage,
                    self.config.lod_bias,
                    self.fade.target_level(),
                    self.config.hysteresis,
                ),
            };
            self.fade.retarget(
                desired,
                self.config.enable_crossfade,
                self.config.crossfade_duration,
            );
        }
        self.fade.advance(dt);

        let current = self.fade.current_level();
        let uuid = &self.table.levels()[current].mesh;
        let mesh = if registry.contains(uuid) {
            self.last_good_mesh = Some(uuid.clone());
            Some(uuid.clone())
        } else {
            warn!(
                group = self.table.base_name(),
                level = current,
                mesh = %uuid,
                "mesh unresolved, renderer keeps last known good level"
            );
            None
        };

        self.output = LodOutput {
            current,
            pending: self.fade.pending_level(),
            blend_weight: self.fade.blend_weight(),
            mesh,
        };
    }
}

/// Per-frame renderer input for one instance.
#[derive(Clone, Copy, Debug)]
pub struct FrameInput {
    pub id: InstanceId,
    /// Projected screen coverage, pre-clamp.
    pub coverage: f32,
}

/// Dense, index-addressable storage for instance LOD state.
#[derive(Default)]
pub struct InstanceArena {
    slots: Vec<Option<LodInstance>>,
    free: Vec<u32>,
}

impl InstanceArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly visible instance. Reuses a free slot when available.
    pub fn register(&mut self, table: Arc<LevelTable>, config: LodConfig) -> InstanceId {
        let instance = LodInstance::new(table, config);
        if let Some(slot) = self.free.pop() {
            self.slots[slot as usize] = Some(instance);
            InstanceId(slot)
        } else {
            self.slots.push(Some(instance));
            InstanceId((self.slots.len() - 1) as u32)
        }
    }

    /// Stop tracking an instance. Returns `false` if it was not registered.
    pub fn unregister(&mut self, id: InstanceId) -> bool {
        match self.slots.get_mut(id.index()) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                self.free.push(id.0);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: InstanceId) -> Option<&LodInstance> {
        self.slots.get(id.index()).and_then(|s| s.as_ref())
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live instances in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &LodInstance)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|inst| (InstanceId(i as u32), inst)))
    }

    /// Run the per-frame pass over the supplied inputs.
    ///
    /// Instances without an input this frame are left untouched (treated as
    /// not visible). Inputs for unregistered ids are logged and skipped; no
    /// instance's failure aborts the batch.
    pub fn run_pass(&mut self, inputs: &[FrameInput], dt: f32, registry: &dyn MeshRegistry) {
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            warn!(dt, "bad frame delta, clamping to 0");
            0.0
        };

        for input in inputs {
            match self.slots.get_mut(input.id.index()) {
                Some(Some(instance)) => instance.evaluate(input.coverage, dt, registry),
                _ => warn!(id = %input.id, "frame input for unregistered instance"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{BoundingSphere, LodGroupDesc, LodLevelDesc};
    use glam::Vec3;

    fn table(thresholds: &[f32]) -> Arc<LevelTable> {
        let desc = LodGroupDesc {
            base_name: "rock".to_string(),
            enable_lod: true,
            lod_bias: 0.0,
            enable_crossfade: true,
            crossfade_duration: 0.2,
            levels: thresholds
                .iter()
                .enumerate()
                .map(|(i, &t)| LodLevelDesc {
                    mesh_uuid: MeshUuid::new(format!("rock-{i}")),
                    screen_percentage: t,
                    triangle_count: 0,
                    vertex_count: 0,
                    bounds_center: [0.0; 3],
                    bounds_radius: 1.0,
                })
                .collect(),
        };
        Arc::new(LevelTable::new(&desc).unwrap())
    }

    fn config() -> LodConfig {
        LodConfig {
            crossfade_duration: 0.2,
            ..Default::default()
        }
    }

    struct DenyList(Vec<String>);

    impl MeshRegistry for DenyList {
        fn contains(&self, mesh: &MeshUuid) -> bool {
            !self.0.iter().any(|m| m == mesh.as_str())
        }
    }

    /// Slots are reused after unregistration and live ids stay valid.
    #[test]
    fn test_arena_slot_reuse() {
        let mut arena = InstanceArena::new();
        let t = table(&[1.0, 0.5]);
        let a = arena.register(t.clone(), config());
        let b = arena.register(t.clone(), config());
        let c = arena.register(t.clone(), config());
        assert_eq!(arena.len(), 3);

        assert!(arena.unregister(b));
        assert!(!arena.unregister(b));
        assert_eq!(arena.len(), 2);
        assert!(arena.get(b).is_none());
        assert!(arena.get(a).is_some());

        let d = arena.register(t, config());
        assert_eq!(d.index(), b.index(), "freed slot should be reused");
        assert_eq!(arena.len(), 3);
        assert!(arena.get(c).is_some());
    }

    /// The pass drives selection and fading through to the output triple.
    #[test]
    fn test_pass_produces_output_triple() {
        let mut arena = InstanceArena::new();
        let id = arena.register(table(&[1.0, 0.5, 0.25]), config());

        // Frame 1 at mid coverage: fade from level 0 toward level 1 begins.
        arena.run_pass(&[FrameInput { id, coverage: 0.6 }], 0.05, &ResolveAll);
        let out = arena.get(id).unwrap().output();
        assert_eq!(out.current, 0);
        assert_eq!(out.pending, Some(1));
        assert!((out.blend_weight - 0.25).abs() < 1e-5);
        assert_eq!(out.mesh.as_ref().unwrap().as_str(), "rock-0");

        // Three more frames complete the fade.
        for _ in 0..3 {
            arena.run_pass(&[FrameInput { id, coverage: 0.6 }], 0.05, &ResolveAll);
        }
        let out = arena.get(id).unwrap().output();
        assert_eq!(out.current, 1);
        assert_eq!(out.pending, None);
        assert_eq!(out.blend_weight, 0.0);
        assert_eq!(out.mesh.as_ref().unwrap().as_str(), "rock-1");
    }

    /// With crossfade disabled the level updates the same frame, and no
    /// fading state is ever observed.
    #[test]
    fn test_instant_switch_without_crossfade() {
        let mut arena = InstanceArena::new();
        let id = arena.register(
            table(&[1.0, 0.5, 0.25]),
            LodConfig {
                enable_crossfade: false,
                ..config()
            },
        );

        arena.run_pass(&[FrameInput { id, coverage: 1.0 }], 0.016, &ResolveAll);
        assert_eq!(arena.get(id).unwrap().output().current, 0);
        assert!(!arena.get(id).unwrap().fade().is_fading());

        arena.run_pass(&[FrameInput { id, coverage: 0.6 }], 0.016, &ResolveAll);
        let out = arena.get(id).unwrap().output();
        assert_eq!(out.current, 1);
        assert_eq!(out.pending, None);
        assert!(!arena.get(id).unwrap().fade().is_fading());
    }

    /// A single-level fallback table always yields the base mesh.
    #[test]
    fn test_no_lod_fallback_always_base_mesh() {
        let mut arena = InstanceArena::new();
        let single = Arc::new(LevelTable::single(
            "crate",
            MeshUuid::new("crate-base"),
            BoundingSphere {
                center: Vec3::ZERO,
                radius: 1.0,
            },
        ));
        let id = arena.register(single, config());

        for &coverage in &[1.0, 0.4, 0.01] {
            arena.run_pass(&[FrameInput { id, coverage }], 0.016, &ResolveAll);
            let out = arena.get(id).unwrap().output();
            assert_eq!(out.current, 0);
            assert_eq!(out.pending, None);
            assert_eq!(out.mesh.as_ref().unwrap().as_str(), "crate-base");
        }
    }

    /// Non-finite coverage reuses the last evaluated value and the pass
    /// keeps going for every other instance.
    #[test]
    fn test_nan_coverage_recovered_locally() {
        let mut arena = InstanceArena::new();
        let t = table(&[1.0, 0.5, 0.25]);
        let good = arena.register(t.clone(), config());
        let bad = arena.register(t, config());

        arena.run_pass(
            &[
                FrameInput {
                    id: good,
                    coverage: 0.6,
                },
                FrameInput {
                    id: bad,
                    coverage: 0.6,
                },
            ],
            0.3,
            &ResolveAll,
        );
        assert_eq!(arena.get(bad).unwrap().output().current, 1);

        arena.run_pass(
            &[
                FrameInput {
                    id: good,
                    coverage: 0.6,
                },
                FrameInput {
                    id: bad,
                    coverage: f32::NAN,
                },
            ],
            0.3,
            &ResolveAll,
        );
        // The bad instance holds its level and clamped coverage.
        assert_eq!(arena.get(bad).unwrap().output().current, 1);
        assert_eq!(arena.get(bad).unwrap().last_coverage(), 0.6);
        assert_eq!(arena.get(good).unwrap().output().current, 1);
    }

    /// An unresolved mesh yields the sentinel for that instance only.
    #[test]
    fn test_unresolved_mesh_isolated() {
        let mut arena = InstanceArena::new();
        let t = table(&[1.0, 0.5]);
        let a = arena.register(t.clone(), config());
        let b = arena.register(t, config());
        let registry = DenyList(vec!["rock-1".to_string()]);

        let inputs = [
            FrameInput {
                id: a,
                coverage: 1.0,
            },
            FrameInput {
                id: b,
                coverage: 0.6,
            },
        ];
        arena.run_pass(&inputs, 0.3, &registry);
        arena.run_pass(&inputs, 0.3, &registry);

        // `b` settled on level 1 whose mesh does not resolve.
        let out_b = arena.get(b).unwrap().output();
        assert_eq!(out_b.current, 1);
        assert_eq!(out_b.mesh, None);
        assert_eq!(arena.get(b).unwrap().last_good_mesh().unwrap().as_str(), "rock-0");

        // `a` is unaffected.
        let out_a = arena.get(a).unwrap().output();
        assert_eq!(out_a.mesh.as_ref().unwrap().as_str(), "rock-0");
    }

    /// Inputs for unregistered ids are skipped without aborting the pass.
    #[test]
    fn test_unregistered_input_skipped() {
        let mut arena = InstanceArena::new();
        let id = arena.register(table(&[1.0, 0.5]), config());
        arena.unregister(id);

        arena.run_pass(&[FrameInput { id, coverage: 0.5 }], 0.016, &ResolveAll);
        assert_eq!(arena.len(), 0);
    }

    /// A forced level pins selection regardless of coverage, with the
    /// crossfade still easing the switch.
    #[test]
    fn test_forced_level_overrides_selection() {
        let mut arena = InstanceArena::new();
        let id = arena.register(
            table(&[1.0, 0.5, 0.25]),
            LodConfig {
                force_level: Some(2),
                ..config()
            },
        );

        // First frame starts the fade toward the forced level.
        arena.run_pass(&[FrameInput { id, coverage: 1.0 }], 0.05, &ResolveAll);
        let out = arena.get(id).unwrap().output();
        assert_eq!(out.current, 0);
        assert_eq!(out.pending, Some(2));

        // The forced level holds against any coverage once settled.
        for &coverage in &[1.0, 0.6, 0.01] {
            arena.run_pass(&[FrameInput { id, coverage }], 0.3, &ResolveAll);
            assert_eq!(arena.get(id).unwrap().output().current, 2);
        }
    }

    /// An out-of-range forced level clamps to the coarsest level.
    #[test]
    fn test_forced_level_clamped_to_table() {
        let mut arena = InstanceArena::new();
        let id = arena.register(
            table(&[1.0, 0.5]),
            LodConfig {
                force_level: Some(9),
                enable_crossfade: false,
                ..config()
            },
        );
        arena.run_pass(&[FrameInput { id, coverage: 1.0 }], 0.016, &ResolveAll);
        assert_eq!(arena.get(id).unwrap().output().current, 1);
    }

    /// Disabling LOD freezes selection at the current level.
    #[test]
    fn test_disabled_lod_holds_level() {
        let mut arena = InstanceArena::new();
        let id = arena.register(
            table(&[1.0, 0.5, 0.25]),
            LodConfig {
                enable_lod: false,
                ..config()
            },
        );

        for &coverage in &[1.0, 0.1, 0.6] {
            arena.run_pass(&[FrameInput { id, coverage }], 0.1, &ResolveAll);
            assert_eq!(arena.get(id).unwrap().output().current, 0);
        }
    }
}
