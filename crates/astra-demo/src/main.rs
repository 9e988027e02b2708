//! Headless LOD demo: a synthetic camera sweep over a field of instances.
//!
//! Loads a LOD group manifest (a bundled sample by default), registers a few
//! instances per group, and flies the camera toward and away from the field
//! while running the per-frame LOD pass. Selector decisions and crossfades
//! show up in the log and in the overlay panel printed at the end.
//!
//! Run with `cargo run -p astra-demo -- --frames 600 --overlay` and, in
//! debug builds, poll `http://127.0.0.1:9999/lod` while it runs.

use std::sync::{Arc, Mutex};

use clap::Parser;
use glam::Vec3;
use rustc_hash::FxHashSet;
use tracing::{debug, info};

use astra_config::{CliArgs, Config, LodQualityConfig};
use astra_debug::{OverlaySnapshot, OverlayStyle, format_panel};
use astra_lod::{
    FrameInput, GroupRegistry, InstanceArena, InstanceId, LodConfig, MeshRegistry, MeshUuid,
    projected_coverage,
};

/// Bundled manifest in the asset pipeline's export shape.
const SAMPLE_MANIFEST: &str = include_str!("sample_groups.json");

const FRAME_DT: f32 = 1.0 / 60.0;
const FOV_Y: f32 = std::f32::consts::FRAC_PI_3;
const ASPECT: f32 = 16.0 / 9.0;

/// Resolves every mesh named by the loaded manifest; anything else is
/// treated as not resident.
struct DemoMeshRegistry {
    resident: FxHashSet<String>,
}

impl MeshRegistry for DemoMeshRegistry {
    fn contains(&self, mesh: &MeshUuid) -> bool {
        self.resident.contains(mesh.as_str())
    }
}

/// Combine a group's pipeline knobs with the runtime quality settings.
fn merged_config(group: LodConfig, quality: &LodQualityConfig, manifest_bias: f32) -> LodConfig {
    LodConfig {
        enable_lod: group.enable_lod && quality.enable_lod,
        lod_bias: group.lod_bias + quality.lod_bias + manifest_bias,
        enable_crossfade: group.enable_crossfade && quality.enable_crossfade,
        crossfade_duration: if quality.crossfade_duration >= 0.0 {
            quality.crossfade_duration
        } else {
            group.crossfade_duration
        },
        hysteresis: quality.hysteresis,
        force_level: quality.force_level,
    }
}

struct DemoInstance {
    id: InstanceId,
    position: Vec3,
}

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().or_else(Config::default_dir);
    let mut config = match &config_dir {
        Some(dir) => Config::load_or_create(dir).unwrap_or_default(),
        None => Config::default(),
    };
    config.apply_cli_overrides(&args);

    astra_log::init_logging(None, cfg!(debug_assertions), Some(&config));

    let manifest_json = match &args.lod_groups {
        Some(path) => std::fs::read_to_string(path).expect("failed to read LOD group manifest"),
        None => SAMPLE_MANIFEST.to_string(),
    };
    let registry = GroupRegistry::from_json(&manifest_json).expect("malformed LOD group manifest");
    info!(groups = registry.len(), "LOD groups loaded");

    let mesh_registry = DemoMeshRegistry {
        resident: registry
            .iter()
            .flat_map(|(_, table)| table.levels().iter())
            .map(|level| level.mesh.as_str().to_string())
            .collect(),
    };

    // A small field of instances, several per group at staggered depths.
    let mut arena = InstanceArena::new();
    let mut instances = Vec::new();
    for (row, (name, table)) in registry.iter().enumerate() {
        let group_config = LodConfig::from_group(registry.desc(name).expect("desc for loaded group"));
        for col in 0..4 {
            let id = arena.register(
                table.clone(),
                merged_config(group_config.clone(), &config.lod, registry.lod_bias()),
            );
            instances.push(DemoInstance {
                id,
                position: Vec3::new(col as f32 * 6.0 - 9.0, 0.0, row as f32 * 10.0 + 10.0),
            });
        }
    }
    info!(instances = arena.len(), "instance field registered");

    let shared_snapshot = Arc::new(Mutex::new(OverlaySnapshot::default()));

    #[cfg(debug_assertions)]
    let mut debug_server = {
        let mut server = astra_debug::DebugServer::new(config.debug.debug_port);
        match server.start(shared_snapshot.clone()) {
            Ok(()) => info!(port = server.actual_port(), "debug endpoint up"),
            Err(e) => tracing::warn!(error = %e, "debug endpoint unavailable"),
        }
        server
    };

    let total_frames = args.frames.unwrap_or(600);
    let style = OverlayStyle {
        position: config.debug.overlay_position,
        color: config.debug.overlay_color,
    };

    let mut snapshot = OverlaySnapshot::default();
    for frame in 0..total_frames {
        // Camera swings from far out to close up and back.
        let phase = (frame as f32 / total_frames as f32) * std::f32::consts::TAU;
        let camera = Vec3::new(0.0, 2.0, -60.0 + 55.0 * (0.5 - 0.5 * phase.cos()) * 2.0);

        let inputs: Vec<FrameInput> = instances
            .iter()
            .map(|inst| {
                let table = arena.get(inst.id).expect("live instance").table().clone();
                let bounds = table.levels()[0].bounds;
                FrameInput {
                    id: inst.id,
                    coverage: projected_coverage(&bounds, inst.position, camera, FOV_Y, ASPECT),
                }
            })
            .collect();

        arena.run_pass(&inputs, FRAME_DT, &mesh_registry);

        snapshot = OverlaySnapshot::take(frame, &arena);
        *shared_snapshot.lock().unwrap() = snapshot.clone();

        if frame % 60 == 0 {
            debug!(
                frame,
                camera_z = camera.z,
                fading = snapshot.fading,
                "pass complete"
            );
        }
    }

    if config.debug.show_overlay {
        info!(
            anchor = ?style.position,
            "final overlay state:\n{}",
            format_panel(&snapshot)
        );
    }
    info!(frames = total_frames, "demo finished");

    #[cfg(debug_assertions)]
    debug_server.stop();
}
