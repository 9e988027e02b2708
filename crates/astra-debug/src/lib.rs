//! LOD debug overlay for the astra engine.
//!
//! Aggregates per-instance selector and crossfade state into a once-per-frame
//! snapshot for on-screen display, and (in debug builds) serves the snapshot
//! as JSON over a local HTTP endpoint for external tooling.
//!
//! The aggregator is a read-only consumer: it never mutates instance state,
//! and the snapshot is taken after the frame pass so it cannot tear
//! mid-update.

use astra_lod::InstanceArena;
use serde::Serialize;

#[cfg(debug_assertions)]
pub mod server;

#[cfg(debug_assertions)]
pub use server::{DebugServer, DebugServerError};


/// One instance's LOD state as captured for display.
#[derive(Debug, Clone, Serialize)]
pub struct OverlayEntry {
    /// Arena slot of the instance.
    pub instance: usize,
    /// Base asset name of the instance's group.
    pub group: String,
    /// Level rendered at the dominant weight.
    pub current_level: usize,
    /// Level being faded in, if any.
    pub pending_level: Option<usize>,
    /// Opacity of the pending level.
    pub blend_weight: f32,
    /// Last evaluated screen coverage.
    pub coverage: f32,
    /// Total levels in the group's table.
    pub total_levels: usize,
    pub is_fading: bool,
}

/// Read-only snapshot of all tracked instances, taken once per frame.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OverlaySnapshot {
    pub frame: u64,
    pub instances: Vec<OverlayEntry>,
    /// Live instance count at snapshot time.
    pub tracked: usize,
    /// How many instances are mid-crossfade.
    pub fading: usize,
}

impl OverlaySnapshot {
    /// Capture the current state of every live instance.
    pub fn take(frame: u64, arena: &InstanceArena) -> Self {
        let mut instances = Vec::with_capacity(arena.len());
        let mut fading = 0;
        for (id, instance) in arena.iter() {
            let output = instance.output();
            if instance.fade().is_fading() {
                fading += 1;
            }
            instances.push(OverlayEntry {
                instance: id.index(),
                group: instance.table().base_name().to_string(),
                current_level: output.current,
                pending_level: output.pending,
                blend_weight: output.blend_weight,
                coverage: instance.last_coverage(),
                total_levels: instance.table().len(),
                is_fading: instance.fade().is_fading(),
            });
        }
        Self {
            frame,
            tracked: instances.len(),
            fading,
            instances,
        }
    }
}

/// Overlay placement and color. Pass-through configuration for the
/// renderer's text pass; the aggregator does no layout itself.
#[derive(Debug, Clone, Copy)]
pub struct OverlayStyle {
    /// Anchor in normalized viewport coordinates.
    pub position: [f32; 2],
    /// Text color, RGBA.
    pub color: [f32; 4],
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            position: [0.02, 0.02],
            color: [1.0, 1.0, 0.2, 1.0],
        }
    }
}

/// Format a snapshot as a text panel, one line per instance.
pub fn format_panel(snapshot: &OverlaySnapshot) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "LOD  frame {}  instances {}  fading {}",
        snapshot.frame, snapshot.tracked, snapshot.fading
    );
    for entry in &snapshot.instances {
        match entry.pending_level {
            Some(pending) => {
                let _ = writeln!(
                    out,
                    "{} {}  L{} -> L{} ({:.0}%)  cov {:.3}",
                    entry.instance,
                    entry.group,
                    entry.current_level,
                    pending,
                    entry.blend_weight * 100.0,
                    entry.coverage,
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    "{} {}  L{}/{}  cov {:.3}",
                    entry.instance,
                    entry.group,
                    entry.current_level,
                    entry.total_levels - 1,
                    entry.coverage,
                );
            }
        }
    }
    out
}
