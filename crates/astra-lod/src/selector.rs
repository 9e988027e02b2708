//! Screen-coverage LOD selection: threshold walk, bias, and hysteresis dead-band.

use glam::Vec3;

use crate::level::{BoundingSphere, LodLevel};

/// Apply the quality bias and clamp coverage into `[0, 1]`.
///
/// Bias > 0 inflates effective coverage (favors higher detail), bias < 0
/// deflates it (favors lower detail). Non-finite coverage maps to 0.
pub fn effective_coverage(coverage: f32, bias: f32) -> f32 {
    if !coverage.is_finite() {
        return 0.0;
    }
    (coverage * (1.0 + bias)).clamp(0.0, 1.0)
}

/// Select the detail level for the given coverage.
///
/// Walks levels in descending-detail order and returns the first whose
/// threshold is at or below effective coverage. Returns the coarsest level
/// when the instance is smaller than every threshold. Levels must be
/// validated (non-empty, strictly decreasing thresholds); a linear scan is
/// fine for typical level counts (≤ 8).
pub fn select(levels: &[LodLevel], coverage: f32, bias: f32) -> usize {
    debug_assert!(!levels.is_empty(), "level table must be validated");
    let eff = effective_coverage(coverage, bias);
    for (i, level) in levels.iter().enumerate() {
        if level.screen_percentage <= eff {
            return i;
        }
    }
    levels.len() - 1
}

/// Like [`select`], but holds `current` unless effective coverage clears the
/// crossed threshold by more than `dead_band`.
///
/// Coverage oscillating strictly within `threshold ± dead_band` never
/// switches away from `current`. A `dead_band` of 0 degenerates to plain
/// selection.
pub fn select_with_hysteresis(
    levels: &[LodLevel],
    coverage: f32,
    bias: f32,
    current: usize,
    dead_band: f32,
) -> usize {
    let current = current.min(levels.len() - 1);
    let candidate = select(levels, coverage, bias);
    if candidate == current || dead_band <= 0.0 {
        return candidate;
    }

    let eff = effective_coverage(coverage, bias);
    if candidate < current {
        // Toward finer detail: coverage must clear the candidate's threshold
        // by the band. Capped at 1.0 so saturated coverage can still reach
        // level 0, whose threshold is already at the clamp boundary.
        let required = (levels[candidate].screen_percentage + dead_band).min(1.0);
        if eff >= required { candidate } else { current }
    } else {
        // Toward coarser detail: coverage must fall clear of the current
        // level's threshold by the band. Floored at 0.0 for the same reason.
        let required = (levels[current].screen_percentage - dead_band).max(0.0);
        if eff <= required { candidate } else { current }
    }
}

/// Project a bounding sphere into a viewport coverage fraction.
///
/// `fov_y` is the vertical field of view in radians. The result is the
/// sphere's diameter over the view height at that distance, corrected for
/// wide aspect ratios and clamped to `[0, 1]`. A camera inside the sphere
/// counts as full coverage.
pub fn projected_coverage(
    bounds: &BoundingSphere,
    object_pos: Vec3,
    camera_pos: Vec3,
    fov_y: f32,
    aspect: f32,
) -> f32 {
    let center = object_pos + bounds.center;
    let distance = center.distance(camera_pos);
    if distance <= bounds.radius {
        return 1.0;
    }

    let view_height = 2.0 * (fov_y * 0.5).tan() * distance;
    let mut coverage = (bounds.radius * 2.0) / view_height;
    if aspect > 1.0 {
        coverage /= aspect;
    }
    coverage.clamp(0.0, 1.0)
}
