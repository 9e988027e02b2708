//! Timed crossfade between two detail levels.
//!
//! Per-instance two-state machine: `Stable` at one level, or `Fading` from
//! one level toward another. The blend weight is the pending level's
//! opacity; the current level renders at its complement.

/// Crossfade state for one instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FadeState {
    /// Resting at `level`, no transition in progress.
    Stable { level: usize },
    /// Blending from `from` toward `to`. `elapsed` runs from 0 to `duration`;
    /// `start_weight` is the blend weight the fade began at (0 for a fresh
    /// fade, nonzero after a mid-fade retarget).
    Fading {
        from: usize,
        to: usize,
        elapsed: f32,
        duration: f32,
        start_weight: f32,
    },
}

impl FadeState {
    pub fn stable(level: usize) -> Self {
        Self::Stable { level }
    }

    /// The level rendered at full (or dominant) weight.
    pub fn current_level(&self) -> usize {
        match *self {
            Self::Stable { level } => level,
            Self::Fading { from, .. } => from,
        }
    }

    /// The level being faded in, if any.
    pub fn pending_level(&self) -> Option<usize> {
        match *self {
            Self::Stable { .. } => None,
            Self::Fading { to, .. } => Some(to),
        }
    }

    /// The level this state is settling toward.
    pub fn target_level(&self) -> usize {
        match *self {
            Self::Stable { level } => level,
            Self::Fading { to, .. } => to,
        }
    }

    /// Opacity of the pending level: 0 = fully current, 1 = fully pending.
    ///
    /// Interpolates from `start_weight` to 1 over the fade duration.
    pub fn blend_weight(&self) -> f32 {
        match *self {
            Self::Stable { .. } => 0.0,
            Self::Fading {
                elapsed,
                duration,
                start_weight,
                ..
            } => {
                let t = (elapsed / duration).clamp(0.0, 1.0);
                (start_weight + t * (1.0 - start_weight)).clamp(0.0, 1.0)
            }
        }
    }

    pub fn is_fading(&self) -> bool {
        matches!(self, Self::Fading { .. })
    }

    /// Point the state at `target`.
    ///
    /// Switches instantly when crossfade is disabled or the duration is
    /// zero. Otherwise begins a fade, with mid-fade retargets restarting
    /// toward the newest target without a visual snap: the new fade's
    /// `start_weight` is seeded from the pre-retarget blend weight, so the
    /// reported weight is continuous across the retarget.
    /// - retargeting back to the fade's source swaps the fade roles and
    ///   inverts the weight, so both levels' opacities are continuous;
    /// - retargeting to a third level keeps the fade source and hands the
    ///   pending slot to the new target at the weight the old one held.
    pub fn retarget(&mut self, target: usize, enable_crossfade: bool, duration: f32) {
        if target == self.target_level() {
            return;
        }
        if !enable_crossfade || duration <= 0.0 {
            *self = Self::Stable { level: target };
            return;
        }

        let weight = self.blend_weight();
        *self = match *self {
            Self::Stable { level } => Self::Fading {
                from: level,
                to: target,
                elapsed: 0.0,
                duration,
                start_weight: 0.0,
            },
            Self::Fading { from, to, .. } => {
                if target == from {
                    Self::Fading {
                        from: to,
                        to: from,
                        elapsed: 0.0,
                        duration,
                        start_weight: 1.0 - weight,
                    }
                } else {
                    Self::Fading {
                        from,
                        to: target,
                        elapsed: 0.0,
                        duration,
                        start_weight: weight,
                    }
                }
            }
        };
    }

    /// Advance the fade by `dt` seconds. Negative or non-finite `dt` is
    /// treated as zero. Returns `true` when the fade completed this call.
    pub fn advance(&mut self, dt: f32) -> bool {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if let Self::Fading {
            to,
            elapsed,
            duration,
            ..
        } = self
        {
            *elapsed += dt;
            if *elapsed >= *duration {
                *self = Self::Stable { level: *to };
                return true;
            }
        }
        false
    }
}
