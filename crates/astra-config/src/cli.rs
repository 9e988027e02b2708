//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// astra command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "astra", about = "astra LOD engine")]
pub struct CliArgs {
    /// Path to the LOD group manifest exported by the asset pipeline.
    #[arg(long)]
    pub lod_groups: Option<PathBuf>,

    /// Global LOD bias (0 = neutral, positive = more detail).
    #[arg(long)]
    pub lod_bias: Option<f32>,

    /// Disable crossfade transitions.
    #[arg(long)]
    pub no_crossfade: bool,

    /// Hysteresis dead-band around selection thresholds.
    #[arg(long)]
    pub hysteresis: Option<f32>,

    /// Pin every instance to this LOD level (debug override).
    #[arg(long)]
    pub force_level: Option<usize>,

    /// Show the LOD debug overlay.
    #[arg(long)]
    pub overlay: bool,

    /// Port for the debug HTTP endpoint.
    #[arg(long)]
    pub debug_port: Option<u16>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of frames to simulate before exiting.
    #[arg(long)]
    pub frames: Option<u64>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(bias) = args.lod_bias {
            self.lod.lod_bias = bias;
        }
        if args.no_crossfade {
            self.lod.enable_crossfade = false;
        }
        if let Some(h) = args.hysteresis {
            self.lod.hysteresis = h;
        }
        if let Some(level) = args.force_level {
            self.lod.force_level = Some(level);
        }
        if args.overlay {
            self.debug.show_overlay = true;
        }
        if let Some(port) = args.debug_port {
            self.debug.debug_port = port;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
