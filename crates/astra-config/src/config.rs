//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SettingsError;

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// LOD quality settings.
    pub lod: LodQualityConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Global LOD quality settings, applied on top of per-group pipeline data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodQualityConfig {
    /// Master LOD switch. Off forces every instance to its finest level.
    pub enable_lod: bool,
    /// Bias added to each group's own bias (0 = neutral, positive = more
    /// detail).
    pub lod_bias: f32,
    /// Master crossfade switch.
    pub enable_crossfade: bool,
    /// Crossfade duration override in seconds; negative = use each group's
    /// own duration.
    pub crossfade_duration: f32,
    /// Hysteresis dead-band around selection thresholds.
    pub hysteresis: f32,
    /// Debug override: pin every instance to this level, bypassing the
    /// selector.
    pub force_level: Option<usize>,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Draw the LOD overlay panel.
    pub show_overlay: bool,
    /// Overlay panel anchor in normalized viewport coordinates.
    pub overlay_position: [f32; 2],
    /// Overlay text color, RGBA.
    pub overlay_color: [f32; 4],
    /// Port for the debug HTTP endpoint (debug builds only).
    pub debug_port: u16,
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

impl Default for LodQualityConfig {
    fn default() -> Self {
        Self {
            enable_lod: true,
            lod_bias: 0.0,
            enable_crossfade: true,
            crossfade_duration: -1.0,
            hysteresis: 0.0,
            force_level: None,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            show_overlay: false,
            overlay_position: [0.02, 0.02],
            overlay_color: [1.0, 1.0, 0.2, 1.0],
            debug_port: 9999,
            log_level: "info".to_string(),
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, SettingsError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).map_err(SettingsError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(SettingsError::ParseError)?;
            info!("loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            info!("created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), SettingsError> {
        std::fs::create_dir_all(config_dir).map_err(SettingsError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(SettingsError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(SettingsError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, SettingsError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(SettingsError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(SettingsError::ParseError)?;

        if &new_config != self {
            info!("config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Default platform config directory.
    pub fn default_dir() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|d| d.join("astra"))
    }
}
