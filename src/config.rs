// src/config.rs - Application configuration, stored as JSON in the platform config dir
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::detection::DetectorConfig;
use crate::effects::EffectSettings;
use crate::error::{Error, Result};
use crate::fire::FireConfig;

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "FACE_FX_CONFIG";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Show the feed like a mirror
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
            fps: 30,
            mirror: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
    pub effects: EffectSettings,
    pub fire: FireConfig,
}

impl AppConfig {
    /// `$FACE_FX_CONFIG` if set, otherwise `config.json` in the platform config dir.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("com", "facefx", "Face FX").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Loads from the default location, falling back to defaults when there is no
    /// file or it cannot be used.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            warn!("No config directory available, using defaults");
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// A missing file is not an error; it yields the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::default_path()
            .ok_or_else(|| Error::Config("No config directory available".to_string()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(Error::Config("Camera resolution must be non-zero".to_string()));
        }
        if self.camera.fps == 0 {
            return Err(Error::Config("Camera FPS must be greater than 0".to_string()));
        }
        if self.detector.poll_interval_ms == 0 {
            return Err(Error::Config(
                "Detector poll interval must be greater than 0".to_string(),
            ));
        }
        if self.detector.probe_attempts == 0 {
            return Err(Error::Config("Detector needs at least one probe attempt".to_string()));
        }
        if self.fire.life_step <= 0 {
            return Err(Error::Config("Fire life step must be positive".to_string()));
        }
        for (name, [lo, hi]) in [
            ("velocity_x", self.fire.velocity_x),
            ("velocity_y", self.fire.velocity_y),
            ("size", self.fire.size),
            ("hue", self.fire.hue),
            ("saturation", self.fire.saturation),
            ("brightness", self.fire.brightness),
            ("flicker_speed", self.fire.flicker_speed),
        ] {
            if !lo.is_finite() || !hi.is_finite() || !(hi - lo).is_finite() {
                return Err(Error::Config(format!(
                    "Fire {name} range must be finite: [{lo}, {hi}]"
                )));
            }
            if lo > hi {
                return Err(Error::Config(format!(
                    "Fire {name} range is inverted: [{lo}, {hi}]"
                )));
            }
        }
        for half in self.fire.jitter {
            if !(half * 2.0).is_finite() || half < 0.0 {
                return Err(Error::Config(format!(
                    "Fire jitter must be a finite, non-negative half-width, got {half}"
                )));
            }
        }
        Ok(())
    }
}
