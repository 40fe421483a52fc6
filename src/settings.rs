use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::{LazyLock, RwLock};
use std::time::Duration;

use crate::viewer::ZoomConfig;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "catascope";

/// Highest magnification a settings file may ask for.
const MAX_MAGNIFICATION: f32 = 8.0;
/// Longest zoom transition a settings file may ask for.
const MAX_ANIMATION_MS: u64 = 2_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_theme")]
    pub theme: String,

    /// Magnification applied by tap-to-zoom (1.0 = fit).
    #[serde(default = "default_zoom_magnification")]
    pub zoom_magnification: f32,

    /// Pointer displacement (cells, either axis) separating a drag from a
    /// tap.
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold: u16,

    /// Duration of the fit <-> zoomed transition in milliseconds.
    #[serde(default = "default_zoom_animation_ms")]
    pub zoom_animation_ms: u64,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_theme() -> String {
    "Oceanic Next".to_string()
}

fn default_zoom_magnification() -> f32 {
    2.5
}

fn default_drag_threshold() -> u16 {
    2
}

fn default_zoom_animation_ms() -> u64 {
    300
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            theme: default_theme(),
            zoom_magnification: default_zoom_magnification(),
            drag_threshold: default_drag_threshold(),
            zoom_animation_ms: default_zoom_animation_ms(),
        }
    }
}

impl Settings {
    /// Parse settings from YAML, falling back to defaults per field.
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str::<Self>(raw).map(Self::sanitized)
    }

    /// Clamp values a hand-edited file may have pushed out of range.
    #[must_use]
    fn sanitized(mut self) -> Self {
        if !self.zoom_magnification.is_finite() {
            self.zoom_magnification = default_zoom_magnification();
        }
        self.zoom_magnification = self.zoom_magnification.clamp(1.0, MAX_MAGNIFICATION);
        self.zoom_animation_ms = self.zoom_animation_ms.min(MAX_ANIMATION_MS);
        self
    }

    #[must_use]
    pub fn zoom_config(&self) -> ZoomConfig {
        ZoomConfig {
            magnification: self.zoom_magnification,
            animation: Duration::from_millis(self.zoom_animation_ms),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from the config file if one exists; defaults otherwise.
pub fn load_settings() {
    let Some(path) = config_path() else {
        warn!("no config directory on this platform, using default settings");
        return;
    };
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(_) => {
            info!("no settings file at {path:?}, using defaults");
            return;
        }
    };

    match Settings::from_yaml(&raw) {
        Ok(settings) => {
            info!("loaded settings from {path:?}");
            *SETTINGS
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner) = settings;
        }
        Err(e) => warn!("ignoring malformed settings file {path:?}: {e}"),
    }
}

#[must_use]
pub fn current_settings() -> Settings {
    SETTINGS
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone()
}

#[must_use]
pub fn zoom_config() -> ZoomConfig {
    current_settings().zoom_config()
}

#[must_use]
pub fn drag_threshold() -> u16 {
    current_settings().drag_threshold
}

#[must_use]
pub fn theme_name() -> String {
    current_settings().theme
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_interaction() {
        let settings = Settings::default();
        assert!((settings.zoom_magnification - 2.5).abs() < f32::EPSILON);
        assert_eq!(settings.drag_threshold, 2);
        assert_eq!(settings.zoom_animation_ms, 300);
    }

    #[test]
    fn partial_yaml_keeps_defaults_for_missing_fields() {
        let settings = Settings::from_yaml("zoom_magnification: 3.0\n").unwrap();
        assert!((settings.zoom_magnification - 3.0).abs() < f32::EPSILON);
        assert_eq!(settings.theme, "Oceanic Next");
        assert_eq!(settings.drag_threshold, 2);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let settings =
            Settings::from_yaml("zoom_magnification: 99.0\nzoom_animation_ms: 600000\n").unwrap();
        assert!((settings.zoom_magnification - 8.0).abs() < f32::EPSILON);
        assert_eq!(settings.zoom_animation_ms, 2_000);

        let settings = Settings::from_yaml("zoom_magnification: 0.1\n").unwrap();
        assert!((settings.zoom_magnification - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn zoom_config_carries_settings_values() {
        let settings = Settings::from_yaml("zoom_animation_ms: 0\n").unwrap();
        let cfg = settings.zoom_config();
        assert!(cfg.animation.is_zero());
        assert!((cfg.magnification - 2.5).abs() < f32::EPSILON);
    }
}
