//! Configuration loader - YAML settings + .env overrides
//!
//! Every section defaults, so a partial `atlas.yaml` (or none at all) works.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::color::ColorMode;
use crate::state::ViewDefaults;

/// Main configuration loaded from atlas.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub scene: SceneConfig,
    pub points: PointsConfig,
    pub defaults: DefaultsConfig,
}

/// Where the JSON documents live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Local directory or http(s) URL
    pub base: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { base: ".".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Paper Atlas".to_string(),
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    /// Vertical field of view in degrees
    pub fov: f32,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
    pub damping: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [0.0, 0.0, 15.0],
            fov: 45.0,
            auto_rotate: true,
            auto_rotate_speed: 0.1,
            damping: 0.1,
            min_distance: 0.5,
            max_distance: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub background: [u8; 3],
    pub star_count: usize,
    pub star_radius: f32,
    pub star_depth: f32,
    pub ambient: f32,
    pub light_position: [f32; 3],
    pub light_intensity: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: [0x05, 0x05, 0x05],
            star_count: 5000,
            star_radius: 100.0,
            star_depth: 50.0,
            ambient: 0.5,
            light_position: [10.0, 10.0, 10.0],
            light_intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsConfig {
    pub radius: f32,
    pub min_pixel_radius: f32,
    pub pick_tolerance: f32,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            radius: 0.02,
            min_pixel_radius: 1.0,
            pick_tolerance: 4.0,
        }
    }
}

/// Initial view settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub color_mode: ColorMode,
    pub show_labels: bool,
    pub show_keywords: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::Topic,
            show_labels: true,
            show_keywords: true,
        }
    }
}

impl From<&DefaultsConfig> for ViewDefaults {
    fn from(d: &DefaultsConfig) -> Self {
        ViewDefaults {
            color_mode: d.color_mode,
            show_labels: d.show_labels,
            show_keywords: d.show_keywords,
        }
    }
}

/// Environment overrides, read after .env is loaded
#[derive(Debug, Clone, Default)]
pub struct Env {
    pub data_base: Option<String>,
    pub log_dir: String,
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Apply the env override, then the CLI one; last writer wins
    pub fn apply_overrides(&mut self, env: &Env, cli_data: Option<&str>) {
        if let Some(base) = env.data_base.as_deref() {
            self.data.base = base.to_string();
        }
        if let Some(base) = cli_data {
            self.data.base = base.to_string();
        }
    }
}

impl Env {
    /// Load overrides from .env and the process environment
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        Env {
            data_base: std::env::var("ATLAS_DATA_BASE").ok().filter(|s| !s.is_empty()),
            log_dir: std::env::var("ATLAS_LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        }
    }
}
