//! Configuration for implore-plotter
//!
//! Camera framing factors, palette defaults and scheduling behavior. Loaded
//! from JSON or TOML and validated before a scheduler is built.

use serde::{Deserialize, Serialize};

use crate::colormap::{Color, DEFAULT_CATEGORY_HEX, UNASSIGNED_HEX};
use crate::error::ConfigError;

/// Plotter-wide configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotterConfig {
    /// Camera framing relative to the data extent
    pub camera: CameraConfig,
    /// Palette and canvas settings
    pub render: RenderSettings,
    /// Scheduling policy
    pub behavior: BehaviorConfig,
}

/// Camera framing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Multiplier applied to the max extent before the distance factors
    pub framing_padding: f64,
    /// Default camera distance, in padded extents
    pub distance_factor: f64,
    /// Closest zoom, in padded extents
    pub min_distance_factor: f64,
    /// Farthest zoom, in padded extents
    pub max_distance_factor: f64,
    /// Distance handed to the engine at initialization, in raw extents
    pub initial_distance_factor: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            framing_padding: 1.4,
            distance_factor: 3.0,
            min_distance_factor: 1.0 / 20.0,
            max_distance_factor: 8.0,
            initial_distance_factor: 1.2,
        }
    }
}

/// Palette and canvas configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Upper bound on the device pixel ratio passed to the engine
    pub max_pixel_ratio: f64,
    /// Palette used before any color-by filter is applied
    pub default_palette: Vec<String>,
    /// Color of points whose color-by value cannot be resolved
    pub unassigned_color: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            max_pixel_ratio: 1.5,
            default_palette: DEFAULT_CATEGORY_HEX.iter().map(|s| s.to_string()).collect(),
            unassigned_color: UNASSIGNED_HEX.to_string(),
        }
    }
}

/// Scheduling behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Drop the interactive selection when the context mode switches
    pub clear_selection_on_mode_change: bool,
    /// Skip dataset rebuilds until every page is loaded
    pub require_fully_loaded: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            clear_selection_on_mode_change: true,
            require_fully_loaded: true,
        }
    }
}

impl PlotterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parsed unassigned color
    pub fn unassigned_color(&self) -> Result<Color, ConfigError> {
        Color::from_hex(&self.render.unassigned_color)
            .ok_or_else(|| ConfigError::InvalidColor(self.render.unassigned_color.clone()))
    }

    /// Parsed default palette
    pub fn default_palette(&self) -> Result<Vec<Color>, ConfigError> {
        crate::colormap::parse_palette(&self.render.default_palette).map_err(ConfigError::InvalidColor)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        let factors = [
            ("framing_padding", camera.framing_padding),
            ("distance_factor", camera.distance_factor),
            ("min_distance_factor", camera.min_distance_factor),
            ("max_distance_factor", camera.max_distance_factor),
            ("initial_distance_factor", camera.initial_distance_factor),
        ];
        for (name, value) in factors {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::OutOfRange(format!("{} must be positive", name)));
            }
        }

        if !(camera.min_distance_factor < camera.distance_factor
            && camera.distance_factor < camera.max_distance_factor)
        {
            return Err(ConfigError::OutOfRange(
                "distance factors must satisfy min < distance < max".to_string(),
            ));
        }

        if !(self.render.max_pixel_ratio.is_finite() && self.render.max_pixel_ratio > 0.0) {
            return Err(ConfigError::OutOfRange(
                "max_pixel_ratio must be positive".to_string(),
            ));
        }

        self.default_palette()?;
        self.unassigned_color()?;

        Ok(())
    }
}
