//! Colors and palettes handed to the rendering engine
//!
//! The engine colors points by palette position, so everything here ends in
//! a plain `Vec<Color>`:
//! - Categorical palettes parsed from `#RRGGBB` strings
//! - Sampled colormaps (viridis, coolwarm) for continuous color-by ranges

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A color in RGBA format (0.0 to 1.0)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Create a color from RGB (alpha = 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#RRGGBB`, `RRGGBB` or the short `#RGB` form
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);

        match hex.len() {
            6 => Some(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let doubled: String = hex.chars().flat_map(|c| [c, c]).collect();
                Self::from_hex(&doubled)
            }
            _ => None,
        }
    }

    /// Convert to `#RRGGBB`
    pub fn to_hex(&self) -> String {
        format!(
            "#{:02X}{:02X}{:02X}",
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8
        )
    }

    /// Linear interpolation between two colors
    pub fn lerp(a: &Color, b: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: a.r + (b.r - a.r) * t,
            g: a.g + (b.g - a.g) * t,
            b: a.b + (b.b - a.b) * t,
            a: a.a + (b.a - a.a) * t,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(0.5, 0.5, 0.5)
    }
}

// Colors travel as hex strings in config files and status snapshots.
impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Color::from_hex(&hex)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color '{}'", hex)))
    }
}

/// Color given to points whose color-by value could not be resolved
pub const UNASSIGNED_HEX: &str = "#111111";

/// Categorical palette used before any color-by filter supplies its own
pub const DEFAULT_CATEGORY_HEX: [&str; 10] = [
    "#fe115d", "#65c00c", "#6641de", "#fa6d09", "#015be8", "#d84500", "#3b21b3", "#e90042",
    "#8e63f8", "#f338c2",
];

/// Parse a list of hex strings, returning the first invalid entry on failure
pub fn parse_palette<S: AsRef<str>>(hexes: &[S]) -> Result<Vec<Color>, String> {
    hexes
        .iter()
        .map(|h| Color::from_hex(h.as_ref()).ok_or_else(|| h.as_ref().to_string()))
        .collect()
}

/// The default categorical palette
pub fn default_category_palette() -> Vec<Color> {
    DEFAULT_CATEGORY_HEX
        .iter()
        .filter_map(|h| Color::from_hex(h))
        .collect()
}

/// A colormap for mapping scalar values to colors
#[derive(Clone, Debug)]
pub struct Colormap {
    pub name: String,
    /// Evenly spaced color stops
    stops: Vec<Color>,
}

impl Colormap {
    pub fn from_colors(name: impl Into<String>, stops: Vec<Color>) -> Self {
        Self {
            name: name.into(),
            stops,
        }
    }

    /// Sample the colormap at a position (0.0 to 1.0)
    pub fn sample(&self, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        match self.stops.len() {
            0 => Color::default(),
            1 => self.stops[0],
            n => {
                let scaled = t * (n - 1) as f32;
                let lower = (scaled.floor() as usize).min(n - 2);
                Color::lerp(&self.stops[lower], &self.stops[lower + 1], scaled - lower as f32)
            }
        }
    }

    /// Discretize into a palette of `size` colors
    pub fn palette(&self, size: usize) -> Vec<Color> {
        (0..size)
            .map(|i| self.sample(i as f32 / (size - 1).max(1) as f32))
            .collect()
    }
}

/// Perceptually uniform, colorblind-safe sequential colormap
pub fn viridis() -> Colormap {
    Colormap::from_colors(
        "viridis",
        vec![
            Color::rgb(0.267, 0.005, 0.329),
            Color::rgb(0.254, 0.265, 0.530),
            Color::rgb(0.164, 0.471, 0.558),
            Color::rgb(0.135, 0.659, 0.518),
            Color::rgb(0.478, 0.821, 0.318),
            Color::rgb(0.993, 0.906, 0.144),
        ],
    )
}

/// Diverging colormap for values around a midpoint
pub fn coolwarm() -> Colormap {
    Colormap::from_colors(
        "coolwarm",
        vec![
            Color::rgb(0.230, 0.299, 0.754),
            Color::rgb(0.865, 0.865, 0.865),
            Color::rgb(0.706, 0.016, 0.150),
        ],
    )
}

/// Get a built-in colormap by name
pub fn get_colormap(name: &str) -> Option<Colormap> {
    match name.to_lowercase().as_str() {
        "viridis" => Some(viridis()),
        "coolwarm" => Some(coolwarm()),
        _ => None,
    }
}
