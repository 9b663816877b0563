//! Color-by filters and per-point color assignment
//!
//! A filter maps a record to a palette position. Discrete filters look the
//! record's category up in an ordered option list; continuous filters
//! normalize a scalar into `[0, 1]` and pick the nearest color-scale entry.
//!
//! Every palette produced by [`ColorAssigner`] carries one extra trailing
//! entry, the unassigned color. Records whose value cannot be resolved (no
//! annotation, unknown category, NaN) get that index, so a color index is
//! always in range for the palette it was computed with.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::colormap::{Color, Colormap};
use crate::types::Record;

/// Extracts a category id from a record
pub type CategoryFetch = Arc<dyn Fn(&Record) -> Option<i64> + Send + Sync>;

/// Extracts a scalar from a record
pub type ValueFetch = Arc<dyn Fn(&Record) -> Option<f64> + Send + Sync>;

/// One entry of a discrete filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    pub id: i64,
    pub color: Color,
    pub visible: bool,
}

impl FilterOption {
    pub fn new(id: i64, color: Color) -> Self {
        Self {
            id,
            color,
            visible: true,
        }
    }
}

/// Value range and color scale of a continuous filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousRange {
    pub min: f64,
    pub max: f64,
    pub color_scale: Vec<Color>,
}

impl ContinuousRange {
    pub fn new(min: f64, max: f64, color_scale: Vec<Color>) -> Self {
        Self {
            min,
            max,
            color_scale,
        }
    }

    /// Sample `steps` colors from a colormap
    pub fn from_colormap(min: f64, max: f64, colormap: &Colormap, steps: usize) -> Self {
        Self::new(min, max, colormap.palette(steps))
    }

    /// Min-max normalization clamped to `[0, 1]`. A degenerate range maps to 0.
    pub fn normalize(&self, value: f64) -> f64 {
        if self.max <= self.min {
            return 0.0;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// How a filter maps records onto colors
#[derive(Clone)]
pub enum FilterKind {
    Discrete {
        options: Vec<FilterOption>,
        fetch: CategoryFetch,
    },
    Continuous {
        range: ContinuousRange,
        fetch: ValueFetch,
    },
}

/// A named color-by rule
#[derive(Clone)]
pub struct Filter {
    pub name: String,
    pub kind: FilterKind,
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = f.debug_struct("Filter");
        out.field("name", &self.name);
        match &self.kind {
            FilterKind::Discrete { options, .. } => out.field("options", options),
            FilterKind::Continuous { range, .. } => out.field("range", range),
        };
        out.finish()
    }
}

impl Filter {
    pub fn discrete(
        name: impl Into<String>,
        options: Vec<FilterOption>,
        fetch: impl Fn(&Record) -> Option<i64> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind: FilterKind::Discrete {
                options,
                fetch: Arc::new(fetch),
            },
        }
    }

    pub fn continuous(
        name: impl Into<String>,
        range: ContinuousRange,
        fetch: impl Fn(&Record) -> Option<f64> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind: FilterKind::Continuous {
                range,
                fetch: Arc::new(fetch),
            },
        }
    }

    /// Single neutral color for every record
    pub fn none(color: Color) -> Self {
        Self::discrete("None", vec![FilterOption::new(0, color)], |_| Some(0))
    }

    /// Color by the category of each record's first annotation
    pub fn categories(options: Vec<FilterOption>) -> Self {
        Self::discrete("Categories", options, Record::primary_category)
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self.kind, FilterKind::Discrete { .. })
    }
}

/// Palette plus per-record color indices for one filter.
///
/// The palette is built once in [`ColorAssigner::new`]; indices are computed
/// from the same assigner, so the two cannot drift apart.
#[derive(Debug)]
pub struct ColorAssigner<'a> {
    filter: &'a Filter,
    palette: Vec<Color>,
    unassigned: u32,
}

impl<'a> ColorAssigner<'a> {
    pub fn new(filter: &'a Filter, unassigned_color: Color) -> Self {
        let mut palette: Vec<Color> = match &filter.kind {
            FilterKind::Discrete { options, .. } => options.iter().map(|o| o.color).collect(),
            FilterKind::Continuous { range, .. } => range.color_scale.clone(),
        };
        let unassigned = palette.len() as u32;
        palette.push(unassigned_color);

        Self {
            filter,
            palette,
            unassigned,
        }
    }

    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    pub fn into_palette(self) -> Vec<Color> {
        self.palette
    }

    /// Index of the trailing unassigned color
    pub fn unassigned_index(&self) -> u32 {
        self.unassigned
    }

    /// Palette position for a record
    pub fn color_index(&self, record: &Record) -> u32 {
        match &self.filter.kind {
            FilterKind::Discrete { options, fetch } => fetch(record)
                .and_then(|category| options.iter().position(|o| o.id == category))
                .map(|pos| pos as u32)
                .unwrap_or(self.unassigned),
            FilterKind::Continuous { range, fetch } => {
                let steps = range.color_scale.len();
                match fetch(record) {
                    Some(value) if steps > 0 && !value.is_nan() => {
                        let t = range.normalize(value);
                        (t * (steps - 1) as f64).round() as u32
                    }
                    _ => self.unassigned,
                }
            }
        }
    }
}

/// Color-by choices offered in the plotter dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum ColorBy {
    #[default]
    None,
    Categories,
}

impl ColorBy {
    pub fn name(&self) -> &'static str {
        match self {
            ColorBy::None => "None",
            ColorBy::Categories => "Categories",
        }
    }
}

/// Which kind of object the projection currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum ContextMode {
    #[default]
    Datapoint,
    Object,
}

/// Color-by choices available in a context mode
pub fn available_color_by(mode: ContextMode) -> Vec<ColorBy> {
    match mode {
        ContextMode::Object => vec![ColorBy::None, ColorBy::Categories],
        ContextMode::Datapoint => Vec::new(),
    }
}

/// Resolve the filter to render with.
///
/// Falls back to the neutral filter when the choice is not offered in this
/// mode or the dataset has not supplied its category filter yet.
pub fn resolve_filter(
    color_by: ColorBy,
    mode: ContextMode,
    categories: Option<&Filter>,
    neutral: Color,
) -> Filter {
    if !available_color_by(mode).contains(&color_by) {
        return Filter::none(neutral);
    }
    match (color_by, categories) {
        (ColorBy::Categories, Some(filter)) => filter.clone(),
        _ => Filter::none(neutral),
    }
}
