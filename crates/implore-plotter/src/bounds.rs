//! Camera framing derived from projected coordinates

use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;
use crate::types::{ProjectionMap, RecordStore};

/// Spatial extent of all plotted points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub center_x: f64,
    pub center_y: f64,
    /// Larger of the two half-ranges
    pub max_extent: f64,
}

/// Compute bounds over every record whose projection resolves.
///
/// Returns `None` when either collection is empty or no record resolves, so
/// callers never see infinite or NaN bounds.
pub fn compute_bounds(records: &RecordStore, projections: &ProjectionMap) -> Option<Bounds> {
    if records.is_empty() || projections.is_empty() {
        return None;
    }

    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let mut resolved = 0usize;

    for record in records {
        let Some(p) = projections.get(&record.projection_id) else {
            continue;
        };
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
        resolved += 1;
    }

    if resolved == 0 {
        return None;
    }

    let extent_x = (max_x - min_x) / 2.0;
    let extent_y = (max_y - min_y) / 2.0;

    Some(Bounds {
        min_x,
        max_x,
        min_y,
        max_y,
        center_x: (max_x + min_x) / 2.0,
        center_y: (max_y + min_y) / 2.0,
        max_extent: extent_x.max(extent_y),
    })
}

/// Camera target and zoom limits for a set of bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct CameraFraming {
    pub target_x: f64,
    pub target_y: f64,
    pub distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl CameraFraming {
    pub fn from_bounds(bounds: &Bounds, camera: &CameraConfig) -> Self {
        let framed = bounds.max_extent * camera.framing_padding;
        Self {
            target_x: bounds.center_x,
            target_y: bounds.center_y,
            distance: framed * camera.distance_factor,
            min_distance: framed * camera.min_distance_factor,
            max_distance: framed * camera.max_distance_factor,
        }
    }

    pub fn target(&self) -> [f64; 2] {
        [self.target_x, self.target_y]
    }
}
