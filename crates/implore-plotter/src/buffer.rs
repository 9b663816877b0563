//! Point buffer construction
//!
//! One pass over the records, in insertion order, produces the flat buffer
//! the engine draws, the index map that names its points and the palette its
//! color indices refer to. The three are returned together in a
//! [`BufferBuild`] and replaced wholesale on the next rebuild.
//!
//! Records whose projection id has no match are left out of the buffer and
//! counted in [`BufferBuild::skipped`]. This is deliberate: a dataset page
//! can land before its projections, and one unresolved record must not hold
//! back the rest of the plot.

use serde::{Deserialize, Serialize};

use crate::colormap::Color;
use crate::filter::{ColorAssigner, Filter};
use crate::index_map::PointIndexMap;
use crate::types::{DatasetSnapshot, PointIndex, RecordId};

/// Render-ready point: `(x, y, visible, color index, record id)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub x: f64,
    pub y: f64,
    pub visible: bool,
    pub color_index: u32,
    pub record_id: RecordId,
}

impl PointRecord {
    /// Slot 0 filler; never corresponds to a record
    pub const SENTINEL: PointRecord = PointRecord {
        x: 0.0,
        y: 0.0,
        visible: false,
        color_index: 0,
        record_id: RecordId(0),
    };
}

/// Flat point sequence with the sentinel at index 0
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointBuffer {
    points: Vec<PointRecord>,
}

impl PointBuffer {
    /// Buffer holding only the sentinel
    pub fn empty() -> Self {
        Self::with_capacity(0)
    }

    fn with_capacity(records: usize) -> Self {
        let mut points = Vec::with_capacity(records + 1);
        points.push(PointRecord::SENTINEL);
        Self { points }
    }

    /// All slots, sentinel included
    pub fn as_slice(&self) -> &[PointRecord] {
        &self.points
    }

    /// Point at an engine index (never the sentinel)
    pub fn get(&self, index: PointIndex) -> Option<&PointRecord> {
        if index == 0 {
            return None;
        }
        self.points.get(index as usize)
    }

    /// Real points, excluding the sentinel
    pub fn points(&self) -> &[PointRecord] {
        self.points.get(1..).unwrap_or(&[])
    }

    /// Number of real points
    pub fn len(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn visible_count(&self) -> usize {
        self.points().iter().filter(|p| p.visible).count()
    }
}

impl Default for PointBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

/// Everything one rebuild produces
#[derive(Debug, Clone, PartialEq)]
pub struct BufferBuild {
    pub buffer: PointBuffer,
    pub index_map: PointIndexMap,
    pub palette: Vec<Color>,
    /// Records left out because their projection is missing
    pub skipped: usize,
}

/// Rebuild the point buffer, index map and palette from scratch
pub fn build_point_buffer(
    snapshot: &DatasetSnapshot,
    filter: &Filter,
    unassigned_color: Color,
) -> BufferBuild {
    let assigner = ColorAssigner::new(filter, unassigned_color);
    let mut buffer = PointBuffer::with_capacity(snapshot.records.len());
    let mut index_map = PointIndexMap::with_capacity(snapshot.records.len());
    let mut skipped = 0;

    for record in &snapshot.records {
        let Some(projection) = snapshot.projections.get(&record.projection_id) else {
            tracing::debug!(
                record = %record.id,
                projection = %record.projection_id,
                "skipping record with missing projection"
            );
            skipped += 1;
            continue;
        };

        let index = index_map.push(record.id);
        debug_assert_eq!(index as usize, buffer.points.len());

        buffer.points.push(PointRecord {
            x: projection.x,
            y: projection.y,
            visible: record.visible,
            color_index: assigner.color_index(record),
            record_id: record.id,
        });
    }

    BufferBuild {
        buffer,
        index_map,
        palette: assigner.into_palette(),
        skipped,
    }
}
