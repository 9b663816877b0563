//! Dataset-side types read by the plotter
//!
//! Records and projections are produced by the dataset loader as pages
//! stream in. The plotter never deletes them; it only reads them (and derives
//! a per-point visibility flag of its own during buffer rebuilds).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Identifier of a dataset record (a "datapoint")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Identifier of a 2D projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectionId(pub i64);

impl std::fmt::Display for ProjectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ProjectionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Render-engine point index. Index 0 is a sentinel and never names a record.
pub type PointIndex = u32;

/// A label attached to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: i64,
    pub category_id: i64,
}

/// One data item being visualized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub projection_id: ProjectionId,
    pub annotations: Vec<Annotation>,
    /// Render flag on the plotter's working copy, kept in step with the
    /// snapshot's [`Visibility`]
    pub visible: bool,
}

impl Record {
    /// Create a visible record with no annotations
    pub fn new(id: i64, projection_id: i64) -> Self {
        Self {
            id: RecordId(id),
            projection_id: ProjectionId(projection_id),
            annotations: Vec::new(),
            visible: true,
        }
    }

    /// Attach an annotation
    pub fn with_annotation(mut self, id: i64, category_id: i64) -> Self {
        self.annotations.push(Annotation { id, category_id });
        self
    }

    /// Category of the first annotation, if any
    pub fn primary_category(&self) -> Option<i64> {
        self.annotations.first().map(|a| a.category_id)
    }
}

/// The 2D coordinate a record is plotted at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub id: ProjectionId,
    pub x: f64,
    pub y: f64,
}

impl Projection {
    pub fn new(id: i64, x: f64, y: f64) -> Self {
        Self {
            id: ProjectionId(id),
            x,
            y,
        }
    }
}

/// Projections keyed by their id
pub type ProjectionMap = HashMap<ProjectionId, Projection>;

/// Records keyed by id, iterated in insertion order.
///
/// Re-inserting an existing id replaces the record but keeps its original
/// position, so point indices stay stable while pages are merged in.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    positions: HashMap<RecordId, usize>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record, returning the replaced one
    pub fn insert(&mut self, record: Record) -> Option<Record> {
        match self.positions.get(&record.id) {
            Some(&pos) => Some(std::mem::replace(&mut self.records[pos], record)),
            None => {
                self.positions.insert(record.id, self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.positions.get(&id).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Rewrite every record's `visible` flag from a visibility filter
    pub fn apply_visibility(&mut self, visibility: &Visibility) {
        for record in &mut self.records {
            record.visible = visibility.is_visible(record.id);
        }
    }
}

impl FromIterator<Record> for RecordStore {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut store = RecordStore::new();
        store.extend(iter);
        store
    }
}

impl Extend<Record> for RecordStore {
    fn extend<I: IntoIterator<Item = Record>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Which records should be rendered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Visibility {
    /// Every record is rendered
    #[default]
    All,
    /// Only the listed records are rendered; the rest stay mapped but hidden
    Only(HashSet<RecordId>),
}

impl Visibility {
    pub fn only(ids: impl IntoIterator<Item = i64>) -> Self {
        Visibility::Only(ids.into_iter().map(RecordId).collect())
    }

    pub fn is_visible(&self, id: RecordId) -> bool {
        match self {
            Visibility::All => true,
            Visibility::Only(ids) => ids.contains(&id),
        }
    }
}

/// Everything the dataset loader exposes to the plotter at one point in time
#[derive(Debug, Clone, Default)]
pub struct DatasetSnapshot {
    pub records: RecordStore,
    pub projections: ProjectionMap,
    pub visibility: Visibility,
    /// Set once every page has been fetched
    pub fully_loaded: bool,
}

impl DatasetSnapshot {
    pub fn new(records: RecordStore, projections: impl IntoIterator<Item = Projection>) -> Self {
        let mut snapshot = Self {
            records,
            projections: projections.into_iter().map(|p| (p.id, p)).collect(),
            visibility: Visibility::All,
            fully_loaded: true,
        };
        snapshot.sync_visibility();
        snapshot
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.set_visibility(visibility);
        self
    }

    /// Replace the visibility filter and update the record flags
    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
        self.sync_visibility();
    }

    /// Bring the record flags in line with `visibility`
    pub fn sync_visibility(&mut self) {
        self.records.apply_visibility(&self.visibility);
    }

    pub fn loading(mut self) -> Self {
        self.fully_loaded = false;
        self
    }

    /// Both collections are non-empty, so derived state is meaningful
    pub fn has_shape(&self) -> bool {
        !self.records.is_empty() && !self.projections.is_empty()
    }
}
