//! Two-way mapping between record ids and render-engine point indices
//!
//! Point indices are dense and 1-based: slot 0 of the point buffer is a
//! sentinel, so index `n` is the `n`-th mapped record. Both directions are
//! filled through [`PointIndexMap::push`], which is the only mutator, so they
//! stay a bijection.

use std::collections::HashMap;

use crate::types::{PointIndex, RecordId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointIndexMap {
    by_record: HashMap<RecordId, PointIndex>,
    /// `by_point[i - 1]` is the record at point index `i`
    by_point: Vec<RecordId>,
}

impl PointIndexMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            by_record: HashMap::with_capacity(capacity),
            by_point: Vec::with_capacity(capacity),
        }
    }

    /// Assign the next point index to a record.
    ///
    /// A record that is already mapped keeps its index.
    pub(crate) fn push(&mut self, record: RecordId) -> PointIndex {
        if let Some(&index) = self.by_record.get(&record) {
            return index;
        }
        self.by_point.push(record);
        let index = self.by_point.len() as PointIndex;
        self.by_record.insert(record, index);
        index
    }

    pub fn point_of(&self, record: RecordId) -> Option<PointIndex> {
        self.by_record.get(&record).copied()
    }

    pub fn record_of(&self, point: PointIndex) -> Option<RecordId> {
        if point == 0 {
            return None;
        }
        self.by_point.get(point as usize - 1).copied()
    }

    /// Number of mapped records (the highest point index)
    pub fn len(&self) -> usize {
        self.by_point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_point.is_empty()
    }

    /// Iterate `(point index, record id)` pairs in point order
    pub fn iter(&self) -> impl Iterator<Item = (PointIndex, RecordId)> + '_ {
        self.by_point
            .iter()
            .enumerate()
            .map(|(i, &record)| (i as PointIndex + 1, record))
    }
}
