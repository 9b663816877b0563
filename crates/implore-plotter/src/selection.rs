//! Selection reconciliation between record ids and engine point indices
//!
//! The [`SelectionSet`] of record ids is the source of truth. Engine indices
//! are only valid for the index map they were computed with, so they are
//! derived on demand and never stored.
//!
//! Two channels feed the selection:
//! - programmatic requests (ids), forwarded to the engine once a map exists
//! - interactive reports from the engine (indices), translated back to ids
//!
//! While a programmatic request is waiting for a map, engine reports are
//! ignored so an older interactive selection cannot clobber it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::index_map::PointIndexMap;
use crate::types::{PointIndex, RecordId};

/// Ordered set of selected record ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet(BTreeSet<RecordId>);

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<RecordId> {
        self.0.iter().copied().collect()
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

impl FromIterator<RecordId> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = RecordId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Translate record ids to point indices, dropping ids the map does not know
pub fn points_for(ids: impl IntoIterator<Item = RecordId>, map: &PointIndexMap) -> Vec<PointIndex> {
    ids.into_iter()
        .filter_map(|id| {
            let point = map.point_of(id);
            if point.is_none() {
                tracing::trace!(record = %id, "dropping unmapped record from selection");
            }
            point
        })
        .collect()
}

/// Translate point indices to record ids, dropping indices the map does not know
pub fn records_for(points: &[PointIndex], map: &PointIndexMap) -> Vec<RecordId> {
    points
        .iter()
        .filter_map(|&point| {
            let id = map.record_of(point);
            if id.is_none() {
                tracing::trace!(point, "dropping unmapped point from selection");
            }
            id
        })
        .collect()
}

/// What happened to an engine-reported selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineSelectionOutcome {
    /// Translated and published
    Applied,
    /// Dropped because a programmatic request is outstanding
    Ignored,
}

/// Holds the canonical selection and any outstanding programmatic request
#[derive(Debug, Clone, Default)]
pub struct SelectionBridge {
    selection: SelectionSet,
    pending: Option<Vec<RecordId>>,
}

impl SelectionBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Queue a programmatic selection; replaces any earlier pending request
    pub fn request(&mut self, ids: Vec<RecordId>) {
        self.pending = Some(ids);
    }

    /// Consume the pending request against a ready map.
    ///
    /// Publishes the ids that resolved and returns the point indices to
    /// forward to the engine, or `None` when nothing was pending.
    pub fn take_pending(&mut self, map: &PointIndexMap) -> Option<Vec<PointIndex>> {
        let ids = self.pending.take()?;
        let points = points_for(ids, map);
        self.selection = records_for(&points, map).into_iter().collect();
        Some(points)
    }

    /// Apply a selection reported by the engine
    pub fn on_engine_selected(
        &mut self,
        points: &[PointIndex],
        map: &PointIndexMap,
    ) -> EngineSelectionOutcome {
        if self.pending.is_some() {
            return EngineSelectionOutcome::Ignored;
        }
        self.selection = records_for(points, map).into_iter().collect();
        EngineSelectionOutcome::Applied
    }

    /// Clear the selection and any pending request
    pub fn clear(&mut self) {
        self.selection.clear();
        self.pending = None;
    }

    /// Point indices of the current selection under a (new) map
    pub fn remap(&self, map: &PointIndexMap) -> Vec<PointIndex> {
        points_for(self.selection.iter(), map)
    }
}
