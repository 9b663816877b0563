//! Change notifications consumed by the update scheduler
//!
//! Each event carries exactly the data that changed. The scheduler decides
//! what to recompute from the event type alone.

use std::collections::VecDeque;

use crate::engine::{EngineEvent, Tool};
use crate::filter::{ColorBy, ContextMode, Filter};
use crate::types::{DatasetSnapshot, PointIndex, RecordId, Visibility};

#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// A new page of records/projections landed
    DatasetChanged(DatasetSnapshot),
    /// The visible-id set changed
    VisibilityChanged(Visibility),
    /// The user picked another color-by option
    FilterChanged(ColorBy),
    /// The dataset supplied a new category filter
    CategoryFilterChanged(Filter),
    /// The projected object kind switched
    ModeChanged(ContextMode),
    ToolChanged(Tool),
    Resized { width: u32, height: u32 },
    /// Programmatic selection by record id; empty clears the selection
    SelectRequested(Vec<RecordId>),
    /// Interactive selection reported by the engine
    EngineSelected(Vec<PointIndex>),
    EngineDeselected,
}

impl SchedulerEvent {
    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            SchedulerEvent::DatasetChanged(_) => "dataset-changed",
            SchedulerEvent::VisibilityChanged(_) => "visibility-changed",
            SchedulerEvent::FilterChanged(_) => "filter-changed",
            SchedulerEvent::CategoryFilterChanged(_) => "category-filter-changed",
            SchedulerEvent::ModeChanged(_) => "mode-changed",
            SchedulerEvent::ToolChanged(_) => "tool-changed",
            SchedulerEvent::Resized { .. } => "resized",
            SchedulerEvent::SelectRequested(_) => "select-requested",
            SchedulerEvent::EngineSelected(_) => "engine-selected",
            SchedulerEvent::EngineDeselected => "engine-deselected",
        }
    }
}

impl From<EngineEvent> for SchedulerEvent {
    fn from(event: EngineEvent) -> Self {
        match event {
            EngineEvent::Selected(points) => SchedulerEvent::EngineSelected(points),
            EngineEvent::Deselected => SchedulerEvent::EngineDeselected,
        }
    }
}

/// FIFO of events held back until the engine is ready
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<SchedulerEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SchedulerEvent) {
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<SchedulerEvent> {
        self.events.pop_front()
    }

    /// Queued events, oldest first
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, SchedulerEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
