//! Rendering engine contract
//!
//! The engine owns drawing, the camera and the lasso tool. The plotter talks
//! to it through [`RenderEngine`] and hears back through an
//! [`EngineEventSink`] handed over in the [`EngineInitRequest`]; there is no
//! ambient callback slot.
//!
//! Engine setup is asynchronous on most backends. The scheduler hands out an
//! init request and is told the outcome later through
//! `UpdateScheduler::complete_initialization`.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::bounds::CameraFraming;
use crate::buffer::PointBuffer;
use crate::colormap::Color;
use crate::types::PointIndex;

/// Mutating calls the plotter issues against an initialized engine
pub trait RenderEngine {
    /// Apply camera and/or palette settings
    fn set(&mut self, settings: EngineSettings);

    /// Replace the drawn points
    fn draw(&mut self, buffer: &PointBuffer);

    /// Select points by engine index; an empty slice clears the selection
    fn select(&mut self, points: &[PointIndex]);

    /// The drawing surface changed size
    fn resize_handler(&mut self);

    /// Force lasso selection on plain drags
    fn set_lasso_override(&mut self, enabled: bool);
}

/// Partial engine configuration; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSettings {
    pub camera: Option<CameraFraming>,
    pub palette: Option<Vec<Color>>,
}

impl EngineSettings {
    pub fn camera(framing: CameraFraming) -> Self {
        Self {
            camera: Some(framing),
            ..Default::default()
        }
    }

    pub fn palette(palette: Vec<Color>) -> Self {
        Self {
            palette: Some(palette),
            ..Default::default()
        }
    }
}

/// Canvas options used once at engine setup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    pub pixel_ratio: f64,
    pub target: [f64; 2],
    pub distance: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            target: [0.0, 0.0],
            distance: 1.0,
        }
    }
}

/// Everything an engine needs to start
#[derive(Debug, Clone)]
pub struct EngineInitRequest {
    pub buffer: PointBuffer,
    pub palette: Vec<Color>,
    pub options: EngineOptions,
    /// Where the engine reports selection changes
    pub events: EngineEventSink,
}

/// Selection notifications raised by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// Raw point indices the user selected (lasso or click)
    Selected(Vec<PointIndex>),
    /// The user cleared the selection
    Deselected,
}

/// Queue the engine pushes its events into.
///
/// Cloning shares the queue. Everything runs on one thread, so a shared
/// `RefCell` is enough; the scheduler drains it with `pump_engine_events`.
#[derive(Debug, Clone, Default)]
pub struct EngineEventSink {
    queue: Rc<RefCell<VecDeque<EngineEvent>>>,
}

impl EngineEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: EngineEvent) {
        self.queue.borrow_mut().push_back(event);
    }

    pub fn emit_selected(&self, points: Vec<PointIndex>) {
        self.emit(EngineEvent::Selected(points));
    }

    pub fn emit_deselected(&self) {
        self.emit(EngineEvent::Deselected);
    }

    /// Take the oldest pending event
    pub fn pop(&self) -> Option<EngineEvent> {
        self.queue.borrow_mut().pop_front()
    }

    /// Drop every pending event, returning how many were dropped
    pub fn clear(&self) -> usize {
        let mut queue = self.queue.borrow_mut();
        let dropped = queue.len();
        queue.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

/// Active pointer tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tool {
    #[default]
    Cursor,
    Lasso,
}
