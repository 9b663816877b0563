//! implore-plotter - Projection plotter core for implore
//!
//! Keeps a GPU point-cloud rendering of a 2D embedding in sync with a
//! streaming dataset, user-chosen coloring, a visibility filter and a
//! bidirectional selection.
//!
//! # Key Components
//!
//! - **Bounds**: Extent and center of the projected points, used to frame the camera
//! - **PointIndexMap**: Bijection between record ids and 1-based engine point indices
//! - **PointBuffer**: Flat render buffer with a sentinel at index 0
//! - **ColorAssigner**: Palette and per-record color index for discrete or continuous filters
//! - **SelectionBridge**: Reconciles programmatic and interactive selections
//! - **UpdateScheduler**: Decides what to recompute on each change and drives the engine
//!
//! The rendering engine itself is abstract: implement [`RenderEngine`] for a
//! backend and hand it to [`UpdateScheduler::complete_initialization`].

pub mod bounds;
pub mod buffer;
pub mod colormap;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod filter;
pub mod index_map;
pub mod scheduler;
pub mod selection;
pub mod types;

pub use bounds::{compute_bounds, Bounds, CameraFraming};
pub use buffer::{build_point_buffer, BufferBuild, PointBuffer, PointRecord};
pub use colormap::{get_colormap, Color, Colormap};
pub use config::{BehaviorConfig, CameraConfig, PlotterConfig, RenderSettings};
pub use engine::{
    EngineEvent, EngineEventSink, EngineInitRequest, EngineOptions, EngineSettings, RenderEngine,
    Tool,
};
pub use error::{ConfigError, EngineError, PlotterError, PlotterResult, SchedulerError};
pub use event::{EventQueue, SchedulerEvent};
pub use filter::{
    available_color_by, resolve_filter, ColorAssigner, ColorBy, ContextMode, ContinuousRange,
    Filter, FilterKind, FilterOption,
};
pub use index_map::PointIndexMap;
pub use scheduler::{PlotterStatus, SchedulerState, SessionState, UpdateScheduler};
pub use selection::{EngineSelectionOutcome, SelectionBridge, SelectionSet};
pub use types::*;

// Setup UniFFI when the feature is enabled
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
