//! Update scheduler
//!
//! Reacts to [`SchedulerEvent`]s, decides which derived state to recompute
//! and drives the rendering engine. Every recomputation is gated on its
//! prerequisites:
//!
//! - dataset changes need non-empty records and projections
//! - visibility and filter changes need a buffer that was already built
//! - nothing is pushed to the engine until both buffer and bounds exist
//! - nothing reaches the engine before it finished initializing; events that
//!   arrive earlier are deferred and replayed in order
//!
//! State transitions:
//! ```text
//! Uninitialized → AwaitingFirstData → Recomputing ⇄ Ready
//!       ↓                ↓
//!   InitFailed       InitFailed
//! ```

use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use crate::bounds::{compute_bounds, Bounds, CameraFraming};
use crate::buffer::{build_point_buffer, BufferBuild, PointBuffer};
use crate::colormap::Color;
use crate::config::PlotterConfig;
use crate::engine::{
    EngineEventSink, EngineInitRequest, EngineOptions, EngineSettings, RenderEngine, Tool,
};
use crate::error::{EngineError, PlotterError, PlotterResult, SchedulerError};
use crate::event::{EventQueue, SchedulerEvent};
use crate::filter::{available_color_by, resolve_filter, ColorBy, ContextMode, Filter};
use crate::selection::{EngineSelectionOutcome, SelectionBridge, SelectionSet};
use crate::types::{DatasetSnapshot, PointIndex, RecordId, Visibility};

/// Lifecycle of a plotter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum SchedulerState {
    /// Engine not initialized yet
    #[default]
    Uninitialized,
    /// Engine ready, nothing drawn yet
    AwaitingFirstData,
    /// Buffer drawn and in sync with the inputs
    Ready,
    /// A rebuild is in progress
    Recomputing,
    /// Engine setup failed; terminal
    InitFailed,
}

impl SchedulerState {
    pub fn can_transition_to(&self, target: &SchedulerState) -> bool {
        use SchedulerState::*;
        matches!(
            (self, target),
            (Uninitialized, AwaitingFirstData)
                | (Uninitialized, InitFailed)
                | (AwaitingFirstData, Recomputing)
                | (AwaitingFirstData, InitFailed)
                | (Recomputing, Ready)
                | (Recomputing, AwaitingFirstData)
                | (Ready, Recomputing)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SchedulerState::InitFailed)
    }
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerState::Uninitialized => write!(f, "uninitialized"),
            SchedulerState::AwaitingFirstData => write!(f, "awaiting-first-data"),
            SchedulerState::Ready => write!(f, "ready"),
            SchedulerState::Recomputing => write!(f, "recomputing"),
            SchedulerState::InitFailed => write!(f, "init-failed"),
        }
    }
}

enum EngineSlot {
    Absent,
    Initializing,
    Live(Box<dyn RenderEngine>),
}

/// Inputs and derived values owned by one scheduler
#[derive(Debug, Default)]
pub struct SessionState {
    /// Last fully loaded, non-empty dataset
    pub dataset: Option<DatasetSnapshot>,
    pub mode: ContextMode,
    pub color_by: ColorBy,
    /// Category filter supplied by the dataset
    pub category_filter: Option<Filter>,
    pub tool: Tool,
    pub bounds: Option<Bounds>,
    /// Whether the camera was framed for the current mode
    pub camera_framed: bool,
    pub build: Option<BufferBuild>,
}

impl SessionState {
    /// The color-by option actually rendered after fallbacks
    pub fn effective_color_by(&self) -> ColorBy {
        match self.color_by {
            ColorBy::Categories
                if available_color_by(self.mode).contains(&ColorBy::Categories)
                    && self.category_filter.is_some() =>
            {
                ColorBy::Categories
            }
            _ => ColorBy::None,
        }
    }
}

/// Serializable snapshot of what the UI chrome reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotterStatus {
    pub session_id: String,
    pub state: SchedulerState,
    pub mode: ContextMode,
    pub color_by: ColorBy,
    pub point_count: usize,
    pub visible_count: usize,
    pub skipped_records: usize,
    pub selection: Vec<RecordId>,
    pub selection_pending: bool,
    pub deferred_events: usize,
    pub bounds: Option<Bounds>,
    pub loading: bool,
}

/// Event-driven owner of one plot and its rendering engine
pub struct UpdateScheduler {
    id: Uuid,
    config: PlotterConfig,
    unassigned: Color,
    default_palette: Vec<Color>,
    state: SchedulerState,
    engine: EngineSlot,
    events: EngineEventSink,
    deferred: EventQueue,
    session: SessionState,
    selection: SelectionBridge,
    failure: Option<String>,
}

impl UpdateScheduler {
    /// Create a scheduler from a validated configuration
    pub fn new(config: PlotterConfig) -> PlotterResult<Self> {
        config.validate()?;
        let unassigned = config.unassigned_color()?;
        let default_palette = config.default_palette()?;

        Ok(Self {
            id: Uuid::new_v4(),
            config,
            unassigned,
            default_palette,
            state: SchedulerState::Uninitialized,
            engine: EngineSlot::Absent,
            events: EngineEventSink::new(),
            deferred: EventQueue::new(),
            session: SessionState::default(),
            selection: SelectionBridge::new(),
            failure: None,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.id
    }

    // MARK: - Engine lifecycle

    /// Start engine setup.
    ///
    /// The returned request carries the event sink the engine must report
    /// selections through. Finish with [`Self::complete_initialization`].
    pub fn begin_initialization(&mut self, device_pixel_ratio: f64) -> PlotterResult<EngineInitRequest> {
        self.ensure_usable()?;
        if !matches!(self.engine, EngineSlot::Absent) {
            return Err(SchedulerError::AlreadyInitializing.into());
        }

        let mut options = EngineOptions {
            pixel_ratio: device_pixel_ratio.min(self.config.render.max_pixel_ratio),
            ..EngineOptions::default()
        };
        let (buffer, palette) = match self.initial_view() {
            Some((bounds, build)) => {
                options.target = [bounds.center_x, bounds.center_y];
                let distance = bounds.max_extent * self.config.camera.initial_distance_factor;
                if distance > 0.0 {
                    options.distance = distance;
                }
                (build.buffer, build.palette)
            }
            None => (PointBuffer::empty(), self.default_palette.clone()),
        };

        self.engine = EngineSlot::Initializing;
        tracing::info!(
            session = %self.id,
            pixel_ratio = options.pixel_ratio,
            "engine initialization started"
        );

        Ok(EngineInitRequest {
            buffer,
            palette,
            options,
            events: self.events.clone(),
        })
    }

    /// Resume after engine setup finished.
    ///
    /// On success the deferred events are replayed in arrival order. A
    /// failure is terminal: the plotter stays in `InitFailed` and every later
    /// call returns an error.
    pub fn complete_initialization(
        &mut self,
        result: Result<Box<dyn RenderEngine>, EngineError>,
    ) -> PlotterResult<()> {
        if !matches!(self.engine, EngineSlot::Initializing) {
            return Err(SchedulerError::NotInitializing.into());
        }

        match result {
            Err(err) => {
                tracing::error!(session = %self.id, error = %err, "could not set up rendering engine");
                self.engine = EngineSlot::Absent;
                self.failure = Some(err.to_string());
                self.deferred.clear();
                self.transition(SchedulerState::InitFailed);
                Err(PlotterError::EngineInitFailed(err))
            }
            Ok(engine) => {
                self.engine = EngineSlot::Live(engine);
                self.transition(SchedulerState::AwaitingFirstData);
                tracing::info!(
                    session = %self.id,
                    deferred = self.deferred.len(),
                    "engine ready"
                );
                while let Some(event) = self.deferred.pop() {
                    self.dispatch(event);
                }
                Ok(())
            }
        }
    }

    /// Bounds and buffer of the first deferred dataset the replay will accept
    fn initial_view(&self) -> Option<(Bounds, BufferBuild)> {
        let snapshot = self.deferred.iter().find_map(|event| match event {
            SchedulerEvent::DatasetChanged(snapshot) if self.admits(snapshot) => Some(snapshot),
            _ => None,
        })?;
        let bounds = compute_bounds(&snapshot.records, &snapshot.projections)?;
        let filter = resolve_filter(
            self.session.color_by,
            self.session.mode,
            self.session.category_filter.as_ref(),
            self.unassigned,
        );
        Some((bounds, build_point_buffer(snapshot, &filter, self.unassigned)))
    }

    fn admits(&self, snapshot: &DatasetSnapshot) -> bool {
        (snapshot.fully_loaded || !self.config.behavior.require_fully_loaded) && snapshot.has_shape()
    }

    /// Begin and complete initialization with a synchronous engine factory
    pub fn initialize_with<F>(&mut self, device_pixel_ratio: f64, init: F) -> PlotterResult<()>
    where
        F: FnOnce(EngineInitRequest) -> Result<Box<dyn RenderEngine>, EngineError>,
    {
        let request = self.begin_initialization(device_pixel_ratio)?;
        self.complete_initialization(init(request))
    }

    // MARK: - Event intake

    /// Handle one event now, or defer it while the engine is not ready
    pub fn handle(&mut self, event: SchedulerEvent) -> PlotterResult<()> {
        self.ensure_usable()?;
        if !matches!(self.engine, EngineSlot::Live(_)) {
            tracing::debug!(session = %self.id, event = event.kind(), "engine not ready, deferring");
            self.deferred.push(event);
            return Ok(());
        }
        self.dispatch(event);
        Ok(())
    }

    /// Handle every event the engine reported since the last call
    pub fn pump_engine_events(&mut self) -> PlotterResult<usize> {
        let mut handled = 0;
        while let Some(event) = self.events.pop() {
            self.handle(event.into())?;
            handled += 1;
        }
        Ok(handled)
    }

    fn dispatch(&mut self, event: SchedulerEvent) {
        tracing::trace!(session = %self.id, event = event.kind(), state = %self.state, "dispatch");
        match event {
            SchedulerEvent::DatasetChanged(snapshot) => self.on_dataset_changed(snapshot),
            SchedulerEvent::VisibilityChanged(visibility) => self.on_visibility_changed(visibility),
            SchedulerEvent::FilterChanged(color_by) => self.on_filter_changed(color_by),
            SchedulerEvent::CategoryFilterChanged(filter) => self.on_category_filter_changed(filter),
            SchedulerEvent::ModeChanged(mode) => self.on_mode_changed(mode),
            SchedulerEvent::ToolChanged(tool) => self.on_tool_changed(tool),
            SchedulerEvent::Resized { width, height } => self.on_resized(width, height),
            SchedulerEvent::SelectRequested(ids) => self.on_select_requested(ids),
            SchedulerEvent::EngineSelected(points) => self.on_engine_selected(&points),
            SchedulerEvent::EngineDeselected => self.selection.clear(),
        }
    }

    // MARK: - Handlers

    fn on_dataset_changed(&mut self, mut snapshot: DatasetSnapshot) {
        if self.config.behavior.require_fully_loaded && !snapshot.fully_loaded {
            tracing::debug!(session = %self.id, records = snapshot.records.len(), "dataset still loading");
            return;
        }
        if !snapshot.has_shape() {
            tracing::debug!(
                session = %self.id,
                records = snapshot.records.len(),
                projections = snapshot.projections.len(),
                "empty dataset, skipping recompute"
            );
            return;
        }
        let Some(bounds) = compute_bounds(&snapshot.records, &snapshot.projections) else {
            tracing::debug!(session = %self.id, "no record resolves to a projection, skipping recompute");
            return;
        };

        self.begin_recompute();
        self.session.bounds = Some(bounds);

        if !self.session.camera_framed {
            let framing = CameraFraming::from_bounds(&bounds, &self.config.camera);
            if let EngineSlot::Live(engine) = &mut self.engine {
                engine.set(EngineSettings::camera(framing));
            }
            self.session.camera_framed = true;
            tracing::info!(
                session = %self.id,
                center_x = bounds.center_x,
                center_y = bounds.center_y,
                max_extent = bounds.max_extent,
                "camera framed"
            );
        }

        snapshot.sync_visibility();
        self.session.dataset = Some(snapshot);
        self.rebuild_and_publish();
    }

    fn on_visibility_changed(&mut self, visibility: Visibility) {
        let Some(dataset) = self.session.dataset.as_mut() else {
            tracing::debug!(session = %self.id, "no dataset yet, ignoring visibility change");
            return;
        };
        dataset.set_visibility(visibility);

        if self.session.build.is_none() {
            tracing::debug!(session = %self.id, "no buffer built yet, visibility stored");
            return;
        }
        self.rebuild_and_publish();
    }

    fn on_filter_changed(&mut self, color_by: ColorBy) {
        if self.session.color_by == color_by {
            return;
        }
        self.session.color_by = color_by;
        if self.session.build.is_some() {
            self.rebuild_and_publish();
        }
    }

    fn on_category_filter_changed(&mut self, filter: Filter) {
        self.session.category_filter = Some(filter);
        if self.session.effective_color_by() == ColorBy::Categories && self.session.build.is_some() {
            self.rebuild_and_publish();
        }
    }

    fn on_mode_changed(&mut self, mode: ContextMode) {
        if self.session.mode == mode {
            return;
        }
        let coloring_before = self.session.effective_color_by();
        self.session.mode = mode;

        // Selection is wiped on every mode switch.
        if self.config.behavior.clear_selection_on_mode_change {
            self.selection.clear();
            if let EngineSlot::Live(engine) = &mut self.engine {
                engine.select(&[]);
            }
        }
        self.session.camera_framed = false;
        tracing::info!(session = %self.id, ?mode, "context mode changed");

        if self.session.build.is_some() && self.session.effective_color_by() != coloring_before {
            self.rebuild_and_publish();
        }
    }

    fn on_tool_changed(&mut self, tool: Tool) {
        self.session.tool = tool;
        if let EngineSlot::Live(engine) = &mut self.engine {
            engine.set_lasso_override(tool == Tool::Lasso);
        }
    }

    fn on_resized(&mut self, width: u32, height: u32) {
        tracing::debug!(session = %self.id, width, height, "canvas resized");
        if let EngineSlot::Live(engine) = &mut self.engine {
            engine.resize_handler();
        }
    }

    fn on_select_requested(&mut self, ids: Vec<RecordId>) {
        self.selection.request(ids);

        match (&self.session.build, &mut self.engine) {
            (Some(build), EngineSlot::Live(engine)) => {
                if let Some(points) = self.selection.take_pending(&build.index_map) {
                    discard_stale_reports(&self.events, self.id);
                    engine.select(&points);
                }
            }
            _ => tracing::debug!(session = %self.id, "index map not ready, selection request queued"),
        }
    }

    fn on_engine_selected(&mut self, points: &[PointIndex]) {
        let Some(build) = &self.session.build else {
            return;
        };
        match self.selection.on_engine_selected(points, &build.index_map) {
            EngineSelectionOutcome::Applied => tracing::trace!(
                session = %self.id,
                selected = self.selection.selection().len(),
                "engine selection applied"
            ),
            EngineSelectionOutcome::Ignored => tracing::debug!(
                session = %self.id,
                "programmatic selection pending, ignoring engine selection"
            ),
        }
    }

    /// Re-frame the camera on the current bounds
    pub fn reset_camera(&mut self) -> PlotterResult<CameraFraming> {
        self.ensure_usable()?;
        let bounds = self.session.bounds.ok_or(SchedulerError::BoundsUnavailable)?;
        let framing = CameraFraming::from_bounds(&bounds, &self.config.camera);
        if let EngineSlot::Live(engine) = &mut self.engine {
            engine.set(EngineSettings::camera(framing));
            self.session.camera_framed = true;
        }
        Ok(framing)
    }

    // MARK: - Recompute pipeline

    fn begin_recompute(&mut self) {
        if matches!(
            self.state,
            SchedulerState::Ready | SchedulerState::AwaitingFirstData
        ) {
            self.transition(SchedulerState::Recomputing);
        }
    }

    fn rebuild_and_publish(&mut self) {
        if self.session.dataset.is_none() {
            return;
        }
        self.begin_recompute();
        let Some(dataset) = &self.session.dataset else {
            return;
        };

        let filter = resolve_filter(
            self.session.color_by,
            self.session.mode,
            self.session.category_filter.as_ref(),
            self.unassigned,
        );
        let started = Instant::now();
        let build = build_point_buffer(dataset, &filter, self.unassigned);
        tracing::debug!(
            session = %self.id,
            filter = %filter.name,
            points = build.buffer.len(),
            visible = build.buffer.visible_count(),
            skipped = build.skipped,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "point buffer rebuilt"
        );

        self.session.build = Some(build);
        self.publish();
    }

    /// Push palette and buffer to the engine once buffer and bounds exist
    fn publish(&mut self) {
        let published = match (&self.session.build, &self.session.bounds, &mut self.engine) {
            (Some(build), Some(_), EngineSlot::Live(engine)) => {
                engine.set(EngineSettings::palette(build.palette.clone()));
                engine.draw(&build.buffer);

                if let Some(points) = self.selection.take_pending(&build.index_map) {
                    discard_stale_reports(&self.events, self.id);
                    engine.select(&points);
                } else if !self.selection.selection().is_empty() {
                    engine.select(&self.selection.remap(&build.index_map));
                }
                true
            }
            _ => false,
        };

        if published {
            self.transition(SchedulerState::Ready);
        } else if self.state == SchedulerState::Recomputing {
            self.transition(SchedulerState::AwaitingFirstData);
        }
    }

    fn transition(&mut self, next: SchedulerState) {
        if self.state == next {
            return;
        }
        debug_assert!(
            self.state.can_transition_to(&next),
            "invalid transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!(session = %self.id, from = %self.state, to = %next, "state transition");
        self.state = next;
    }

    fn ensure_usable(&self) -> Result<(), SchedulerError> {
        if self.state.is_terminal() {
            return Err(SchedulerError::Terminal {
                reason: self.failure.clone().unwrap_or_default(),
            });
        }
        Ok(())
    }

    // MARK: - State surface

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn config(&self) -> &PlotterConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn selection(&self) -> &SelectionSet {
        self.selection.selection()
    }

    pub fn has_pending_selection(&self) -> bool {
        self.selection.has_pending()
    }

    pub fn color_by(&self) -> ColorBy {
        self.session.color_by
    }

    /// Color-by options for the dropdown in the current mode
    pub fn available_color_by(&self) -> Vec<ColorBy> {
        available_color_by(self.session.mode)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.session.bounds
    }

    pub fn camera_framing(&self) -> Option<CameraFraming> {
        self.session
            .bounds
            .map(|b| CameraFraming::from_bounds(&b, &self.config.camera))
    }

    pub fn current_build(&self) -> Option<&BufferBuild> {
        self.session.build.as_ref()
    }

    /// True until a non-empty dataset has been accepted
    pub fn is_loading(&self) -> bool {
        self.session
            .dataset
            .as_ref()
            .map_or(true, |d| d.records.is_empty())
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Why the engine failed to initialize, if it did
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn status(&self) -> PlotterStatus {
        let build = self.session.build.as_ref();
        PlotterStatus {
            session_id: self.id.to_string(),
            state: self.state,
            mode: self.session.mode,
            color_by: self.session.color_by,
            point_count: build.map_or(0, |b| b.buffer.len()),
            visible_count: build.map_or(0, |b| b.buffer.visible_count()),
            skipped_records: build.map_or(0, |b| b.skipped),
            selection: self.selection.selection().to_vec(),
            selection_pending: self.selection.has_pending(),
            deferred_events: self.deferred.len(),
            bounds: self.session.bounds,
            loading: self.is_loading(),
        }
    }
}

/// Drop engine reports queued before a programmatic selection is forwarded.
/// Only reports raised after the forward may change the selection.
fn discard_stale_reports(events: &EngineEventSink, session: Uuid) {
    let dropped = events.clear();
    if dropped > 0 {
        tracing::debug!(%session, dropped, "discarded engine reports older than selection request");
    }
}
