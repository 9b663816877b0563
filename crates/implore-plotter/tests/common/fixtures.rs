//! Dataset builders and a recording engine for plotter tests

use std::cell::RefCell;
use std::rc::Rc;

use implore_plotter::{
    Color, DatasetSnapshot, EngineEventSink, EngineSettings, FilterOption, PlotterConfig,
    PointBuffer, PointIndex, Projection, Record, RecordStore, RenderEngine, UpdateScheduler,
};

/// One call the plotter made against the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Set(EngineSettings),
    Draw(PointBuffer),
    Select(Vec<PointIndex>),
    Resize,
    LassoOverride(bool),
}

/// Shared log of engine calls
pub type CallLog = Rc<RefCell<Vec<EngineCall>>>;

/// Engine that records every call and, like a real canvas, reports
/// programmatic selections back through the event sink
pub struct RecordingEngine {
    calls: CallLog,
    events: EngineEventSink,
    echo: bool,
}

impl RecordingEngine {
    pub fn new(calls: CallLog, events: EngineEventSink) -> Self {
        Self {
            calls,
            events,
            echo: true,
        }
    }

    /// Records calls but never reports selections back
    pub fn quiet(calls: CallLog, events: EngineEventSink) -> Self {
        Self {
            calls,
            events,
            echo: false,
        }
    }
}

impl RenderEngine for RecordingEngine {
    fn set(&mut self, settings: EngineSettings) {
        self.calls.borrow_mut().push(EngineCall::Set(settings));
    }

    fn draw(&mut self, buffer: &PointBuffer) {
        self.calls.borrow_mut().push(EngineCall::Draw(buffer.clone()));
    }

    fn select(&mut self, points: &[PointIndex]) {
        self.calls.borrow_mut().push(EngineCall::Select(points.to_vec()));
        if !self.echo {
            return;
        }
        if points.is_empty() {
            self.events.emit_deselected();
        } else {
            self.events.emit_selected(points.to_vec());
        }
    }

    fn resize_handler(&mut self) {
        self.calls.borrow_mut().push(EngineCall::Resize);
    }

    fn set_lasso_override(&mut self, enabled: bool) {
        self.calls.borrow_mut().push(EngineCall::LassoOverride(enabled));
    }
}

/// Scheduler with a live recording engine
pub fn live_scheduler() -> (UpdateScheduler, CallLog) {
    let calls: CallLog = Rc::default();
    let mut scheduler = UpdateScheduler::new(PlotterConfig::default()).unwrap();
    let log = calls.clone();
    scheduler
        .initialize_with(1.0, move |request| {
            Ok(Box::new(RecordingEngine::new(log, request.events)) as Box<dyn RenderEngine>)
        })
        .unwrap();
    (scheduler, calls)
}

/// Scheduler with a live engine that does not echo selections, plus the
/// sink the engine reports through
#[allow(dead_code)]
pub fn quiet_scheduler() -> (UpdateScheduler, CallLog, EngineEventSink) {
    let calls: CallLog = Rc::default();
    let sink = Rc::new(RefCell::new(None));
    let mut scheduler = UpdateScheduler::new(PlotterConfig::default()).unwrap();
    let (log, slot) = (calls.clone(), sink.clone());
    scheduler
        .initialize_with(1.0, move |request| {
            *slot.borrow_mut() = Some(request.events.clone());
            Ok(Box::new(RecordingEngine::quiet(log, request.events)) as Box<dyn RenderEngine>)
        })
        .unwrap();
    let events = sink.borrow_mut().take().unwrap();
    (scheduler, calls, events)
}

/// Records 1..=n, each with its own projection on a diagonal
pub fn diagonal_dataset(n: i64) -> DatasetSnapshot {
    let records: RecordStore = (1..=n).map(|id| Record::new(id, id * 10)).collect();
    let projections = (1..=n).map(|id| Projection::new(id * 10, id as f64, id as f64));
    DatasetSnapshot::new(records, projections)
}

/// Three records forming the (0,0) (2,0) (1,2) triangle
pub fn triangle_dataset() -> DatasetSnapshot {
    let records: RecordStore = [
        Record::new(5, 50).with_annotation(1, 1),
        Record::new(7, 70).with_annotation(2, 2),
        Record::new(9, 90).with_annotation(3, 1),
    ]
    .into_iter()
    .collect();
    DatasetSnapshot::new(
        records,
        [
            Projection::new(50, 0.0, 0.0),
            Projection::new(70, 2.0, 0.0),
            Projection::new(90, 1.0, 2.0),
        ],
    )
}

pub fn hex(value: &str) -> Color {
    Color::from_hex(value).unwrap()
}

/// Red/green category options for ids 1 and 2
pub fn two_categories() -> Vec<FilterOption> {
    vec![
        FilterOption::new(1, hex("#cc0000")),
        FilterOption::new(2, hex("#00cc00")),
    ]
}

/// Last buffer handed to the engine
pub fn last_draw(calls: &CallLog) -> Option<PointBuffer> {
    calls.borrow().iter().rev().find_map(|call| match call {
        EngineCall::Draw(buffer) => Some(buffer.clone()),
        _ => None,
    })
}

/// Last selection handed to the engine
#[allow(dead_code)]
pub fn last_select(calls: &CallLog) -> Option<Vec<PointIndex>> {
    calls.borrow().iter().rev().find_map(|call| match call {
        EngineCall::Select(points) => Some(points.clone()),
        _ => None,
    })
}

#[allow(dead_code)]
pub fn count_draws(calls: &CallLog) -> usize {
    calls
        .borrow()
        .iter()
        .filter(|call| matches!(call, EngineCall::Draw(_)))
        .count()
}
