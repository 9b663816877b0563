//! Update scheduler integration tests
//!
//! Drive a scheduler with a recording engine and check what reaches the
//! engine after each kind of change.

mod common;

use common::fixtures::{
    count_draws, diagonal_dataset, last_draw, last_select, live_scheduler, quiet_scheduler,
    triangle_dataset, two_categories, EngineCall, RecordingEngine,
};
use implore_plotter::{
    ColorBy, ContextMode, DatasetSnapshot, EngineError, EngineSettings, Filter, PlotterConfig,
    PlotterError, Projection, RecordId, RecordStore, RenderEngine, SchedulerError, SchedulerEvent,
    SchedulerState, Tool, UpdateScheduler, Visibility,
};
use std::cell::RefCell;
use std::rc::Rc;

fn ids(raw: &[i64]) -> Vec<RecordId> {
    raw.iter().copied().map(RecordId).collect()
}

// === Engine lifecycle ===

#[test]
fn test_events_before_engine_ready_are_replayed_in_order() {
    let mut scheduler = UpdateScheduler::new(PlotterConfig::default()).unwrap();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::VisibilityChanged(Visibility::only([5, 9])))
        .unwrap();
    assert_eq!(scheduler.deferred_len(), 2);
    assert_eq!(scheduler.state(), SchedulerState::Uninitialized);

    let request = scheduler.begin_initialization(1.0).unwrap();
    assert_eq!(request.options.target, [1.0, 1.0]);
    assert!((request.options.distance - 1.2).abs() < 1e-9);
    assert_eq!(request.buffer.len(), 3);
    assert_eq!(request.buffer.visible_count(), 3);

    let calls = Rc::new(RefCell::new(Vec::new()));
    let engine = RecordingEngine::new(calls.clone(), request.events);
    scheduler
        .complete_initialization(Ok(Box::new(engine)))
        .unwrap();

    assert_eq!(scheduler.deferred_len(), 0);
    assert_eq!(scheduler.state(), SchedulerState::Ready);
    let buffer = last_draw(&calls).unwrap();
    assert_eq!(buffer.len(), 3);
    assert_eq!(buffer.visible_count(), 2);
}

#[test]
fn test_init_failure_is_terminal() {
    let mut scheduler = UpdateScheduler::new(PlotterConfig::default()).unwrap();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();

    let result = scheduler.initialize_with(1.0, |_| {
        Err(EngineError::Setup {
            message: "webgl unavailable".to_string(),
        })
    });
    assert!(matches!(result, Err(PlotterError::EngineInitFailed(_))));
    assert_eq!(scheduler.state(), SchedulerState::InitFailed);
    assert_eq!(scheduler.deferred_len(), 0);
    assert!(scheduler.failure_reason().unwrap().contains("webgl unavailable"));

    let later = scheduler.handle(SchedulerEvent::Resized {
        width: 10,
        height: 10,
    });
    assert!(matches!(
        later,
        Err(PlotterError::Scheduler(SchedulerError::Terminal { .. }))
    ));
    assert!(scheduler.begin_initialization(1.0).is_err());
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = PlotterConfig::default();
    config.render.unassigned_color = "not-a-color".to_string();
    assert!(matches!(
        UpdateScheduler::new(config),
        Err(PlotterError::Config(_))
    ));
}

// === Dataset gating ===

#[test]
fn test_empty_dataset_is_skipped() {
    let (mut scheduler, calls) = live_scheduler();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(DatasetSnapshot::new(
            RecordStore::new(),
            Vec::<Projection>::new(),
        )))
        .unwrap();

    assert_eq!(count_draws(&calls), 0);
    assert_eq!(scheduler.state(), SchedulerState::AwaitingFirstData);
    assert!(scheduler.bounds().is_none());
    assert!(scheduler.is_loading());
}

#[test]
fn test_partially_loaded_dataset_waits() {
    let (mut scheduler, calls) = live_scheduler();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset().loading()))
        .unwrap();
    assert_eq!(count_draws(&calls), 0);

    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();
    assert_eq!(count_draws(&calls), 1);
    assert!(!scheduler.is_loading());
}

#[test]
fn test_first_dataset_frames_camera() {
    let (mut scheduler, calls) = live_scheduler();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();

    let framing = calls
        .borrow()
        .iter()
        .find_map(|call| match call {
            EngineCall::Set(EngineSettings {
                camera: Some(framing),
                ..
            }) => Some(*framing),
            _ => None,
        })
        .unwrap();
    assert_eq!(framing.target(), [1.0, 1.0]);
    assert!((framing.distance - 4.2).abs() < 1e-9);
    assert!((framing.min_distance - 0.07).abs() < 1e-9);
    assert!((framing.max_distance - 11.2).abs() < 1e-9);
    assert_eq!(scheduler.camera_framing(), Some(framing));
}

#[test]
fn test_reset_camera_needs_bounds() {
    let (mut scheduler, calls) = live_scheduler();
    assert!(matches!(
        scheduler.reset_camera(),
        Err(PlotterError::Scheduler(SchedulerError::BoundsUnavailable))
    ));

    scheduler
        .handle(SchedulerEvent::DatasetChanged(diagonal_dataset(4)))
        .unwrap();
    let before = calls.borrow().len();
    let framing = scheduler.reset_camera().unwrap();
    assert_eq!(framing.target(), [2.5, 2.5]);
    assert_eq!(calls.borrow().len(), before + 1);
}

// === Visibility and coloring ===

#[test]
fn test_visibility_hides_but_keeps_index() {
    let (mut scheduler, calls) = live_scheduler();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::VisibilityChanged(Visibility::only([5, 9])))
        .unwrap();

    let buffer = last_draw(&calls).unwrap();
    assert_eq!(buffer.len(), 3);
    let hidden = buffer.get(2).unwrap();
    assert_eq!(hidden.record_id, RecordId(7));
    assert!(!hidden.visible);
    assert_eq!(count_draws(&calls), 2);
}

#[test]
fn test_visibility_before_build_does_not_draw() {
    let (mut scheduler, calls) = live_scheduler();
    scheduler
        .handle(SchedulerEvent::VisibilityChanged(Visibility::only([5])))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::FilterChanged(ColorBy::Categories))
        .unwrap();
    assert_eq!(count_draws(&calls), 0);
}

#[test]
fn test_category_coloring_in_object_mode() {
    let (mut scheduler, calls) = live_scheduler();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::ModeChanged(ContextMode::Object))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::CategoryFilterChanged(Filter::categories(
            two_categories(),
        )))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::FilterChanged(ColorBy::Categories))
        .unwrap();

    let buffer = last_draw(&calls).unwrap();
    let colors: Vec<_> = buffer.points().iter().map(|p| p.color_index).collect();
    assert_eq!(colors, vec![0, 1, 0]);
    assert_eq!(
        scheduler.current_build().map(|b| b.palette.len()),
        Some(3)
    );
    assert_eq!(scheduler.session().effective_color_by(), ColorBy::Categories);
}

#[test]
fn test_categories_fall_back_outside_object_mode() {
    let (mut scheduler, calls) = live_scheduler();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::CategoryFilterChanged(Filter::categories(
            two_categories(),
        )))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::FilterChanged(ColorBy::Categories))
        .unwrap();

    assert!(scheduler.available_color_by().is_empty());
    assert_eq!(scheduler.color_by(), ColorBy::Categories);
    assert_eq!(scheduler.session().effective_color_by(), ColorBy::None);
    let buffer = last_draw(&calls).unwrap();
    assert!(buffer.points().iter().all(|p| p.color_index == 0));
}

#[test]
fn test_category_filter_outside_object_mode_does_not_redraw() {
    let (mut scheduler, calls) = live_scheduler();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::FilterChanged(ColorBy::Categories))
        .unwrap();
    let draws = count_draws(&calls);

    scheduler
        .handle(SchedulerEvent::CategoryFilterChanged(Filter::categories(
            two_categories(),
        )))
        .unwrap();
    assert_eq!(count_draws(&calls), draws);

    scheduler
        .handle(SchedulerEvent::ModeChanged(ContextMode::Object))
        .unwrap();
    assert_eq!(count_draws(&calls), draws + 1);
    let colors: Vec<_> = last_draw(&calls)
        .unwrap()
        .points()
        .iter()
        .map(|p| p.color_index)
        .collect();
    assert_eq!(colors, vec![0, 1, 0]);
}

// === Selection ===

#[test]
fn test_programmatic_selection_round_trip() {
    let (mut scheduler, calls) = live_scheduler();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::SelectRequested(ids(&[5, 9])))
        .unwrap();

    assert_eq!(last_select(&calls), Some(vec![1, 3]));
    assert_eq!(scheduler.pump_engine_events().unwrap(), 1);
    assert_eq!(scheduler.selection().to_vec(), ids(&[5, 9]));
    assert!(!scheduler.has_pending_selection());
}

#[test]
fn test_selection_request_waits_for_index_map() {
    let (mut scheduler, calls) = live_scheduler();
    scheduler
        .handle(SchedulerEvent::SelectRequested(ids(&[7])))
        .unwrap();
    assert!(scheduler.has_pending_selection());
    assert_eq!(last_select(&calls), None);

    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();
    assert_eq!(last_select(&calls), Some(vec![2]));
    scheduler.pump_engine_events().unwrap();
    assert_eq!(scheduler.selection().to_vec(), ids(&[7]));
}

#[test]
fn test_queued_lasso_does_not_override_request() {
    let (mut scheduler, calls, sink) = quiet_scheduler();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();

    sink.emit_selected(vec![2]);
    scheduler
        .handle(SchedulerEvent::SelectRequested(ids(&[5, 9])))
        .unwrap();
    assert_eq!(last_select(&calls), Some(vec![1, 3]));

    assert_eq!(scheduler.pump_engine_events().unwrap(), 0);
    assert_eq!(scheduler.selection().to_vec(), ids(&[5, 9]));
}

#[test]
fn test_queued_lasso_does_not_override_deferred_request() {
    let (mut scheduler, calls, sink) = quiet_scheduler();
    scheduler
        .handle(SchedulerEvent::SelectRequested(ids(&[7])))
        .unwrap();
    sink.emit_selected(vec![1]);

    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();
    assert_eq!(last_select(&calls), Some(vec![2]));
    scheduler.pump_engine_events().unwrap();
    assert_eq!(scheduler.selection().to_vec(), ids(&[7]));
}

#[test]
fn test_lasso_after_request_still_applies() {
    let (mut scheduler, _calls, sink) = quiet_scheduler();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::SelectRequested(ids(&[5])))
        .unwrap();

    sink.emit_selected(vec![2, 3]);
    assert_eq!(scheduler.pump_engine_events().unwrap(), 1);
    assert_eq!(scheduler.selection().to_vec(), ids(&[7, 9]));
}

#[test]
fn test_interactive_selection_and_deselect() {
    let (mut scheduler, _calls) = live_scheduler();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();

    scheduler
        .handle(SchedulerEvent::EngineSelected(vec![2, 3]))
        .unwrap();
    assert_eq!(scheduler.selection().to_vec(), ids(&[7, 9]));

    scheduler.handle(SchedulerEvent::EngineDeselected).unwrap();
    assert!(scheduler.selection().is_empty());
}

#[test]
fn test_empty_request_clears_selection() {
    let (mut scheduler, calls) = live_scheduler();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::SelectRequested(ids(&[5])))
        .unwrap();
    scheduler.pump_engine_events().unwrap();

    scheduler
        .handle(SchedulerEvent::SelectRequested(Vec::new()))
        .unwrap();
    assert_eq!(last_select(&calls), Some(Vec::new()));
    scheduler.pump_engine_events().unwrap();
    assert!(scheduler.selection().is_empty());
}

#[test]
fn test_selection_survives_rebuild() {
    let (mut scheduler, calls) = live_scheduler();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::EngineSelected(vec![3]))
        .unwrap();

    scheduler
        .handle(SchedulerEvent::VisibilityChanged(Visibility::only([9])))
        .unwrap();
    assert_eq!(last_select(&calls), Some(vec![3]));
    assert_eq!(scheduler.selection().to_vec(), ids(&[9]));
}

#[test]
fn test_mode_change_clears_selection() {
    let (mut scheduler, calls) = live_scheduler();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::SelectRequested(ids(&[5, 9])))
        .unwrap();
    scheduler.pump_engine_events().unwrap();
    assert_eq!(scheduler.selection().len(), 2);

    scheduler
        .handle(SchedulerEvent::ModeChanged(ContextMode::Object))
        .unwrap();
    assert!(scheduler.selection().is_empty());
    assert_eq!(last_select(&calls), Some(Vec::new()));

    scheduler.pump_engine_events().unwrap();
    assert!(scheduler.selection().is_empty());
}

#[test]
fn test_mode_change_can_keep_selection() {
    let mut config = PlotterConfig::default();
    config.behavior.clear_selection_on_mode_change = false;
    let mut scheduler = UpdateScheduler::new(config).unwrap();
    scheduler
        .initialize_with(1.0, |request| {
            let engine = RecordingEngine::new(Rc::default(), request.events);
            Ok(Box::new(engine) as Box<dyn RenderEngine>)
        })
        .unwrap();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(triangle_dataset()))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::EngineSelected(vec![1]))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::ModeChanged(ContextMode::Object))
        .unwrap();
    assert_eq!(scheduler.selection().to_vec(), ids(&[5]));
}

// === Engine passthrough ===

#[test]
fn test_tool_and_resize_reach_engine() {
    let (mut scheduler, calls) = live_scheduler();
    scheduler
        .handle(SchedulerEvent::ToolChanged(Tool::Lasso))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::Resized {
            width: 800,
            height: 600,
        })
        .unwrap();
    scheduler
        .handle(SchedulerEvent::ToolChanged(Tool::Cursor))
        .unwrap();

    assert_eq!(
        *calls.borrow(),
        vec![
            EngineCall::LassoOverride(true),
            EngineCall::Resize,
            EngineCall::LassoOverride(false),
        ]
    );
}

#[test]
fn test_status_reflects_session() {
    let (mut scheduler, _calls) = live_scheduler();
    scheduler
        .handle(SchedulerEvent::DatasetChanged(diagonal_dataset(5)))
        .unwrap();
    scheduler
        .handle(SchedulerEvent::VisibilityChanged(Visibility::only([1, 2])))
        .unwrap();

    let status = scheduler.status();
    assert_eq!(status.state, SchedulerState::Ready);
    assert_eq!(status.point_count, 5);
    assert_eq!(status.visible_count, 2);
    assert_eq!(status.skipped_records, 0);
    assert_eq!(status.session_id, scheduler.session_id().to_string());

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["point_count"], 5);
    assert_eq!(json["mode"], "Datapoint");
}
