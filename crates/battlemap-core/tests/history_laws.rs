//! Undo and redo laws of the action log.

use battlemap_core::scene::rebuild;
use battlemap_core::shapes::SerializableColor;
use battlemap_core::{Action, ActionLog, Layer, StrokeMode};
use kurbo::Point;

fn stroke(i: usize) -> Action {
    Action::stroke(
        StrokeMode::Draw,
        vec![Point::new(i as f64, 0.0), Point::new(i as f64, 10.0)],
        SerializableColor::black(),
        5.0,
    )
}

fn log_of(n: usize) -> ActionLog {
    let mut log = ActionLog::new();
    for i in 0..n {
        log.record(stroke(i));
    }
    log
}

fn visible(log: &ActionLog) -> Layer {
    let mut layer = Layer::new();
    rebuild(&mut layer, log);
    layer
}

#[test]
fn undo_then_redo_restores_every_cursor() {
    let n = 5;
    for steps_back in 0..n {
        let mut log = log_of(n);
        for _ in 0..steps_back {
            log.undo();
        }
        let before = visible(&log);
        let cursor = log.cursor();

        assert!(log.undo());
        assert!(log.redo());
        assert_eq!(log.cursor(), cursor);
        assert_eq!(visible(&log).nodes(), before.nodes());
    }
}

#[test]
fn recording_after_undo_truncates() {
    let n = 6;
    for c in 0..n - 1 {
        let mut log = log_of(n);
        while log.cursor() != Some(c) {
            log.undo();
        }
        let action = stroke(99);
        let id = action.node_id();
        log.record(action);

        assert_eq!(log.len(), c + 2);
        assert_eq!(log.actions().last().map(Action::node_id), Some(id));
        assert!(!log.can_redo());
    }
}

#[test]
fn boundaries_are_no_ops() {
    let mut empty = ActionLog::new();
    assert!(!empty.undo());
    assert_eq!(empty.cursor(), None);
    assert!(!empty.redo());

    let mut log = log_of(3);
    assert!(!log.redo());
    assert_eq!(log.cursor(), Some(2));

    while log.undo() {}
    assert_eq!(log.cursor(), None);
    assert!(!log.undo());
    assert_eq!(log.cursor(), None);
}

#[test]
fn rebuild_twice_is_identical() {
    let mut log = log_of(4);
    log.undo();
    let mut layer = Layer::new();
    rebuild(&mut layer, &log);
    let first = layer.nodes().to_vec();
    rebuild(&mut layer, &log);
    assert_eq!(layer.nodes(), first.as_slice());
}
