//! Integration tests: undo/redo through a session, with store mirroring.

use pretty_assertions::assert_eq;
use wf_core::*;
use wf_editor::*;

fn open() -> (EditorSession, MemoryStore) {
    let snapshot = GraphSnapshot::from_json(include_str!("fixtures/change_control.json")).unwrap();
    let store = MemoryStore::with_workflow("eco-7", snapshot);
    let session = EditorSession::open(
        "eco-7",
        EditorConfig::default(),
        Box::new(store.clone()),
        Box::new(RecordingNotifier::default()),
    )
    .unwrap();
    (session, store)
}

#[test]
fn undo_restores_cascade_delete() {
    let (mut s, store) = open();
    let before = s.snapshot();
    s.set_admin(true);
    s.handle_event(&InputEvent::ContextMenu { x: 300.0, y: 10.0 });
    s.dispatch_menu_action(MenuAction::DeleteState);
    assert_eq!(s.graph().transition_count(), 1);

    assert_eq!(s.undo().as_deref(), Some("Delete state"));
    assert_eq!(s.snapshot(), before);

    // Undo re-saves what came back, gates with their original order.
    assert!(store.state(StateId::intern("review")).is_some());
    assert_eq!(store.transition_count(), 3);
    assert_eq!(store.gate(GateId::intern("checker_signoff")).map(|g| g.position), Some(0));
    assert_eq!(store.gate(GateId::intern("qa_signoff")).map(|g| g.position), Some(1));

    assert_eq!(s.redo().as_deref(), Some("Delete state"));
    assert!(!s.graph().contains_state(StateId::intern("review")));
    assert!(store.state(StateId::intern("review")).is_none());
    assert_eq!(store.gate_count(), 0);
}

#[test]
fn keyboard_undo_and_redo() {
    let (mut s, _) = open();
    s.commit(GraphMutation::AddState {
        position: Point::new(0.0, 300.0),
    })
    .unwrap();
    assert_eq!(s.graph().state_count(), 5);

    let ctrl = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };
    s.handle_event(&InputEvent::Key {
        key: "z".into(),
        modifiers: ctrl,
    });
    assert_eq!(s.graph().state_count(), 4);

    s.handle_event(&InputEvent::Key {
        key: "Z".into(),
        modifiers: Modifiers { shift: true, ..ctrl },
    });
    assert_eq!(s.graph().state_count(), 5);
}

#[test]
fn undo_is_ignored_mid_drag() {
    let (mut s, _) = open();
    s.commit(GraphMutation::AddState {
        position: Point::new(0.0, 300.0),
    })
    .unwrap();
    s.handle_event(&InputEvent::pointer_down(900.0, 10.0));
    s.handle_event(&InputEvent::pointer_move(920.0, 10.0));
    assert_eq!(s.undo(), None);
    assert_eq!(s.graph().state_count(), 5);

    s.handle_event(&InputEvent::pointer_up(920.0, 10.0));
    assert_eq!(s.undo().as_deref(), Some("Move state"));
    assert_eq!(s.undo().as_deref(), Some("Add state"));
    assert!(!s.can_undo());
}

#[test]
fn undo_prunes_selection() {
    let (mut s, _) = open();
    s.handle_event(&InputEvent::pointer_down(600.0, 30.0));
    s.handle_event(&InputEvent::pointer_move(900.0, -5.0));
    s.handle_event(&InputEvent::pointer_up(900.0, -5.0));
    assert!(matches!(s.selection(), Selection::Transition(_)));

    assert_eq!(s.undo().as_deref(), Some("Add transition"));
    assert_eq!(s.selection(), Selection::None);
    assert_eq!(s.frame().highlight, None);
}

#[test]
fn waypoint_edits_round_trip_through_history() {
    let (mut s, store) = open();
    let submit = TransitionId::intern("submit");
    s.handle_event(&InputEvent::DoubleClick { x: 150.0, y: 15.0 });
    assert_eq!(store.transition(submit).map(|t| t.waypoints.len()), Some(1));

    s.undo();
    assert!(s.graph().transition(submit).unwrap().waypoints.is_empty());
    assert_eq!(store.transition(submit).map(|t| t.waypoints.len()), Some(0));
}
