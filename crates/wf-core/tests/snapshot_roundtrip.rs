//! Integration tests: load/save of graph snapshots (JSON and MessagePack).

use pretty_assertions::assert_eq;
use wf_core::*;

fn change_control_graph() -> WorkflowGraph {
    let mut g = WorkflowGraph::new();
    let draft = g.add_state(Point::new(0.0, 0.0)).id;
    let review = g.add_state(Point::new(240.0, 0.0)).id;
    let approved = g.add_state(Point::new(480.0, 0.0)).id;
    let released = g.add_state(Point::new(720.0, 0.0)).id;
    for (id, label) in [
        (draft, "Draft"),
        (review, "Review"),
        (approved, "Approved"),
        (released, "Released"),
    ] {
        g.rename_state(id, label).unwrap();
    }

    let submit = g.add_transition(draft, review).unwrap().id;
    let approve = g.add_transition(review, approved).unwrap().id;
    let reject = g.add_transition(review, draft).unwrap().id;
    g.add_transition(approved, released).unwrap();
    g.rename_transition(reject, Some("Reject".into())).unwrap();

    g.add_gate(submit, "All files checked in").unwrap();
    let reviewer = g.add_gate(approve, "Reviewer approved").unwrap().id;
    g.add_gate(approve, "Checker approved").unwrap();
    g.add_gate(approve, "ECO number assigned").unwrap();
    g.move_gate(reviewer, 2).unwrap();

    g.add_waypoint(reject, Point::new(240.0, 120.0), None).unwrap();
    g.add_waypoint(reject, Point::new(0.0, 120.0), None).unwrap();
    g
}

fn gate_labels(g: &WorkflowGraph) -> Vec<Vec<String>> {
    g.transitions()
        .map(|t| t.gates.iter().map(|x| x.label.clone()).collect())
        .collect()
}

#[test]
fn json_roundtrip_preserves_graph_and_gate_order() {
    let graph = change_control_graph();
    let json = graph.to_snapshot().to_json().unwrap();
    let back = WorkflowGraph::from_snapshot(GraphSnapshot::from_json(&json).unwrap()).unwrap();

    assert_eq!(back.to_snapshot(), graph.to_snapshot());
    assert_eq!(
        gate_labels(&back)[1],
        vec!["Checker approved", "ECO number assigned", "Reviewer approved"]
    );
}

#[test]
fn msgpack_roundtrip_preserves_graph() {
    let graph = change_control_graph();
    let bytes = graph.to_snapshot().to_msgpack().unwrap();
    let back = WorkflowGraph::from_snapshot(GraphSnapshot::from_msgpack(&bytes).unwrap()).unwrap();
    assert_eq!(back.to_snapshot(), graph.to_snapshot());
    assert_eq!(gate_labels(&back), gate_labels(&graph));
}

#[test]
fn repeated_roundtrips_are_stable() {
    let mut snapshot = change_control_graph().to_snapshot();
    for _ in 0..3 {
        let json = snapshot.to_json().unwrap();
        let next = WorkflowGraph::from_snapshot(GraphSnapshot::from_json(&json).unwrap())
            .unwrap()
            .to_snapshot();
        assert_eq!(next, snapshot);
        snapshot = next;
    }
}
