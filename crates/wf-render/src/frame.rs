//! Per-frame view of the graph handed to the rendering surface.
//!
//! The renderer never reads the graph directly; it consumes a `RenderFrame`
//! with anchors and curve descriptors already resolved.

use serde::Serialize;
use wf_core::*;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateView {
    pub id: StateId,
    pub label: String,
    pub bounds: Bounds,
    /// Top, bottom, left, right.
    pub anchors: [Anchor; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionView {
    pub id: TransitionId,
    pub from: StateId,
    pub to: StateId,
    pub label: Option<String>,
    pub gates: Vec<String>,
    pub waypoints: Vec<Point>,
    pub start: Anchor,
    pub end: Anchor,
    pub path: PathSpec,
}

/// The in-progress transition being drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GesturePreview {
    pub from: StateId,
    pub path: PathSpec,
    /// Set when the free end has snapped to another state's anchor.
    pub snapped_to: Option<StateId>,
}

impl GesturePreview {
    /// Unsnapped previews are drawn dashed.
    pub fn dashed(&self) -> bool {
        self.snapped_to.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id")]
pub enum Highlight {
    State(StateId),
    Transition(TransitionId),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RenderFrame {
    pub states: Vec<StateView>,
    pub transitions: Vec<TransitionView>,
    pub preview: Option<GesturePreview>,
    pub highlight: Option<Highlight>,
}

/// Resolve the whole graph into a frame.
pub fn build_frame(
    graph: &WorkflowGraph,
    dims: &DimensionCache,
    geometry: &GeometryConfig,
    preview: Option<GesturePreview>,
) -> RenderFrame {
    let states = graph
        .states()
        .map(|s| {
            let a = anchors_cached(s, dims);
            StateView {
                id: s.id,
                label: s.label.clone(),
                bounds: Bounds::centered(s.position, dims.get(s.id)),
                anchors: [a.top, a.bottom, a.left, a.right],
            }
        })
        .collect();

    let transitions = graph
        .transitions()
        .filter_map(|t| {
            let routed = route_in_graph(graph, t, dims, geometry)?;
            Some(TransitionView {
                id: t.id,
                from: t.from,
                to: t.to,
                label: t.label.clone(),
                gates: t.gates.iter().map(|g| g.label.clone()).collect(),
                waypoints: t.waypoints.to_vec(),
                start: routed.start,
                end: routed.end,
                path: routed.path,
            })
        })
        .collect();

    RenderFrame {
        states,
        transitions,
        preview,
        highlight: None,
    }
}
