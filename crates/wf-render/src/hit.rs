//! Hit testing: point → canvas target lookup.
//!
//! States are walked back-to-front (last inserted paints on top). Handles
//! win over bodies, and bodies win over transition paths, so a handle that
//! overlaps a curve stays grabbable.

use crate::path::distance_to;
use serde::{Deserialize, Serialize};
use wf_core::*;

/// What lies under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Canvas,
    State(StateId),
    AnchorHandle { state: StateId, side: AnchorSide },
    Transition(TransitionId),
    Waypoint { transition: TransitionId, index: usize },
}

/// Pick radii for handles and curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitConfig {
    pub handle_radius: f32,
    pub transition_tolerance: f32,
}

impl Default for HitConfig {
    fn default() -> Self {
        Self {
            handle_radius: 6.0,
            transition_tolerance: 6.0,
        }
    }
}

/// Find the topmost target at `p`.
pub fn hit_test(
    graph: &WorkflowGraph,
    dims: &DimensionCache,
    geometry: &GeometryConfig,
    config: &HitConfig,
    p: Point,
) -> HitTarget {
    if let Some((transition, index)) = waypoint_at(graph, config, p) {
        return HitTarget::Waypoint { transition, index };
    }
    if let Some((state, side)) = anchor_handle_at(graph, dims, config, p) {
        return HitTarget::AnchorHandle { state, side };
    }
    if let Some(state) = state_at(graph, dims, p) {
        return HitTarget::State(state);
    }
    if let Some(transition) = transition_at(graph, dims, geometry, config, p) {
        return HitTarget::Transition(transition);
    }
    HitTarget::Canvas
}

/// Topmost state whose body contains `p`.
pub fn state_at(graph: &WorkflowGraph, dims: &DimensionCache, p: Point) -> Option<StateId> {
    let states: Vec<&WorkflowState> = graph.states().collect();
    states
        .into_iter()
        .rev()
        .find(|s| Bounds::centered(s.position, dims.get(s.id)).contains(p))
        .map(|s| s.id)
}

fn anchor_handle_at(
    graph: &WorkflowGraph,
    dims: &DimensionCache,
    config: &HitConfig,
    p: Point,
) -> Option<(StateId, AnchorSide)> {
    let states: Vec<&WorkflowState> = graph.states().collect();
    for s in states.into_iter().rev() {
        let anchors = anchors_cached(s, dims);
        if let Some(a) = anchors.iter().find(|a| a.point.distance(p) <= config.handle_radius) {
            return Some((s.id, a.side));
        }
    }
    None
}

fn waypoint_at(graph: &WorkflowGraph, config: &HitConfig, p: Point) -> Option<(TransitionId, usize)> {
    let transitions: Vec<&WorkflowTransition> = graph.transitions().collect();
    for t in transitions.into_iter().rev() {
        if let Some(i) = t
            .waypoints
            .iter()
            .position(|w| w.distance(p) <= config.handle_radius)
        {
            return Some((t.id, i));
        }
    }
    None
}

fn transition_at(
    graph: &WorkflowGraph,
    dims: &DimensionCache,
    geometry: &GeometryConfig,
    config: &HitConfig,
    p: Point,
) -> Option<TransitionId> {
    let mut best: Option<(f32, TransitionId)> = None;
    for t in graph.transitions() {
        let Some(routed) = route_in_graph(graph, t, dims, geometry) else {
            continue;
        };
        let d = distance_to(&routed.path, p);
        if d <= config.transition_tolerance && best.is_none_or(|(bd, _)| d < bd) {
            best = Some((d, t.id));
        }
    }
    if let Some((d, id)) = best {
        log::trace!("HIT transition {id} at distance {d:.2}");
    }
    best.map(|(_, id)| id)
}
