//! Workflow graph data model.
//!
//! States are nodes and transitions are directed edges of a
//! `StableDiGraph`, which keeps indices stable across deletions and allows
//! parallel edges and self-loops. Entities reference each other by id only;
//! id → index maps give O(1) lookup and remember insertion order, which is
//! also paint order. Gates live inside their parent transition so their
//! order is the vector order.
//!
//! Every mutation validates before it touches anything, so a failed call
//! leaves the graph exactly as it was.

use crate::error::{EntityKind, GraphError, GraphResult};
use crate::id::{GateId, StateId, TransitionId};
use indexmap::IndexMap;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Adjacent waypoints closer than this collapse into one.
pub const WAYPOINT_EPSILON: f32 = 1.0;

/// Label given to states created from the canvas.
pub const DEFAULT_STATE_LABEL: &str = "New State";

// ─── Geometry primitives ─────────────────────────────────────────────────

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// True when both points lie within `epsilon` of each other.
    pub fn approx_eq(&self, other: Point, epsilon: f32) -> bool {
        self.distance(other) <= epsilon
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Point::new(x, y)
    }
}

/// Rendered size of a state's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

impl Dimensions {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::new(160.0, 60.0)
    }
}

/// Axis-aligned bounds of a state, derived from its center and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn centered(center: Point, dims: Dimensions) -> Self {
        Self {
            x: center.x - dims.width / 2.0,
            y: center.y - dims.height / 2.0,
            width: dims.width,
            height: dims.height,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Measured state sizes reported by the renderer after paint.
///
/// Lookups fall back to a default size for states that were never measured.
#[derive(Debug, Clone, Default)]
pub struct DimensionCache {
    measured: HashMap<StateId, Dimensions>,
    fallback: Dimensions,
}

impl DimensionCache {
    pub fn new(fallback: Dimensions) -> Self {
        Self {
            measured: HashMap::new(),
            fallback,
        }
    }

    /// Record a measurement. Returns true if the cached size changed.
    pub fn report(&mut self, id: StateId, dims: Dimensions) -> bool {
        self.measured.insert(id, dims) != Some(dims)
    }

    pub fn measured(&self, id: StateId) -> Option<Dimensions> {
        self.measured.get(&id).copied()
    }

    pub fn get(&self, id: StateId) -> Dimensions {
        self.measured(id).unwrap_or(self.fallback)
    }

    pub fn forget(&mut self, id: StateId) {
        self.measured.remove(&id);
    }

    pub fn fallback(&self) -> Dimensions {
        self.fallback
    }
}

// ─── Entities ────────────────────────────────────────────────────────────

/// A lifecycle stage (node). `position` is the center of its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub id: StateId,
    pub label: String,
    pub position: Point,
}

impl WorkflowState {
    pub fn new(id: StateId, label: impl Into<String>, position: Point) -> Self {
        Self {
            id,
            label: label.into(),
            position,
        }
    }
}

/// A named condition on a transition. Stored and ordered, never evaluated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGate {
    pub id: GateId,
    pub transition_id: TransitionId,
    pub label: String,
}

/// A directed edge between two states.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowTransition {
    pub id: TransitionId,
    pub from: StateId,
    pub to: StateId,
    pub label: Option<String>,
    /// Intermediate routing points in rendering order.
    pub waypoints: SmallVec<[Point; 4]>,
    /// Gates in evaluation order.
    pub gates: Vec<WorkflowGate>,
}

impl WorkflowTransition {
    pub fn new(id: TransitionId, from: StateId, to: StateId) -> Self {
        Self {
            id,
            from,
            to,
            label: None,
            waypoints: SmallVec::new(),
            gates: Vec::new(),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    pub fn touches(&self, state: StateId) -> bool {
        self.from == state || self.to == state
    }
}

/// Everything `delete_state` removed, so callers can mirror the cascade.
#[derive(Debug, Clone)]
pub struct StateRemoval {
    pub state: WorkflowState,
    pub transitions: Vec<WorkflowTransition>,
}

/// Outcome of `add_waypoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaypointInsert {
    /// The point was inserted at this index.
    Inserted(usize),
    /// The point coincided with the neighbor at this index and was dropped.
    Collapsed(usize),
}

impl WaypointInsert {
    pub fn index(self) -> usize {
        match self {
            WaypointInsert::Inserted(i) | WaypointInsert::Collapsed(i) => i,
        }
    }
}

// ─── Graph ───────────────────────────────────────────────────────────────

/// One workflow's states, transitions, and gates.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    graph: StableDiGraph<WorkflowState, WorkflowTransition>,
    state_index: IndexMap<StateId, NodeIndex>,
    transition_index: IndexMap<TransitionId, EdgeIndex>,
    gate_index: HashMap<GateId, TransitionId>,
    waypoint_epsilon: f32,
}

impl Default for WorkflowGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowGraph {
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            state_index: IndexMap::new(),
            transition_index: IndexMap::new(),
            gate_index: HashMap::new(),
            waypoint_epsilon: WAYPOINT_EPSILON,
        }
    }

    /// Override the distance under which adjacent waypoints collapse.
    pub fn with_waypoint_epsilon(mut self, epsilon: f32) -> Self {
        self.waypoint_epsilon = epsilon.max(0.0);
        self
    }

    pub fn waypoint_epsilon(&self) -> f32 {
        self.waypoint_epsilon
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn state(&self, id: StateId) -> Option<&WorkflowState> {
        self.state_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn transition(&self, id: TransitionId) -> Option<&WorkflowTransition> {
        self.transition_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn gate(&self, id: GateId) -> Option<&WorkflowGate> {
        let tid = self.gate_index.get(&id)?;
        self.transition(*tid)?.gates.iter().find(|g| g.id == id)
    }

    pub fn contains_state(&self, id: StateId) -> bool {
        self.state_index.contains_key(&id)
    }

    pub fn contains_transition(&self, id: TransitionId) -> bool {
        self.transition_index.contains_key(&id)
    }

    pub fn contains_gate(&self, id: GateId) -> bool {
        self.gate_index.contains_key(&id)
    }

    /// States in insertion order.
    pub fn states(&self) -> impl Iterator<Item = &WorkflowState> {
        self.state_index.values().map(move |idx| &self.graph[*idx])
    }

    /// Transitions in insertion order.
    pub fn transitions(&self) -> impl Iterator<Item = &WorkflowTransition> {
        self.transition_index.values().map(move |idx| &self.graph[*idx])
    }

    /// Transitions whose source or target is `state`.
    pub fn transitions_of(&self, state: StateId) -> Vec<TransitionId> {
        self.transitions()
            .filter(|t| t.touches(state))
            .map(|t| t.id)
            .collect()
    }

    /// Outgoing neighbor states of `state`, following transition direction.
    pub fn successors(&self, state: StateId) -> Vec<StateId> {
        let Some(&idx) = self.state_index.get(&state) else {
            return Vec::new();
        };
        self.graph
            .edges(idx)
            .map(|e| self.graph[e.target()].id)
            .collect()
    }

    pub fn state_count(&self) -> usize {
        self.state_index.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transition_index.len()
    }

    pub fn gate_count(&self) -> usize {
        self.gate_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state_index.is_empty()
    }

    /// Underlying petgraph view, for traversal algorithms.
    pub fn petgraph(&self) -> &StableDiGraph<WorkflowState, WorkflowTransition> {
        &self.graph
    }

    pub(crate) fn node_index(&self, id: StateId) -> Option<NodeIndex> {
        self.state_index.get(&id).copied()
    }

    /// Node indices in insertion order; petgraph's own order reuses freed slots.
    pub(crate) fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.state_index.values().copied()
    }

    // ─── States ──────────────────────────────────────────────────────────

    /// Create a state at `position` with a fresh id and the default label.
    pub fn add_state(&mut self, position: Point) -> &WorkflowState {
        let id = self.fresh_state_id();
        let idx = self.graph.add_node(WorkflowState::new(id, DEFAULT_STATE_LABEL, position));
        self.state_index.insert(id, idx);
        log::debug!("add_state {id} at ({}, {})", position.x, position.y);
        &self.graph[idx]
    }

    /// Insert a fully-formed state (loading, undo). Rejects duplicate ids.
    pub fn insert_state(&mut self, state: WorkflowState) -> GraphResult<()> {
        if self.state_index.contains_key(&state.id) {
            return Err(GraphError::Snapshot(format!("duplicate state id `{}`", state.id)));
        }
        let id = state.id;
        let idx = self.graph.add_node(state);
        self.state_index.insert(id, idx);
        Ok(())
    }

    /// Remove a state and every transition touching it, gates included.
    /// Returns `None` when the id is absent.
    pub fn delete_state(&mut self, id: StateId) -> Option<StateRemoval> {
        let idx = self.state_index.get(&id).copied()?;
        let doomed = self.transitions_of(id);
        let transitions: Vec<WorkflowTransition> = doomed
            .into_iter()
            .filter_map(|tid| self.delete_transition(tid))
            .collect();
        self.state_index.shift_remove(&id);
        let state = self.graph.remove_node(idx)?;
        log::debug!(
            "delete_state {id}: cascaded {} transition(s)",
            transitions.len()
        );
        Some(StateRemoval { state, transitions })
    }

    pub fn move_state(&mut self, id: StateId, position: Point) -> GraphResult<()> {
        let state = self.state_mut(id)?;
        state.position = position;
        log::trace!("move_state {id} -> ({}, {})", position.x, position.y);
        Ok(())
    }

    pub fn rename_state(&mut self, id: StateId, label: impl Into<String>) -> GraphResult<()> {
        self.state_mut(id)?.label = label.into();
        Ok(())
    }

    fn state_mut(&mut self, id: StateId) -> GraphResult<&mut WorkflowState> {
        let idx = self
            .state_index
            .get(&id)
            .copied()
            .ok_or_else(|| GraphError::missing(EntityKind::State, id))?;
        Ok(&mut self.graph[idx])
    }

    fn fresh_state_id(&self) -> StateId {
        loop {
            let id = StateId::generate();
            if !self.state_index.contains_key(&id) {
                return id;
            }
        }
    }

    // ─── Transitions ─────────────────────────────────────────────────────

    /// Connect two existing states. Parallel edges and self-loops are allowed.
    pub fn add_transition(&mut self, from: StateId, to: StateId) -> GraphResult<&WorkflowTransition> {
        let id = self.fresh_transition_id();
        self.insert_transition(WorkflowTransition::new(id, from, to))?;
        log::debug!("add_transition {id}: {from} -> {to}");
        self.transition(id)
            .ok_or_else(|| GraphError::missing(EntityKind::Transition, id))
    }

    /// Insert a fully-formed transition, gates included.
    pub fn insert_transition(&mut self, transition: WorkflowTransition) -> GraphResult<()> {
        let a = self
            .node_index(transition.from)
            .ok_or_else(|| GraphError::missing(EntityKind::State, transition.from))?;
        let b = self
            .node_index(transition.to)
            .ok_or_else(|| GraphError::missing(EntityKind::State, transition.to))?;
        if self.transition_index.contains_key(&transition.id) {
            return Err(GraphError::Snapshot(format!(
                "duplicate transition id `{}`",
                transition.id
            )));
        }
        let mut incoming = HashSet::new();
        if let Some(g) = transition
            .gates
            .iter()
            .find(|g| self.gate_index.contains_key(&g.id) || !incoming.insert(g.id))
        {
            return Err(GraphError::Snapshot(format!("duplicate gate id `{}`", g.id)));
        }
        let id = transition.id;
        for gate in &transition.gates {
            self.gate_index.insert(gate.id, id);
        }
        let idx = self.graph.add_edge(a, b, transition);
        self.transition_index.insert(id, idx);
        Ok(())
    }

    /// Remove a transition and its gates. Returns `None` when absent.
    pub fn delete_transition(&mut self, id: TransitionId) -> Option<WorkflowTransition> {
        let idx = self.transition_index.shift_remove(&id)?;
        let removed = self.graph.remove_edge(idx)?;
        for gate in &removed.gates {
            self.gate_index.remove(&gate.id);
        }
        log::debug!("delete_transition {id}");
        Some(removed)
    }

    pub fn rename_transition(&mut self, id: TransitionId, label: Option<String>) -> GraphResult<()> {
        self.transition_mut(id)?.label = label.filter(|l| !l.is_empty());
        Ok(())
    }

    fn transition_mut(&mut self, id: TransitionId) -> GraphResult<&mut WorkflowTransition> {
        let idx = self
            .transition_index
            .get(&id)
            .copied()
            .ok_or_else(|| GraphError::missing(EntityKind::Transition, id))?;
        Ok(&mut self.graph[idx])
    }

    fn fresh_transition_id(&self) -> TransitionId {
        loop {
            let id = TransitionId::generate();
            if !self.transition_index.contains_key(&id) {
                return id;
            }
        }
    }

    // ─── Gates ───────────────────────────────────────────────────────────

    /// Append a gate to the end of a transition's gate order.
    pub fn add_gate(&mut self, transition: TransitionId, label: impl Into<String>) -> GraphResult<&WorkflowGate> {
        let id = loop {
            let id = GateId::generate();
            if !self.gate_index.contains_key(&id) {
                break id;
            }
        };
        let t = self.transition_mut(transition)?;
        t.gates.push(WorkflowGate {
            id,
            transition_id: transition,
            label: label.into(),
        });
        self.gate_index.insert(id, transition);
        log::debug!("add_gate {id} on {transition}");
        self.gate(id).ok_or_else(|| GraphError::missing(EntityKind::Gate, id))
    }

    /// Remove a gate by id. Returns `None` when absent.
    pub fn remove_gate(&mut self, id: GateId) -> Option<WorkflowGate> {
        let tid = self.gate_index.get(&id).copied()?;
        let t = self.transition_mut(tid).ok()?;
        let pos = t.gates.iter().position(|g| g.id == id)?;
        let gate = t.gates.remove(pos);
        self.gate_index.remove(&id);
        log::debug!("remove_gate {id} from {tid}");
        Some(gate)
    }

    /// Move a gate to `position` within its transition (clamped to the end).
    pub fn move_gate(&mut self, id: GateId, position: usize) -> GraphResult<()> {
        let tid = self
            .gate_index
            .get(&id)
            .copied()
            .ok_or_else(|| GraphError::missing(EntityKind::Gate, id))?;
        let t = self.transition_mut(tid)?;
        let Some(from) = t.gates.iter().position(|g| g.id == id) else {
            return Err(GraphError::missing(EntityKind::Gate, id));
        };
        let gate = t.gates.remove(from);
        let to = position.min(t.gates.len());
        t.gates.insert(to, gate);
        Ok(())
    }

    pub fn rename_gate(&mut self, id: GateId, label: impl Into<String>) -> GraphResult<()> {
        let tid = self
            .gate_index
            .get(&id)
            .copied()
            .ok_or_else(|| GraphError::missing(EntityKind::Gate, id))?;
        let t = self.transition_mut(tid)?;
        match t.gates.iter_mut().find(|g| g.id == id) {
            Some(gate) => {
                gate.label = label.into();
                Ok(())
            }
            None => Err(GraphError::missing(EntityKind::Gate, id)),
        }
    }

    // ─── Waypoints ───────────────────────────────────────────────────────

    /// Insert a waypoint at `index` (or append). A point within epsilon of
    /// an adjacent waypoint is dropped instead of creating a zero-length segment.
    pub fn add_waypoint(
        &mut self,
        transition: TransitionId,
        point: Point,
        index: Option<usize>,
    ) -> GraphResult<WaypointInsert> {
        let eps = self.waypoint_epsilon;
        let t = self.transition_mut(transition)?;
        let len = t.waypoints.len();
        let at = index.unwrap_or(len);
        if at > len {
            return Err(GraphError::InvalidIndex {
                transition: transition.to_string(),
                index: at,
                len,
            });
        }
        if at > 0 && t.waypoints[at - 1].approx_eq(point, eps) {
            return Ok(WaypointInsert::Collapsed(at - 1));
        }
        if at < len && t.waypoints[at].approx_eq(point, eps) {
            return Ok(WaypointInsert::Collapsed(at));
        }
        t.waypoints.insert(at, point);
        log::debug!("add_waypoint {transition}[{at}] ({}, {})", point.x, point.y);
        Ok(WaypointInsert::Inserted(at))
    }

    /// Remove the waypoint at `index`. An emptied list means the transition
    /// is routed with the default curve again.
    pub fn remove_waypoint(&mut self, transition: TransitionId, index: usize) -> GraphResult<Point> {
        let eps = self.waypoint_epsilon;
        let t = self.transition_mut(transition)?;
        let len = t.waypoints.len();
        if index >= len {
            return Err(GraphError::InvalidIndex {
                transition: transition.to_string(),
                index,
                len,
            });
        }
        let removed = t.waypoints.remove(index);
        // The former neighbors are now adjacent.
        if index > 0 && index < t.waypoints.len() && t.waypoints[index - 1].approx_eq(t.waypoints[index], eps) {
            t.waypoints.remove(index);
        }
        log::debug!("remove_waypoint {transition}[{index}]");
        Ok(removed)
    }

    /// Move one waypoint. If it lands on a neighbor the two merge; the
    /// returned index is where the moved point now lives.
    pub fn move_waypoint(&mut self, transition: TransitionId, index: usize, point: Point) -> GraphResult<usize> {
        let eps = self.waypoint_epsilon;
        let t = self.transition_mut(transition)?;
        let len = t.waypoints.len();
        if index >= len {
            return Err(GraphError::InvalidIndex {
                transition: transition.to_string(),
                index,
                len,
            });
        }
        let merged = if index > 0 && t.waypoints[index - 1].approx_eq(point, eps) {
            t.waypoints.remove(index);
            index - 1
        } else if index + 1 < len && t.waypoints[index + 1].approx_eq(point, eps) {
            t.waypoints.remove(index);
            index
        } else {
            t.waypoints[index] = point;
            return Ok(index);
        };
        // The merged point may now touch its other neighbor too.
        let mut at = merged;
        if at > 0 && t.waypoints[at - 1].approx_eq(t.waypoints[at], eps) {
            t.waypoints.remove(at);
            at -= 1;
        }
        if at + 1 < t.waypoints.len() && t.waypoints[at].approx_eq(t.waypoints[at + 1], eps) {
            t.waypoints.remove(at + 1);
        }
        log::trace!("move_waypoint {transition}[{index}] merged into [{at}]");
        Ok(at)
    }

    /// Clear every waypoint. Returns how many were removed.
    pub fn reset_waypoints(&mut self, transition: TransitionId) -> GraphResult<usize> {
        let t = self.transition_mut(transition)?;
        let n = t.waypoints.len();
        t.waypoints.clear();
        log::debug!("reset_waypoints {transition}: cleared {n}");
        Ok(n)
    }
}
