//! Flat snapshot of a workflow graph, shaped like the backend's records.
//!
//! Gates carry an explicit `position` so their order survives any store that
//! does not preserve row order. Loading is lenient about dangling references
//! (they are dropped and logged) but strict about duplicate ids.

use crate::error::GraphResult;
use crate::id::{GateId, StateId, TransitionId};
use crate::model::{Point, WorkflowGate, WorkflowGraph, WorkflowState, WorkflowTransition};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub id: TransitionId,
    pub from: StateId,
    pub to: StateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub waypoints: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateRecord {
    pub id: GateId,
    pub transition_id: TransitionId,
    pub label: String,
    /// Zero-based evaluation order within the parent transition.
    pub position: usize,
}

/// Everything needed to rebuild a `WorkflowGraph`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub states: Vec<WorkflowState>,
    #[serde(default)]
    pub transitions: Vec<TransitionRecord>,
    #[serde(default)]
    pub gates: Vec<GateRecord>,
}

impl TransitionRecord {
    pub fn from_transition(t: &WorkflowTransition) -> Self {
        Self {
            id: t.id,
            from: t.from,
            to: t.to,
            label: t.label.clone(),
            waypoints: t.waypoints.to_vec(),
        }
    }
}

impl GateRecord {
    pub fn from_gate(gate: &WorkflowGate, position: usize) -> Self {
        Self {
            id: gate.id,
            transition_id: gate.transition_id,
            label: gate.label.clone(),
            position,
        }
    }
}

impl GraphSnapshot {
    pub fn from_json(text: &str) -> GraphResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> GraphResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_msgpack(bytes: &[u8]) -> GraphResult<Self> {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    pub fn to_msgpack(&self) -> GraphResult<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }
}

impl WorkflowGraph {
    /// Flatten into backend-shaped records, in insertion order.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let states = self.states().cloned().collect();
        let transitions = self.transitions().map(TransitionRecord::from_transition).collect();
        let gates = self
            .transitions()
            .flat_map(|t| {
                t.gates
                    .iter()
                    .enumerate()
                    .map(|(i, g)| GateRecord::from_gate(g, i))
            })
            .collect();
        GraphSnapshot {
            states,
            transitions,
            gates,
        }
    }

    /// Rebuild a graph from records.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> GraphResult<Self> {
        let mut graph = WorkflowGraph::new();
        for state in snapshot.states {
            graph.insert_state(state)?;
        }

        let mut gates = snapshot.gates;
        // Stable sort keeps record order for equal positions.
        gates.sort_by_key(|g| g.position);

        for record in snapshot.transitions {
            if !graph.contains_state(record.from) || !graph.contains_state(record.to) {
                log::warn!(
                    "dropping transition {}: endpoint {} -> {} does not exist",
                    record.id,
                    record.from,
                    record.to
                );
                continue;
            }
            let mut t = WorkflowTransition::new(record.id, record.from, record.to);
            t.label = record.label;
            let mut waypoints: SmallVec<[Point; 4]> = SmallVec::new();
            for p in record.waypoints {
                if waypoints
                    .last()
                    .is_some_and(|last| last.approx_eq(p, graph.waypoint_epsilon()))
                {
                    continue;
                }
                waypoints.push(p);
            }
            t.waypoints = waypoints;
            t.gates = gates
                .iter()
                .filter(|g| g.transition_id == record.id)
                .map(|g| WorkflowGate {
                    id: g.id,
                    transition_id: g.transition_id,
                    label: g.label.clone(),
                })
                .collect();
            graph.insert_transition(t)?;
        }

        for orphan in gates.iter().filter(|g| !graph.contains_transition(g.transition_id)) {
            log::warn!(
                "dropping gate {}: transition {} does not exist",
                orphan.id,
                orphan.transition_id
            );
        }
        Ok(graph)
    }
}
