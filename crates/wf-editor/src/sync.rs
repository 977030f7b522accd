//! Sync engine: local workflow graph → backend store.
//!
//! The engine holds the authoritative graph. Canvas interactions arrive as
//! `GraphMutation`s; each is applied locally in one step and then mirrored to
//! the store record by record. Store failures are surfaced through the
//! notifier and never undo the local change.

use crate::backend::{Notifier, PersistError, Severity, WorkflowStore};
use std::collections::HashMap;
use wf_core::*;

/// A mutation of the workflow graph produced by gestures, menus, or the host.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphMutation {
    AddState {
        position: Point,
    },
    DeleteState {
        id: StateId,
    },
    MoveState {
        id: StateId,
        position: Point,
    },
    RenameState {
        id: StateId,
        label: String,
    },
    AddTransition {
        from: StateId,
        to: StateId,
    },
    DeleteTransition {
        id: TransitionId,
    },
    RenameTransition {
        id: TransitionId,
        label: Option<String>,
    },
    AddGate {
        transition: TransitionId,
        label: String,
    },
    RemoveGate {
        id: GateId,
    },
    /// Reorder a gate within its transition.
    MoveGate {
        id: GateId,
        position: usize,
    },
    RenameGate {
        id: GateId,
        label: String,
    },
    AddWaypoint {
        transition: TransitionId,
        point: Point,
        index: Option<usize>,
    },
    RemoveWaypoint {
        transition: TransitionId,
        index: usize,
    },
    MoveWaypoint {
        transition: TransitionId,
        index: usize,
        point: Point,
    },
    ResetWaypoints {
        transition: TransitionId,
    },
}

impl GraphMutation {
    /// Short label for undo history.
    pub fn describe(&self) -> &'static str {
        match self {
            GraphMutation::AddState { .. } => "Add state",
            GraphMutation::DeleteState { .. } => "Delete state",
            GraphMutation::MoveState { .. } => "Move state",
            GraphMutation::RenameState { .. } => "Rename state",
            GraphMutation::AddTransition { .. } => "Add transition",
            GraphMutation::DeleteTransition { .. } => "Delete transition",
            GraphMutation::RenameTransition { .. } => "Rename transition",
            GraphMutation::AddGate { .. } => "Add gate",
            GraphMutation::RemoveGate { .. } => "Remove gate",
            GraphMutation::MoveGate { .. } => "Reorder gate",
            GraphMutation::RenameGate { .. } => "Rename gate",
            GraphMutation::AddWaypoint { .. } => "Add waypoint",
            GraphMutation::RemoveWaypoint { .. } => "Remove waypoint",
            GraphMutation::MoveWaypoint { .. } => "Move waypoint",
            GraphMutation::ResetWaypoints { .. } => "Reset waypoints",
        }
    }
}

/// What a successfully applied mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    StateAdded(StateId),
    TransitionAdded(TransitionId),
    GateAdded(GateId),
    /// Index of the waypoint that was added or moved.
    Waypoint(usize),
    Changed,
    /// Nothing changed: an idempotent delete, or a waypoint that collapsed
    /// into its neighbor.
    Noop,
}

/// The sync engine holds the authoritative graph and mirrors it to the store.
pub struct SyncEngine {
    /// The current workflow graph (single source of truth).
    pub graph: WorkflowGraph,

    /// Renderer-measured state sizes.
    pub dims: DimensionCache,

    store: Box<dyn WorkflowStore>,
    notifier: Box<dyn Notifier>,

    /// Bumped once per applied mutation; watchers compare to detect change.
    revision: u64,
}

impl SyncEngine {
    pub fn new(
        graph: WorkflowGraph,
        dims: DimensionCache,
        store: Box<dyn WorkflowStore>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            graph,
            dims,
            store,
            notifier,
            revision: 0,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn store_mut(&mut self) -> &mut dyn WorkflowStore {
        self.store.as_mut()
    }

    pub fn notify(&mut self, severity: Severity, message: &str) {
        self.notifier.notify(severity, message);
    }

    /// Record a renderer measurement. Returns true if anchors moved.
    pub fn report_dimensions(&mut self, id: StateId, dims: Dimensions) -> bool {
        if !self.graph.contains_state(id) {
            log::debug!("ignoring dimensions for unknown state {id}");
            return false;
        }
        self.dims.report(id, dims)
    }

    // ─── Local apply ─────────────────────────────────────────────────────

    /// Apply one mutation locally, then mirror it to the store.
    pub fn apply(&mut self, mutation: GraphMutation) -> GraphResult<Applied> {
        let applied = match mutation {
            GraphMutation::AddState { position } => {
                let id = self.graph.add_state(position).id;
                self.persist_state(id);
                Applied::StateAdded(id)
            }
            GraphMutation::DeleteState { id } => match self.graph.delete_state(id) {
                Some(removal) => {
                    self.dims.forget(id);
                    for t in &removal.transitions {
                        for gate in &t.gates {
                            let r = self.store.delete_gate(gate.id);
                            self.report(r);
                        }
                        let r = self.store.delete_transition(t.id);
                        self.report(r);
                    }
                    let r = self.store.delete_state(id);
                    self.report(r);
                    Applied::Changed
                }
                None => Applied::Noop,
            },
            GraphMutation::MoveState { id, position } => {
                self.graph.move_state(id, position)?;
                self.persist_state(id);
                Applied::Changed
            }
            GraphMutation::RenameState { id, label } => {
                self.graph.rename_state(id, label)?;
                self.persist_state(id);
                Applied::Changed
            }
            GraphMutation::AddTransition { from, to } => {
                let id = self.graph.add_transition(from, to)?.id;
                self.persist_transition(id);
                Applied::TransitionAdded(id)
            }
            GraphMutation::DeleteTransition { id } => match self.graph.delete_transition(id) {
                Some(removed) => {
                    for gate in &removed.gates {
                        let r = self.store.delete_gate(gate.id);
                        self.report(r);
                    }
                    let r = self.store.delete_transition(id);
                    self.report(r);
                    Applied::Changed
                }
                None => Applied::Noop,
            },
            GraphMutation::RenameTransition { id, label } => {
                self.graph.rename_transition(id, label)?;
                self.persist_transition(id);
                Applied::Changed
            }
            GraphMutation::AddGate { transition, label } => {
                let id = self.graph.add_gate(transition, label)?.id;
                self.persist_gates(transition);
                Applied::GateAdded(id)
            }
            GraphMutation::RemoveGate { id } => match self.graph.remove_gate(id) {
                Some(gate) => {
                    let r = self.store.delete_gate(id);
                    self.report(r);
                    // Later gates shifted up one position.
                    self.persist_gates(gate.transition_id);
                    Applied::Changed
                }
                None => Applied::Noop,
            },
            GraphMutation::MoveGate { id, position } => {
                self.graph.move_gate(id, position)?;
                if let Some(tid) = self.graph.gate(id).map(|g| g.transition_id) {
                    self.persist_gates(tid);
                }
                Applied::Changed
            }
            GraphMutation::RenameGate { id, label } => {
                self.graph.rename_gate(id, label)?;
                if let Some(tid) = self.graph.gate(id).map(|g| g.transition_id) {
                    self.persist_gates(tid);
                }
                Applied::Changed
            }
            GraphMutation::AddWaypoint {
                transition,
                point,
                index,
            } => {
                match self.graph.add_waypoint(transition, point, index)? {
                    WaypointInsert::Inserted(at) => {
                        self.persist_transition(transition);
                        Applied::Waypoint(at)
                    }
                    // Landed on a neighbor; nothing changed.
                    WaypointInsert::Collapsed(_) => Applied::Noop,
                }
            }
            GraphMutation::RemoveWaypoint { transition, index } => {
                self.graph.remove_waypoint(transition, index)?;
                self.persist_transition(transition);
                Applied::Changed
            }
            GraphMutation::MoveWaypoint {
                transition,
                index,
                point,
            } => {
                let at = self.graph.move_waypoint(transition, index, point)?;
                self.persist_transition(transition);
                Applied::Waypoint(at)
            }
            GraphMutation::ResetWaypoints { transition } => {
                self.graph.reset_waypoints(transition)?;
                self.persist_transition(transition);
                Applied::Changed
            }
        };

        if applied != Applied::Noop {
            self.revision += 1;
        }
        Ok(applied)
    }

    /// Swap in a whole graph (undo/redo) and mirror the difference.
    pub fn replace_graph(&mut self, graph: WorkflowGraph) {
        let old = self.graph.to_snapshot();
        let new = graph.to_snapshot();
        self.graph = graph;
        self.revision += 1;

        let old_states: HashMap<StateId, &WorkflowState> = old.states.iter().map(|s| (s.id, s)).collect();
        let new_states: HashMap<StateId, &WorkflowState> = new.states.iter().map(|s| (s.id, s)).collect();
        let old_transitions: HashMap<TransitionId, &TransitionRecord> =
            old.transitions.iter().map(|t| (t.id, t)).collect();
        let new_transitions: HashMap<TransitionId, &TransitionRecord> =
            new.transitions.iter().map(|t| (t.id, t)).collect();
        let old_gates: HashMap<GateId, &GateRecord> = old.gates.iter().map(|g| (g.id, g)).collect();
        let new_gates: HashMap<GateId, &GateRecord> = new.gates.iter().map(|g| (g.id, g)).collect();

        // Children first on delete, parents first on save.
        for g in old.gates.iter().filter(|g| !new_gates.contains_key(&g.id)) {
            let r = self.store.delete_gate(g.id);
            self.report(r);
        }
        for t in old.transitions.iter().filter(|t| !new_transitions.contains_key(&t.id)) {
            let r = self.store.delete_transition(t.id);
            self.report(r);
        }
        for s in old.states.iter().filter(|s| !new_states.contains_key(&s.id)) {
            self.dims.forget(s.id);
            let r = self.store.delete_state(s.id);
            self.report(r);
        }
        for s in new.states.iter().filter(|s| old_states.get(&s.id) != Some(s)) {
            let r = self.store.save_state(s);
            self.report(r);
        }
        for t in new.transitions.iter().filter(|t| old_transitions.get(&t.id) != Some(t)) {
            let r = self.store.save_transition(t);
            self.report(r);
        }
        for g in new.gates.iter().filter(|g| old_gates.get(&g.id) != Some(g)) {
            let r = self.store.save_gate(g);
            self.report(r);
        }
    }

    // ─── Store mirroring ─────────────────────────────────────────────────

    fn persist_state(&mut self, id: StateId) {
        if let Some(state) = self.graph.state(id) {
            let r = self.store.save_state(state);
            self.report(r);
        }
    }

    fn persist_transition(&mut self, id: TransitionId) {
        if let Some(t) = self.graph.transition(id) {
            let record = TransitionRecord::from_transition(t);
            let r = self.store.save_transition(&record);
            self.report(r);
        }
    }

    fn persist_gates(&mut self, transition: TransitionId) {
        let records: Vec<GateRecord> = match self.graph.transition(transition) {
            Some(t) => t
                .gates
                .iter()
                .enumerate()
                .map(|(i, g)| GateRecord::from_gate(g, i))
                .collect(),
            None => return,
        };
        for record in &records {
            let r = self.store.save_gate(record);
            self.report(r);
        }
    }

    fn report(&mut self, result: Result<(), PersistError>) {
        if let Err(e) = result {
            log::warn!("persistence failed: {e}");
            self.notifier
                .notify(Severity::Error, &format!("Changes could not be saved: {e}"));
        }
    }
}
