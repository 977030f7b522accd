//! Collaborator contracts: the workflow store and the notification sink.
//!
//! The editor calls the store after every local mutation and never waits on
//! the outcome to keep editing. A failed call becomes an error notification;
//! the local graph stays authoritative.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;
use wf_core::*;

/// A failed backend call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("workflow `{0}` not found")]
    NotFound(String),

    #[error("{entity} `{id}` rejected: {reason}")]
    Rejected {
        entity: &'static str,
        id: String,
        reason: String,
    },
}

/// CRUD surface of the external workflow store.
pub trait WorkflowStore {
    fn load_graph(&mut self, workflow_id: &str) -> Result<GraphSnapshot, PersistError>;

    fn save_state(&mut self, state: &WorkflowState) -> Result<(), PersistError>;
    fn save_transition(&mut self, transition: &TransitionRecord) -> Result<(), PersistError>;
    fn save_gate(&mut self, gate: &GateRecord) -> Result<(), PersistError>;

    fn delete_state(&mut self, id: StateId) -> Result<(), PersistError>;
    fn delete_transition(&mut self, id: TransitionId) -> Result<(), PersistError>;
    fn delete_gate(&mut self, id: GateId) -> Result<(), PersistError>;
}

/// Toast flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

/// User-facing notification sink.
pub trait Notifier {
    fn notify(&mut self, severity: Severity, message: &str);
}

/// Routes notifications to the log when the host has no toast surface.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => log::error!("{message}"),
            Severity::Warning => log::warn!("{message}"),
            Severity::Success | Severity::Info => log::info!("{message}"),
        }
    }
}

/// Collects notifications; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    seen: Rc<RefCell<Vec<(Severity, String)>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.seen.borrow().clone()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.seen.borrow().iter().filter(|(s, _)| *s == severity).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, severity: Severity, message: &str) {
        self.seen.borrow_mut().push((severity, message.to_string()));
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    workflows: HashMap<String, GraphSnapshot>,
    states: HashMap<StateId, WorkflowState>,
    transitions: HashMap<TransitionId, TransitionRecord>,
    gates: HashMap<GateId, GateRecord>,
    offline: bool,
    calls: usize,
}

/// In-process store. Clones share state, so a test can keep a handle while
/// the session owns another. `set_offline(true)` makes every write fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workflow(workflow_id: &str, snapshot: GraphSnapshot) -> Self {
        let store = Self::default();
        store
            .inner
            .borrow_mut()
            .workflows
            .insert(workflow_id.to_string(), snapshot);
        store
    }

    pub fn set_offline(&self, offline: bool) {
        self.inner.borrow_mut().offline = offline;
    }

    /// Number of write calls received, successful or not.
    pub fn calls(&self) -> usize {
        self.inner.borrow().calls
    }

    pub fn state(&self, id: StateId) -> Option<WorkflowState> {
        self.inner.borrow().states.get(&id).cloned()
    }

    pub fn transition(&self, id: TransitionId) -> Option<TransitionRecord> {
        self.inner.borrow().transitions.get(&id).cloned()
    }

    pub fn gate(&self, id: GateId) -> Option<GateRecord> {
        self.inner.borrow().gates.get(&id).cloned()
    }

    pub fn state_count(&self) -> usize {
        self.inner.borrow().states.len()
    }

    pub fn transition_count(&self) -> usize {
        self.inner.borrow().transitions.len()
    }

    pub fn gate_count(&self) -> usize {
        self.inner.borrow().gates.len()
    }

    fn write<F: FnOnce(&mut MemoryInner)>(&mut self, f: F) -> Result<(), PersistError> {
        let mut inner = self.inner.borrow_mut();
        inner.calls += 1;
        if inner.offline {
            return Err(PersistError::Unavailable("store is offline".into()));
        }
        f(&mut inner);
        Ok(())
    }
}

impl WorkflowStore for MemoryStore {
    fn load_graph(&mut self, workflow_id: &str) -> Result<GraphSnapshot, PersistError> {
        let inner = self.inner.borrow();
        if inner.offline {
            return Err(PersistError::Unavailable("store is offline".into()));
        }
        inner
            .workflows
            .get(workflow_id)
            .cloned()
            .ok_or_else(|| PersistError::NotFound(workflow_id.to_string()))
    }

    fn save_state(&mut self, state: &WorkflowState) -> Result<(), PersistError> {
        self.write(|s| {
            s.states.insert(state.id, state.clone());
        })
    }

    fn save_transition(&mut self, transition: &TransitionRecord) -> Result<(), PersistError> {
        self.write(|s| {
            s.transitions.insert(transition.id, transition.clone());
        })
    }

    fn save_gate(&mut self, gate: &GateRecord) -> Result<(), PersistError> {
        self.write(|s| {
            s.gates.insert(gate.id, gate.clone());
        })
    }

    fn delete_state(&mut self, id: StateId) -> Result<(), PersistError> {
        self.write(|s| {
            s.states.remove(&id);
        })
    }

    fn delete_transition(&mut self, id: TransitionId) -> Result<(), PersistError> {
        self.write(|s| {
            s.transitions.remove(&id);
        })
    }

    fn delete_gate(&mut self, id: GateId) -> Result<(), PersistError> {
        self.write(|s| {
            s.gates.remove(&id);
        })
    }
}
