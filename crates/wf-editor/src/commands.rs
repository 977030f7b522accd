//! Undo/Redo command stack.
//!
//! Every successful mutation pushes a `Command` holding the graph before and
//! after it. Undo and redo swap the whole graph back in through the sync
//! engine, which mirrors the difference to the store.
//!
//! Drag gestures are batched: the graph is captured when the drag starts and
//! compared when it ends, so a drag is one undo step however many moves it
//! emitted.

use crate::sync::{Applied, GraphMutation, SyncEngine};
use wf_core::{GraphResult, WorkflowGraph};

/// One undoable step.
#[derive(Debug, Clone)]
pub struct Command {
    before: WorkflowGraph,
    after: WorkflowGraph,
    pub description: String,
}

/// Manages undo/redo stacks with batch grouping for drag gestures.
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Graph captured at the start of a batch.
    batch_snapshot: Option<WorkflowGraph>,
    batch_description: String,
    /// Whether any mutation applied during the current batch.
    batch_dirty: bool,
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            batch_depth: 0,
            batch_snapshot: None,
            batch_description: String::new(),
            batch_dirty: false,
        }
    }

    /// Start a batch group. Mutations until `end_batch()` are applied live
    /// but recorded as one undo step.
    pub fn begin_batch(&mut self, engine: &SyncEngine, description: &str) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(engine.graph.clone());
            self.batch_description = description.to_string();
            self.batch_dirty = false;
        }
        self.batch_depth += 1;
    }

    /// End a batch group. When the outermost batch closes and the graph
    /// actually changed, push one command.
    pub fn end_batch(&mut self, engine: &SyncEngine) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return;
        }
        let before = self.batch_snapshot.take();
        if self.batch_dirty
            && let Some(before) = before
            && before.to_snapshot() != engine.graph.to_snapshot()
        {
            let description = std::mem::take(&mut self.batch_description);
            self.push(Command {
                before,
                after: engine.graph.clone(),
                description,
            });
        }
        self.batch_dirty = false;
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Apply a mutation through the engine and record it.
    pub fn execute(&mut self, engine: &mut SyncEngine, mutation: GraphMutation) -> GraphResult<Applied> {
        if self.batch_depth > 0 {
            let applied = engine.apply(mutation)?;
            self.batch_dirty |= applied != Applied::Noop;
            return Ok(applied);
        }

        let before = engine.graph.clone();
        let description = mutation.describe();
        let applied = engine.apply(mutation)?;
        if applied != Applied::Noop {
            self.push(Command {
                before,
                after: engine.graph.clone(),
                description: description.to_string(),
            });
        }
        Ok(applied)
    }

    /// Undo the last command. Returns its description.
    pub fn undo(&mut self, engine: &mut SyncEngine) -> Option<String> {
        if self.batch_depth > 0 {
            return None;
        }
        let cmd = self.undo_stack.pop()?;
        engine.replace_graph(cmd.before.clone());
        let desc = cmd.description.clone();
        self.redo_stack.push(cmd);
        log::debug!("undo: {desc}");
        Some(desc)
    }

    /// Redo the last undone command. Returns its description.
    pub fn redo(&mut self, engine: &mut SyncEngine) -> Option<String> {
        if self.batch_depth > 0 {
            return None;
        }
        let cmd = self.redo_stack.pop()?;
        engine.replace_graph(cmd.after.clone());
        let desc = cmd.description.clone();
        self.undo_stack.push(cmd);
        log::debug!("redo: {desc}");
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Drop all history (e.g. after loading another workflow).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch_depth = 0;
        self.batch_snapshot = None;
        self.batch_dirty = false;
    }

    fn push(&mut self, cmd: Command) {
        self.undo_stack.push(cmd);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // New action invalidates redo history.
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryStore, RecordingNotifier};
    use wf_core::*;

    fn engine() -> SyncEngine {
        SyncEngine::new(
            WorkflowGraph::new(),
            DimensionCache::default(),
            Box::new(MemoryStore::new()),
            Box::new(RecordingNotifier::default()),
        )
    }

    fn add(stack: &mut CommandStack, engine: &mut SyncEngine, x: f32) -> StateId {
        match stack
            .execute(engine, GraphMutation::AddState {
                position: Point::new(x, 0.0),
            })
            .unwrap()
        {
            Applied::StateAdded(id) => id,
            other => panic!("expected StateAdded, got {other:?}"),
        }
    }

    #[test]
    fn undo_redo_single() {
        let mut engine = engine();
        let mut stack = CommandStack::new(100);
        let a = add(&mut stack, &mut engine, 0.0);
        assert_eq!(stack.undo(&mut engine).as_deref(), Some("Add state"));
        assert!(!engine.graph.contains_state(a));
        assert_eq!(stack.redo(&mut engine).as_deref(), Some("Add state"));
        assert!(engine.graph.contains_state(a));
    }

    #[test]
    fn batch_collapses_to_one_step() {
        let mut engine = engine();
        let mut stack = CommandStack::new(100);
        let a = add(&mut stack, &mut engine, 0.0);

        stack.begin_batch(&engine, "Move state");
        for i in 1..=5 {
            stack
                .execute(&mut engine, GraphMutation::MoveState {
                    id: a,
                    position: Point::new(i as f32 * 10.0, 0.0),
                })
                .unwrap();
        }
        stack.end_batch(&engine);
        assert_eq!(stack.undo_depth(), 2);

        stack.undo(&mut engine);
        assert_eq!(engine.graph.state(a).map(|s| s.position), Some(Point::new(0.0, 0.0)));
    }

    #[test]
    fn empty_batch_records_nothing() {
        let mut engine = engine();
        let mut stack = CommandStack::new(100);
        stack.begin_batch(&engine, "Move state");
        stack.end_batch(&engine);
        assert!(!stack.can_undo());
    }

    #[test]
    fn new_action_clears_redo() {
        let mut engine = engine();
        let mut stack = CommandStack::new(100);
        add(&mut stack, &mut engine, 0.0);
        stack.undo(&mut engine);
        assert!(stack.can_redo());
        add(&mut stack, &mut engine, 50.0);
        assert!(!stack.can_redo());
    }

    #[test]
    fn depth_is_bounded() {
        let mut engine = engine();
        let mut stack = CommandStack::new(3);
        for i in 0..5 {
            add(&mut stack, &mut engine, i as f32 * 200.0);
        }
        assert_eq!(stack.undo_depth(), 3);
    }

    #[test]
    fn failed_mutation_is_not_recorded() {
        let mut engine = engine();
        let mut stack = CommandStack::new(100);
        let result = stack.execute(&mut engine, GraphMutation::MoveState {
            id: StateId::intern("ghost"),
            position: Point::default(),
        });
        assert!(result.is_err());
        assert!(!stack.can_undo());
    }
}
