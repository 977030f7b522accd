//! Editor session: one open workflow and everything transient around it.
//!
//! The session owns the sync engine, the undo stack, the gesture machine,
//! the open context menu, and the selection. Hosts feed it `InputEvent`s and
//! read back a `RenderFrame`. Entry points never fail: recoverable problems
//! are logged and dropped.

use crate::backend::{Notifier, PersistError, Severity, WorkflowStore};
use crate::commands::CommandStack;
use crate::config::EditorConfig;
use crate::gesture::{Gesture, GestureMachine, PointerContext};
use crate::input::{InputEvent, Modifiers};
use crate::menu::{ContextMenu, EditRequest, MenuAction, MenuCommand, MenuTarget};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::sync::{Applied, GraphMutation, SyncEngine};
use wf_core::*;
use wf_render::{Highlight, HitTarget, RenderFrame, build_frame, hit_test, insertion_index, state_at};

/// The single selected entity, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    State(StateId),
    Transition(TransitionId),
}

pub struct EditorSession {
    engine: SyncEngine,
    commands: CommandStack,
    gesture: GestureMachine,
    menu: Option<ContextMenu>,
    selection: Selection,
    config: EditorConfig,
    is_admin: bool,
}

impl EditorSession {
    /// Start editing an empty workflow.
    pub fn new(config: EditorConfig, store: Box<dyn WorkflowStore>, notifier: Box<dyn Notifier>) -> Self {
        let graph = WorkflowGraph::new().with_waypoint_epsilon(config.waypoint_epsilon);
        Self::with_graph(graph, config, store, notifier)
    }

    /// Load `workflow_id` from the store and start editing it.
    pub fn open(
        workflow_id: &str,
        config: EditorConfig,
        mut store: Box<dyn WorkflowStore>,
        notifier: Box<dyn Notifier>,
    ) -> Result<Self, PersistError> {
        let snapshot = store.load_graph(workflow_id)?;
        let graph = WorkflowGraph::from_snapshot(snapshot)
            .map_err(|e| PersistError::Rejected {
                entity: "workflow",
                id: workflow_id.to_string(),
                reason: e.to_string(),
            })?
            .with_waypoint_epsilon(config.waypoint_epsilon);
        log::info!(
            "opened workflow {workflow_id}: {} states, {} transitions",
            graph.state_count(),
            graph.transition_count()
        );
        Ok(Self::with_graph(graph, config, store, notifier))
    }

    fn with_graph(
        graph: WorkflowGraph,
        config: EditorConfig,
        store: Box<dyn WorkflowStore>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            engine: SyncEngine::new(graph, config.dimension_cache(), store, notifier),
            commands: CommandStack::new(config.undo_depth),
            gesture: GestureMachine::new(),
            menu: None,
            selection: Selection::None,
            config,
            is_admin: false,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn graph(&self) -> &WorkflowGraph {
        &self.engine.graph
    }

    pub fn dimensions(&self) -> &DimensionCache {
        &self.engine.dims
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture.gesture()
    }

    pub fn menu(&self) -> Option<&ContextMenu> {
        self.menu.as_ref()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn revision(&self) -> u64 {
        self.engine.revision()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn set_admin(&mut self, is_admin: bool) {
        self.is_admin = is_admin;
    }

    pub fn can_undo(&self) -> bool {
        self.commands.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.commands.can_redo()
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.engine.graph.to_snapshot()
    }

    pub fn lint(&self) -> Vec<LintDiagnostic> {
        lint_graph(&self.engine.graph)
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Handle one input event. Returns true if the host should redraw.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        let before = (
            self.engine.revision(),
            self.gesture.gesture(),
            self.menu.is_some(),
            self.selection,
        );

        match event {
            InputEvent::Key { key, modifiers } => self.handle_key(key, *modifiers),
            InputEvent::ContextMenu { x, y } => self.open_menu(Point::new(*x, *y)),
            InputEvent::DoubleClick { x, y } => self.double_click(Point::new(*x, *y)),
            InputEvent::Blur => {
                self.menu = None;
                self.cancel_gesture();
            }
            InputEvent::PointerDown { .. } | InputEvent::PointerMove { .. } | InputEvent::PointerUp { .. } => {
                self.handle_pointer(event)
            }
        }

        let after = (
            self.engine.revision(),
            self.gesture.gesture(),
            self.menu.is_some(),
            self.selection,
        );
        before != after || matches!(self.gesture.gesture(), Gesture::CreatingTransition { .. })
    }

    fn pointer_context(&self, p: Point) -> PointerContext {
        let graph = &self.engine.graph;
        let dims = &self.engine.dims;
        let hit = hit_test(graph, dims, &self.config.geometry, &self.config.hit, p);
        let over_state = match hit {
            HitTarget::State(id) | HitTarget::AnchorHandle { state: id, .. } => Some(id),
            _ => state_at(graph, dims, p),
        };
        PointerContext { hit, over_state }
    }

    fn handle_pointer(&mut self, event: &InputEvent) {
        let ctx = match event.position() {
            Some(p) => self.pointer_context(p),
            None => PointerContext::NONE,
        };

        if let InputEvent::PointerDown { .. } = event {
            if self.menu.take().is_some() {
                log::debug!("context menu dismissed");
            }
            if self.gesture.is_idle() {
                self.select(ctx.hit);
            }
        }

        let was_batched = self.gesture.is_batched();
        let mutations = self.gesture.handle(event, ctx, &self.engine.graph);
        if !was_batched && self.gesture.is_batched() {
            let description = match self.gesture.gesture() {
                Gesture::DraggingWaypoint { .. } => "Move waypoint",
                _ => "Move state",
            };
            self.commands.begin_batch(&self.engine, description);
        }

        for mutation in mutations {
            match self.commands.execute(&mut self.engine, mutation) {
                Ok(Applied::Waypoint(index)) => self.gesture.waypoint_moved(index),
                Ok(Applied::TransitionAdded(id)) => self.selection = Selection::Transition(id),
                Ok(_) => {}
                Err(e) => {
                    // The gesture's target was removed underneath it.
                    log::debug!("gesture dropped: {}", e.into_stale());
                    self.gesture.cancel();
                }
            }
        }

        if self.commands.is_batching() && !self.gesture.is_batched() {
            self.commands.end_batch(&self.engine);
        }
    }

    fn select(&mut self, hit: HitTarget) {
        self.selection = match hit {
            HitTarget::State(id) => Selection::State(id),
            HitTarget::Transition(id) | HitTarget::Waypoint { transition: id, .. } => Selection::Transition(id),
            HitTarget::AnchorHandle { .. } => self.selection,
            HitTarget::Canvas => Selection::None,
        };
    }

    fn handle_key(&mut self, key: &str, modifiers: Modifiers) {
        match ShortcutMap::resolve(key, modifiers) {
            Some(ShortcutAction::Cancel) => {
                self.menu = None;
                self.cancel_gesture();
            }
            Some(ShortcutAction::Delete) => self.delete_selection(),
            Some(ShortcutAction::Undo) => {
                self.undo();
            }
            Some(ShortcutAction::Redo) => {
                self.redo();
            }
            None => {}
        }
    }

    /// Abort the active gesture. Drag moves already applied stay applied.
    pub fn cancel_gesture(&mut self) {
        self.gesture.cancel();
        if self.commands.is_batching() {
            self.commands.end_batch(&self.engine);
        }
    }

    fn delete_selection(&mut self) {
        if !self.gesture.is_idle() {
            return;
        }
        let mutation = match self.selection {
            Selection::None => return,
            Selection::State(id) if self.is_admin => GraphMutation::DeleteState { id },
            Selection::State(_) => {
                log::debug!("deleting a state requires admin");
                return;
            }
            Selection::Transition(id) => GraphMutation::DeleteTransition { id },
        };
        self.commit_logged(mutation);
    }

    /// Double-clicking a transition drops a waypoint where it was clicked.
    fn double_click(&mut self, p: Point) {
        if !self.gesture.is_idle() {
            return;
        }
        self.menu = None;
        let graph = &self.engine.graph;
        let HitTarget::Transition(id) = hit_test(graph, &self.engine.dims, &self.config.geometry, &self.config.hit, p)
        else {
            return;
        };
        let Some(routed) = graph
            .transition(id)
            .and_then(|t| route_in_graph(graph, t, &self.engine.dims, &self.config.geometry))
        else {
            return;
        };
        let index = insertion_index(&routed.path, p);
        self.commit_logged(GraphMutation::AddWaypoint {
            transition: id,
            point: p,
            index: Some(index),
        });
    }

    // ─── Context menu ────────────────────────────────────────────────────

    fn open_menu(&mut self, p: Point) {
        if !self.gesture.is_idle() {
            log::debug!("context menu suppressed during {:?}", self.gesture.gesture());
            return;
        }
        let hit = hit_test(&self.engine.graph, &self.engine.dims, &self.config.geometry, &self.config.hit, p);
        let target = MenuTarget::from_hit(hit, &self.engine.graph);
        self.menu = Some(ContextMenu::open(target, p, &self.engine.graph, self.is_admin));
    }

    pub fn close_menu(&mut self) {
        self.menu = None;
    }

    /// Run a menu action and close the menu. Edit actions hand an
    /// `EditRequest` back to the host; everything else applies directly.
    pub fn dispatch_menu_action(&mut self, action: MenuAction) -> Option<EditRequest> {
        let Some(menu) = self.menu.take() else {
            log::debug!("{action:?} dispatched with no open menu");
            return None;
        };
        let command = menu.resolve(
            action,
            &self.engine.graph,
            &self.engine.dims,
            &self.config.geometry,
            self.is_admin,
        )?;
        match command {
            MenuCommand::Edit(request) => Some(request),
            MenuCommand::Mutate(mutation) => {
                if let Some(applied) = self.commit_logged(mutation)
                    && applied != Applied::Noop
                    && let Some(message) = action.success_message()
                {
                    self.engine.notify(Severity::Success, message);
                }
                None
            }
        }
    }

    // ─── Direct edits ────────────────────────────────────────────────────

    /// Apply a host-originated mutation (e.g. the result of an edit dialog)
    /// as one undo step.
    pub fn commit(&mut self, mutation: GraphMutation) -> GraphResult<Applied> {
        let applied = self.commands.execute(&mut self.engine, mutation)?;
        self.prune_selection();
        Ok(applied)
    }

    fn commit_logged(&mut self, mutation: GraphMutation) -> Option<Applied> {
        let description = mutation.describe();
        match self.commit(mutation) {
            Ok(applied) => Some(applied),
            Err(e) => {
                log::debug!("{description} dropped: {e}");
                None
            }
        }
    }

    pub fn undo(&mut self) -> Option<String> {
        if !self.gesture.is_idle() {
            return None;
        }
        let desc = self.commands.undo(&mut self.engine);
        self.prune_selection();
        desc
    }

    pub fn redo(&mut self) -> Option<String> {
        if !self.gesture.is_idle() {
            return None;
        }
        let desc = self.commands.redo(&mut self.engine);
        self.prune_selection();
        desc
    }

    fn prune_selection(&mut self) {
        let live = match self.selection {
            Selection::None => true,
            Selection::State(id) => self.engine.graph.contains_state(id),
            Selection::Transition(id) => self.engine.graph.contains_transition(id),
        };
        if !live {
            self.selection = Selection::None;
        }
    }

    // ─── Renderer contract ───────────────────────────────────────────────

    /// Renderer callback with a state's measured size.
    pub fn report_dimensions(&mut self, id: StateId, dims: Dimensions) -> bool {
        self.engine.report_dimensions(id, dims)
    }

    /// Everything the renderer needs for one frame.
    pub fn frame(&self) -> RenderFrame {
        let graph = &self.engine.graph;
        let dims = &self.engine.dims;
        let preview = self.gesture.preview(graph, dims, &self.config.geometry);
        let mut frame = build_frame(graph, dims, &self.config.geometry, preview);
        frame.highlight = match self.selection {
            Selection::None => None,
            Selection::State(id) => Some(Highlight::State(id)),
            Selection::Transition(id) => Some(Highlight::Transition(id)),
        };
        frame
    }
}
