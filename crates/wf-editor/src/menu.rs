//! Context menu controller.
//!
//! A right-click resolves to a `MenuTarget`; the menu lists exactly the
//! actions valid for that target. Dispatch re-resolves the target against the
//! current graph, so an action whose target vanished while the menu was open
//! resolves to nothing.

use crate::sync::GraphMutation;
use wf_core::*;
use wf_render::HitTarget;

/// Label given to gates created from the menu.
pub const DEFAULT_GATE_LABEL: &str = "New Gate";

/// What the menu was opened on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuTarget {
    Canvas,
    State(StateId),
    Transition(TransitionId),
    Waypoint {
        transition: TransitionId,
        index: usize,
        /// Where the waypoint was when the menu opened.
        point: Point,
    },
}

impl MenuTarget {
    /// Map a hit-test result to a menu target. Anchor handles count as
    /// their state.
    pub fn from_hit(hit: HitTarget, graph: &WorkflowGraph) -> Self {
        match hit {
            HitTarget::Canvas => MenuTarget::Canvas,
            HitTarget::State(id) | HitTarget::AnchorHandle { state: id, .. } => MenuTarget::State(id),
            HitTarget::Transition(id) => MenuTarget::Transition(id),
            HitTarget::Waypoint { transition, index } => {
                match graph.transition(transition).and_then(|t| t.waypoints.get(index)) {
                    Some(&point) => MenuTarget::Waypoint {
                        transition,
                        index,
                        point,
                    },
                    None => MenuTarget::Transition(transition),
                }
            }
        }
    }

    /// Fails with `StaleTargetReference` once the entity the menu was opened
    /// on has been deleted, or the waypoint can no longer be found.
    pub fn ensure_live(&self, graph: &WorkflowGraph) -> GraphResult<()> {
        let stale = match *self {
            MenuTarget::Canvas => None,
            MenuTarget::State(id) => (!graph.contains_state(id)).then(|| id.to_string()),
            MenuTarget::Transition(id) => (!graph.contains_transition(id)).then(|| id.to_string()),
            MenuTarget::Waypoint {
                transition,
                index,
                point,
            } => match graph.transition(transition) {
                None => Some(transition.to_string()),
                Some(t) => current_index(t, index, point, graph.waypoint_epsilon())
                    .is_none()
                    .then(|| format!("{transition}[{index}]")),
            },
        };
        match stale {
            Some(id) => Err(GraphError::StaleTargetReference { id }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    AddState,
    EditState,
    DeleteState,
    EditTransition,
    DeleteTransition,
    AddGate,
    ResetWaypoints,
    AddAdjacentWaypoint,
    RemoveWaypoint,
    ResetAllWaypoints,
}

impl MenuAction {
    pub fn label(self) -> &'static str {
        match self {
            MenuAction::AddState => "Add State",
            MenuAction::EditState | MenuAction::EditTransition => "Edit",
            MenuAction::DeleteState | MenuAction::DeleteTransition => "Delete",
            MenuAction::AddGate => "Add Gate",
            MenuAction::ResetWaypoints => "Reset Waypoints",
            MenuAction::AddAdjacentWaypoint => "Add Waypoint",
            MenuAction::RemoveWaypoint => "Remove Waypoint",
            MenuAction::ResetAllWaypoints => "Reset All Waypoints",
        }
    }

    /// Confirmation toast shown after the action applies.
    pub fn success_message(self) -> Option<&'static str> {
        match self {
            MenuAction::ResetWaypoints | MenuAction::ResetAllWaypoints => Some("Control points reset"),
            _ => None,
        }
    }

    fn privileged(self) -> bool {
        matches!(self, MenuAction::EditState | MenuAction::DeleteState)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub action: MenuAction,
    pub label: &'static str,
    pub enabled: bool,
}

/// Host-side edit dialog request. The host commits the result with the
/// matching rename mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum EditRequest {
    State {
        id: StateId,
        label: String,
    },
    Transition {
        id: TransitionId,
        label: Option<String>,
        gates: Vec<(GateId, String)>,
    },
}

/// Outcome of dispatching a menu action.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuCommand {
    Mutate(GraphMutation),
    Edit(EditRequest),
}

/// An open context menu.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    pub target: MenuTarget,
    /// Canvas position the menu was opened at.
    pub position: Point,
    pub items: Vec<MenuItem>,
}

impl ContextMenu {
    pub fn open(target: MenuTarget, position: Point, graph: &WorkflowGraph, is_admin: bool) -> Self {
        let actions: &[MenuAction] = match target {
            MenuTarget::Canvas => &[MenuAction::AddState],
            MenuTarget::State(_) => &[MenuAction::EditState, MenuAction::DeleteState],
            MenuTarget::Transition(_) => &[
                MenuAction::EditTransition,
                MenuAction::DeleteTransition,
                MenuAction::AddGate,
                MenuAction::ResetWaypoints,
            ],
            MenuTarget::Waypoint { .. } => &[
                MenuAction::AddAdjacentWaypoint,
                MenuAction::RemoveWaypoint,
                MenuAction::ResetAllWaypoints,
            ],
        };

        let has_waypoints = match target {
            MenuTarget::Transition(id) => graph.transition(id).is_some_and(|t| !t.waypoints.is_empty()),
            _ => true,
        };

        let items = actions
            .iter()
            .map(|&action| MenuItem {
                action,
                label: action.label(),
                enabled: match action {
                    a if a.privileged() => is_admin,
                    MenuAction::ResetWaypoints => has_waypoints,
                    _ => true,
                },
            })
            .collect();

        log::debug!("context menu opened on {target:?}");
        Self {
            target,
            position,
            items,
        }
    }

    pub fn item(&self, action: MenuAction) -> Option<&MenuItem> {
        self.items.iter().find(|i| i.action == action)
    }

    pub fn is_enabled(&self, action: MenuAction) -> bool {
        self.item(action).is_some_and(|i| i.enabled)
    }

    /// Resolve `action` against the current graph. `None` means the action
    /// is not offered here, is disabled, or its target is gone.
    pub fn resolve(
        &self,
        action: MenuAction,
        graph: &WorkflowGraph,
        dims: &DimensionCache,
        geometry: &GeometryConfig,
        is_admin: bool,
    ) -> Option<MenuCommand> {
        if self.item(action).is_none() {
            log::debug!("{action:?} is not offered for {:?}", self.target);
            return None;
        }
        if action.privileged() && !is_admin {
            log::debug!("{action:?} requires admin");
            return None;
        }
        if let Err(e) = self.target.ensure_live(graph) {
            log::debug!("{action:?} dropped: {e}");
            return None;
        }

        let command = match (self.target, action) {
            (MenuTarget::Canvas, MenuAction::AddState) => Some(MenuCommand::Mutate(GraphMutation::AddState {
                position: self.position,
            })),

            (MenuTarget::State(id), MenuAction::EditState) => graph.state(id).map(|s| {
                MenuCommand::Edit(EditRequest::State {
                    id,
                    label: s.label.clone(),
                })
            }),
            (MenuTarget::State(id), MenuAction::DeleteState) => graph
                .contains_state(id)
                .then_some(MenuCommand::Mutate(GraphMutation::DeleteState { id })),

            (MenuTarget::Transition(id), action) => graph.transition(id).and_then(|t| match action {
                MenuAction::EditTransition => Some(MenuCommand::Edit(EditRequest::Transition {
                    id,
                    label: t.label.clone(),
                    gates: t.gates.iter().map(|g| (g.id, g.label.clone())).collect(),
                })),
                MenuAction::DeleteTransition => Some(MenuCommand::Mutate(GraphMutation::DeleteTransition { id })),
                MenuAction::AddGate => Some(MenuCommand::Mutate(GraphMutation::AddGate {
                    transition: id,
                    label: DEFAULT_GATE_LABEL.to_string(),
                })),
                MenuAction::ResetWaypoints if !t.waypoints.is_empty() => {
                    Some(MenuCommand::Mutate(GraphMutation::ResetWaypoints { transition: id }))
                }
                _ => None,
            }),

            (
                MenuTarget::Waypoint {
                    transition,
                    index,
                    point,
                },
                action,
            ) => {
                let t = graph.transition(transition)?;
                let index = current_index(t, index, point, graph.waypoint_epsilon())?;
                match action {
                    MenuAction::AddAdjacentWaypoint => {
                        let next = match t.waypoints.get(index + 1) {
                            Some(&next) => next,
                            None => route_in_graph(graph, t, dims, geometry)?.end.point,
                        };
                        Some(MenuCommand::Mutate(GraphMutation::AddWaypoint {
                            transition,
                            point: t.waypoints[index].midpoint(next),
                            index: Some(index + 1),
                        }))
                    }
                    MenuAction::RemoveWaypoint => {
                        Some(MenuCommand::Mutate(GraphMutation::RemoveWaypoint { transition, index }))
                    }
                    MenuAction::ResetAllWaypoints => {
                        Some(MenuCommand::Mutate(GraphMutation::ResetWaypoints { transition }))
                    }
                    _ => None,
                }
            }

            _ => None,
        };

        if command.is_none() {
            log::debug!("{action:?} on {:?}: target no longer applies", self.target);
        }
        command
    }
}

/// Find the waypoint the menu was opened on, which may have shifted index.
fn current_index(t: &WorkflowTransition, index: usize, point: Point, epsilon: f32) -> Option<usize> {
    if t.waypoints.get(index).is_some_and(|w| w.approx_eq(point, epsilon)) {
        return Some(index);
    }
    t.waypoints.iter().position(|w| w.approx_eq(point, epsilon))
}
