//! Interaction state machine for canvas gestures.
//!
//! The machine turns pointer events into `GraphMutation`s. It never touches
//! the graph itself; the session applies what it emits. Only one gesture is
//! active at a time: a pointer-down is ignored unless the machine is idle.
//!
//! | Gesture | Starts on | Emits | Ends on |
//! |---------|-----------|-------|---------|
//! | `DraggingState` | pointer-down on a state body | `MoveState` per move | pointer-up, Escape, blur |
//! | `CreatingTransition` | pointer-down on an anchor handle | `AddTransition` once, on a valid pointer-up | pointer-up, Escape, blur |
//! | `DraggingWaypoint` | pointer-down on a waypoint handle | `MoveWaypoint` per move | pointer-up, Escape, blur |
//!
//! Drags apply every intermediate position, so cancelling one leaves the
//! last applied position in place.

use crate::input::InputEvent;
use crate::sync::GraphMutation;
use wf_core::*;
use wf_render::{GesturePreview, HitTarget};

/// What the user is currently doing on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Idle,
    DraggingState {
        state: StateId,
        /// State center minus the pointer at grab time.
        pointer_offset: (f32, f32),
    },
    CreatingTransition {
        from: StateId,
        side: AnchorSide,
        pointer: Point,
        /// A state other than `from` under the pointer.
        hover: Option<StateId>,
    },
    DraggingWaypoint {
        transition: TransitionId,
        index: usize,
    },
}

/// Hit-test results for the event position, resolved by the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerContext {
    pub hit: HitTarget,
    /// Topmost state whose body contains the pointer, handles included.
    pub over_state: Option<StateId>,
}

impl PointerContext {
    pub const NONE: PointerContext = PointerContext {
        hit: HitTarget::Canvas,
        over_state: None,
    };
}

#[derive(Debug, Clone)]
pub struct GestureMachine {
    gesture: Gesture,
}

impl Default for GestureMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureMachine {
    pub fn new() -> Self {
        Self { gesture: Gesture::Idle }
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    /// Drags apply many mutations that undo as one step.
    pub fn is_batched(&self) -> bool {
        matches!(
            self.gesture,
            Gesture::DraggingState { .. } | Gesture::DraggingWaypoint { .. }
        )
    }

    /// Abort to idle without committing anything. Returns the aborted gesture.
    pub fn cancel(&mut self) -> Gesture {
        let prev = std::mem::replace(&mut self.gesture, Gesture::Idle);
        if prev != Gesture::Idle {
            log::debug!("gesture cancelled: {prev:?}");
        }
        prev
    }

    /// The dragged waypoint merged into a neighbor and now lives at `index`.
    pub fn waypoint_moved(&mut self, index: usize) {
        if let Gesture::DraggingWaypoint { index: current, .. } = &mut self.gesture {
            *current = index;
        }
    }

    /// Handle one input event, returning zero or more mutations.
    pub fn handle(&mut self, event: &InputEvent, ctx: PointerContext, graph: &WorkflowGraph) -> Vec<GraphMutation> {
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                if !self.is_idle() {
                    log::trace!("pointer-down ignored during {:?}", self.gesture);
                    return vec![];
                }
                self.begin(Point::new(*x, *y), ctx, graph);
                vec![]
            }
            InputEvent::PointerMove { x, y, .. } => self.on_move(Point::new(*x, *y), ctx),
            InputEvent::PointerUp { .. } => self.on_up(ctx, graph),
            InputEvent::Blur => {
                self.cancel();
                vec![]
            }
            InputEvent::DoubleClick { .. } | InputEvent::ContextMenu { .. } | InputEvent::Key { .. } => vec![],
        }
    }

    fn begin(&mut self, p: Point, ctx: PointerContext, graph: &WorkflowGraph) {
        self.gesture = match ctx.hit {
            HitTarget::AnchorHandle { state, side } => Gesture::CreatingTransition {
                from: state,
                side,
                pointer: p,
                hover: None,
            },
            HitTarget::State(state) => match graph.state(state) {
                Some(s) => Gesture::DraggingState {
                    state,
                    pointer_offset: (s.position.x - p.x, s.position.y - p.y),
                },
                None => Gesture::Idle,
            },
            HitTarget::Waypoint { transition, index } => Gesture::DraggingWaypoint { transition, index },
            HitTarget::Transition(_) | HitTarget::Canvas => Gesture::Idle,
        };
        if self.gesture != Gesture::Idle {
            log::debug!("gesture started: {:?}", self.gesture);
        }
    }

    fn on_move(&mut self, p: Point, ctx: PointerContext) -> Vec<GraphMutation> {
        match &mut self.gesture {
            Gesture::Idle => vec![],
            Gesture::DraggingState { state, pointer_offset } => {
                let (dx, dy) = *pointer_offset;
                vec![GraphMutation::MoveState {
                    id: *state,
                    position: p.offset(dx, dy),
                }]
            }
            Gesture::CreatingTransition {
                from, pointer, hover, ..
            } => {
                *pointer = p;
                *hover = ctx.over_state.filter(|s| *s != *from);
                vec![]
            }
            Gesture::DraggingWaypoint { transition, index } => vec![GraphMutation::MoveWaypoint {
                transition: *transition,
                index: *index,
                point: p,
            }],
        }
    }

    fn on_up(&mut self, ctx: PointerContext, graph: &WorkflowGraph) -> Vec<GraphMutation> {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::CreatingTransition { from, .. } => match ctx.over_state {
                Some(to) if to != from && graph.contains_state(to) => {
                    vec![GraphMutation::AddTransition { from, to }]
                }
                _ => {
                    log::debug!("transition from {from} discarded");
                    vec![]
                }
            },
            // Drags already applied every move.
            Gesture::DraggingState { .. } | Gesture::DraggingWaypoint { .. } | Gesture::Idle => vec![],
        }
    }

    /// Live preview of the transition being drawn, if any.
    pub fn preview(
        &self,
        graph: &WorkflowGraph,
        dims: &DimensionCache,
        geometry: &GeometryConfig,
    ) -> Option<GesturePreview> {
        let Gesture::CreatingTransition {
            from,
            side,
            pointer,
            hover,
        } = self.gesture
        else {
            return None;
        };
        let start = anchors_cached(graph.state(from)?, dims).get(side);

        let snapped = hover
            .and_then(|id| graph.state(id))
            .map(|s| (s.id, nearest_anchor(&anchors_cached(s, dims), pointer)));

        Some(match snapped {
            Some((id, end)) => GesturePreview {
                from,
                path: route_curve(start, end.point, geometry),
                snapped_to: Some(id),
            },
            None => GesturePreview {
                from,
                path: route_curve(start, pointer, geometry),
                snapped_to: None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn graph() -> (WorkflowGraph, StateId, StateId) {
        let mut g = WorkflowGraph::new();
        let a = g.add_state(Point::new(0.0, 0.0)).id;
        let b = g.add_state(Point::new(300.0, 0.0)).id;
        (g, a, b)
    }

    fn on(hit: HitTarget, over_state: Option<StateId>) -> PointerContext {
        PointerContext { hit, over_state }
    }

    #[test]
    fn drag_state_emits_moves_with_offset() {
        let (g, a, _) = graph();
        let mut m = GestureMachine::new();
        m.handle(&InputEvent::pointer_down(10.0, 5.0), on(HitTarget::State(a), Some(a)), &g);
        assert!(m.is_batched());

        let out = m.handle(&InputEvent::pointer_move(30.0, 25.0), PointerContext::NONE, &g);
        assert_eq!(out, vec![GraphMutation::MoveState {
            id: a,
            position: Point::new(20.0, 20.0)
        }]);

        assert!(m.handle(&InputEvent::pointer_up(30.0, 25.0), PointerContext::NONE, &g).is_empty());
        assert!(m.is_idle());
    }

    #[test]
    fn transition_commits_only_on_distinct_state() {
        let (g, a, b) = graph();
        let mut m = GestureMachine::new();
        let handle = HitTarget::AnchorHandle {
            state: a,
            side: AnchorSide::Right,
        };

        m.handle(&InputEvent::pointer_down(80.0, 0.0), on(handle, Some(a)), &g);
        let out = m.handle(&InputEvent::pointer_up(300.0, 0.0), on(HitTarget::State(b), Some(b)), &g);
        assert_eq!(out, vec![GraphMutation::AddTransition { from: a, to: b }]);
        assert!(m.is_idle());

        m.handle(&InputEvent::pointer_down(80.0, 0.0), on(handle, Some(a)), &g);
        let out = m.handle(&InputEvent::pointer_up(10.0, 0.0), on(HitTarget::State(a), Some(a)), &g);
        assert!(out.is_empty());
        assert!(m.is_idle());
    }

    #[test]
    fn second_pointer_down_is_ignored() {
        let (g, a, b) = graph();
        let mut m = GestureMachine::new();
        m.handle(&InputEvent::pointer_down(0.0, 0.0), on(HitTarget::State(a), Some(a)), &g);
        m.handle(&InputEvent::pointer_down(300.0, 0.0), on(HitTarget::State(b), Some(b)), &g);
        assert!(matches!(m.gesture(), Gesture::DraggingState { state, .. } if state == a));
    }

    #[test]
    fn blur_cancels() {
        let (g, a, _) = graph();
        let mut m = GestureMachine::new();
        let handle = HitTarget::AnchorHandle {
            state: a,
            side: AnchorSide::Top,
        };
        m.handle(&InputEvent::pointer_down(0.0, -30.0), on(handle, Some(a)), &g);
        assert!(m.handle(&InputEvent::Blur, PointerContext::NONE, &g).is_empty());
        assert!(m.is_idle());
    }

    #[test]
    fn preview_snaps_to_hovered_state() {
        let (g, a, b) = graph();
        let dims = DimensionCache::default();
        let geo = GeometryConfig::default();
        let mut m = GestureMachine::new();
        let handle = HitTarget::AnchorHandle {
            state: a,
            side: AnchorSide::Right,
        };
        m.handle(&InputEvent::pointer_down(80.0, 0.0), on(handle, Some(a)), &g);

        m.handle(&InputEvent::pointer_move(150.0, 200.0), PointerContext::NONE, &g);
        let free = m.preview(&g, &dims, &geo).unwrap();
        assert!(free.dashed());
        assert_eq!(free.path.end(), Point::new(150.0, 200.0));

        m.handle(&InputEvent::pointer_move(240.0, 5.0), on(HitTarget::State(b), Some(b)), &g);
        let snapped = m.preview(&g, &dims, &geo).unwrap();
        assert_eq!(snapped.snapped_to, Some(b));
        assert_eq!(snapped.path.end(), Point::new(220.0, 0.0));
        assert_eq!(snapped.path.start, Point::new(80.0, 0.0));
    }

    #[test]
    fn hovering_origin_does_not_snap() {
        let (g, a, _) = graph();
        let mut m = GestureMachine::new();
        let handle = HitTarget::AnchorHandle {
            state: a,
            side: AnchorSide::Bottom,
        };
        m.handle(&InputEvent::pointer_down(0.0, 30.0), on(handle, Some(a)), &g);
        m.handle(&InputEvent::pointer_move(5.0, 5.0), on(HitTarget::State(a), Some(a)), &g);
        assert!(matches!(m.gesture(), Gesture::CreatingTransition { hover: None, .. }));
    }

    #[test]
    fn waypoint_drag_tracks_merged_index() {
        let (mut g, a, b) = graph();
        let t = g.add_transition(a, b).unwrap().id;
        g.add_waypoint(t, Point::new(100.0, 100.0), None).unwrap();
        g.add_waypoint(t, Point::new(200.0, 100.0), None).unwrap();

        let mut m = GestureMachine::new();
        m.handle(
            &InputEvent::pointer_down(200.0, 100.0),
            on(HitTarget::Waypoint { transition: t, index: 1 }, None),
            &g,
        );
        m.waypoint_moved(0);
        let out = m.handle(&InputEvent::pointer_move(120.0, 90.0), PointerContext::NONE, &g);
        assert_eq!(out, vec![GraphMutation::MoveWaypoint {
            transition: t,
            index: 0,
            point: Point::new(120.0, 90.0)
        }]);
    }
}
