//! Geometry engine: anchors on state bounding boxes and transition curves.
//!
//! Everything here is a pure function of its inputs. Coincident endpoints
//! never divide by zero: they produce a small loop that leaves and re-enters
//! the anchor's edge.

use crate::model::{Dimensions, DimensionCache, Point, WorkflowGraph, WorkflowState, WorkflowTransition};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

/// Tunables consumed by the geometry functions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Perpendicular offset of a default curve's control point.
    pub curve_offset: f32,
    /// Reach of the loop drawn for coincident endpoints and self-loops.
    pub loop_radius: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            curve_offset: 30.0,
            loop_radius: 24.0,
        }
    }
}

// ─── Anchors ─────────────────────────────────────────────────────────────

/// Which edge of the bounding box an anchor sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl AnchorSide {
    /// Declaration order; also the tie-break order for `nearest_anchor`.
    pub const ALL: [AnchorSide; 4] = [
        AnchorSide::Top,
        AnchorSide::Bottom,
        AnchorSide::Left,
        AnchorSide::Right,
    ];

    /// Unit vector pointing out of the box through this edge.
    pub fn outward(self) -> (f32, f32) {
        match self {
            AnchorSide::Top => (0.0, -1.0),
            AnchorSide::Bottom => (0.0, 1.0),
            AnchorSide::Left => (-1.0, 0.0),
            AnchorSide::Right => (1.0, 0.0),
        }
    }

    /// Offset direction for a default curve's control point leaving this edge.
    /// Top/bottom anchors bend sideways, left/right anchors bend downward.
    fn bend(self) -> (f32, f32) {
        match self {
            AnchorSide::Top | AnchorSide::Bottom => (1.0, 0.0),
            AnchorSide::Left | AnchorSide::Right => (0.0, 1.0),
        }
    }
}

/// A connection point at the midpoint of one bounding-box edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub side: AnchorSide,
    pub point: Point,
}

/// The four anchors of one state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchors {
    pub top: Anchor,
    pub bottom: Anchor,
    pub left: Anchor,
    pub right: Anchor,
}

impl Anchors {
    pub fn get(&self, side: AnchorSide) -> Anchor {
        match side {
            AnchorSide::Top => self.top,
            AnchorSide::Bottom => self.bottom,
            AnchorSide::Left => self.left,
            AnchorSide::Right => self.right,
        }
    }

    /// All four in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Anchor> + '_ {
        AnchorSide::ALL.into_iter().map(|side| self.get(side))
    }
}

/// Anchors of the box centered at `state.position`. Unmeasured states use
/// `fallback` for their size.
pub fn anchors_of(state: &WorkflowState, dims: Option<Dimensions>, fallback: Dimensions) -> Anchors {
    let d = dims.unwrap_or(fallback);
    let c = state.position;
    let (hw, hh) = (d.width / 2.0, d.height / 2.0);
    Anchors {
        top: Anchor {
            side: AnchorSide::Top,
            point: c.offset(0.0, -hh),
        },
        bottom: Anchor {
            side: AnchorSide::Bottom,
            point: c.offset(0.0, hh),
        },
        left: Anchor {
            side: AnchorSide::Left,
            point: c.offset(-hw, 0.0),
        },
        right: Anchor {
            side: AnchorSide::Right,
            point: c.offset(hw, 0.0),
        },
    }
}

/// Anchors of a state using the measured size from `cache`.
pub fn anchors_cached(state: &WorkflowState, cache: &DimensionCache) -> Anchors {
    anchors_of(state, cache.measured(state.id), cache.fallback())
}

/// The anchor closest to `point`. Ties go to the earlier side in
/// top, bottom, left, right order.
pub fn nearest_anchor(anchors: &Anchors, point: Point) -> Anchor {
    let mut best = anchors.top;
    let mut best_dist = best.point.distance(point);
    for anchor in anchors.iter().skip(1) {
        let d = anchor.point.distance(point);
        if d < best_dist {
            best = anchor;
            best_dist = d;
        }
    }
    best
}

// ─── Paths ───────────────────────────────────────────────────────────────

/// One drawing command after the path's start point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathSegment {
    Line { to: Point },
    Quad { control: Point, to: Point },
    Cubic { c1: Point, c2: Point, to: Point },
}

impl PathSegment {
    pub fn end(&self) -> Point {
        match *self {
            PathSegment::Line { to } | PathSegment::Quad { to, .. } | PathSegment::Cubic { to, .. } => to,
        }
    }
}

/// Renderer-facing description of a transition's path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSpec {
    pub start: Point,
    pub segments: SmallVec<[PathSegment; 4]>,
}

impl PathSpec {
    pub fn end(&self) -> Point {
        self.segments.last().map_or(self.start, PathSegment::end)
    }

    /// Control point of a single-quad path, i.e. a default curve.
    pub fn quad_control(&self) -> Option<Point> {
        match self.segments.as_slice() {
            [PathSegment::Quad { control, .. }] => Some(*control),
            _ => None,
        }
    }

    /// Point along the path's final segment used to orient an arrowhead.
    pub fn arrow_tail(&self) -> Point {
        let prev = if self.segments.len() > 1 {
            self.segments[self.segments.len() - 2].end()
        } else {
            self.start
        };
        match self.segments.last() {
            Some(PathSegment::Quad { control, .. }) => *control,
            Some(PathSegment::Cubic { c2, .. }) => *c2,
            _ => prev,
        }
    }
}

/// Quadratic curve from `start` to `end`, bowed away from the straight line
/// by `config.curve_offset`.
pub fn route_curve(start: Anchor, end: Point, config: &GeometryConfig) -> PathSpec {
    if start.point.distance(end) <= f32::EPSILON {
        return loop_at(start, config);
    }
    let (bx, by) = start.side.bend();
    let control = start
        .point
        .midpoint(end)
        .offset(bx * config.curve_offset, by * config.curve_offset);
    PathSpec {
        start: start.point,
        segments: smallvec![PathSegment::Quad { control, to: end }],
    }
}

/// Straight segments from `start` through every waypoint to `end`.
pub fn route_through(start: Point, waypoints: &[Point], end: Point) -> PathSpec {
    let segments = waypoints
        .iter()
        .chain(std::iter::once(&end))
        .map(|&to| PathSegment::Line { to })
        .collect();
    PathSpec { start, segments }
}

/// A cubic loop that leaves `anchor` outward and returns to it.
pub fn loop_at(anchor: Anchor, config: &GeometryConfig) -> PathSpec {
    let (nx, ny) = anchor.side.outward();
    // Tangent along the edge, so the loop opens sideways.
    let (tx, ty) = (-ny, nx);
    let r = config.loop_radius;
    let p = anchor.point;
    let c1 = p.offset(nx * 2.0 * r - tx * r, ny * 2.0 * r - ty * r);
    let c2 = p.offset(nx * 2.0 * r + tx * r, ny * 2.0 * r + ty * r);
    PathSpec {
        start: p,
        segments: smallvec![PathSegment::Cubic { c1, c2, to: p }],
    }
}

/// Resolved endpoints and path of a committed transition.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedTransition {
    pub start: Anchor,
    pub end: Anchor,
    pub path: PathSpec,
}

/// Route a transition between its endpoint states.
///
/// Without waypoints the source anchor faces the target's center and the
/// target anchor faces the chosen source anchor; a self-loop leaves and
/// re-enters the top anchor. With waypoints each end snaps to the anchor
/// nearest its adjacent waypoint.
pub fn route_transition(
    transition: &WorkflowTransition,
    from: &WorkflowState,
    to: &WorkflowState,
    dims: &DimensionCache,
    config: &GeometryConfig,
) -> RoutedTransition {
    let src = anchors_cached(from, dims);
    let dst = anchors_cached(to, dims);

    if let (Some(first), Some(last)) = (transition.waypoints.first(), transition.waypoints.last()) {
        let start = nearest_anchor(&src, *first);
        let end = nearest_anchor(&dst, *last);
        return RoutedTransition {
            start,
            end,
            path: route_through(start.point, &transition.waypoints, end.point),
        };
    }

    if transition.is_self_loop() {
        let top = src.top;
        return RoutedTransition {
            start: top,
            end: top,
            path: loop_at(top, config),
        };
    }

    let start = nearest_anchor(&src, to.position);
    let end = nearest_anchor(&dst, start.point);
    RoutedTransition {
        start,
        end,
        path: route_curve(start, end.point, config),
    }
}

/// Route a transition by id, resolving both endpoints in `graph`.
pub fn route_in_graph(
    graph: &WorkflowGraph,
    transition: &WorkflowTransition,
    dims: &DimensionCache,
    config: &GeometryConfig,
) -> Option<RoutedTransition> {
    let from = graph.state(transition.from)?;
    let to = graph.state(transition.to)?;
    Some(route_transition(transition, from, to, dims, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::StateId;
    use pretty_assertions::assert_eq;

    fn state_at(name: &str, x: f32, y: f32) -> WorkflowState {
        WorkflowState::new(StateId::intern(name), name, Point::new(x, y))
    }

    #[test]
    fn anchors_sit_on_edge_midpoints() {
        let s = state_at("a", 100.0, 50.0);
        let a = anchors_of(&s, Some(Dimensions::new(80.0, 40.0)), Dimensions::default());
        assert_eq!(a.top.point, Point::new(100.0, 30.0));
        assert_eq!(a.bottom.point, Point::new(100.0, 70.0));
        assert_eq!(a.left.point, Point::new(60.0, 50.0));
        assert_eq!(a.right.point, Point::new(140.0, 50.0));
    }

    #[test]
    fn anchors_fall_back_to_default_size() {
        let s = state_at("b", 0.0, 0.0);
        let a = anchors_of(&s, None, Dimensions::new(160.0, 60.0));
        assert_eq!(a.right.point, Point::new(80.0, 0.0));
        assert_eq!(a.top.point, Point::new(0.0, -30.0));
    }

    #[test]
    fn nearest_anchor_picks_closest() {
        let s = state_at("c", 0.0, 0.0);
        let a = anchors_of(&s, None, Dimensions::new(100.0, 100.0));
        assert_eq!(nearest_anchor(&a, Point::new(300.0, 10.0)).side, AnchorSide::Right);
        assert_eq!(nearest_anchor(&a, Point::new(5.0, -200.0)).side, AnchorSide::Top);
    }

    #[test]
    fn nearest_anchor_ties_follow_declared_order() {
        let s = state_at("d", 0.0, 0.0);
        let a = anchors_of(&s, None, Dimensions::new(100.0, 100.0));
        // Center is equidistant from all four.
        for _ in 0..3 {
            assert_eq!(nearest_anchor(&a, Point::new(0.0, 0.0)).side, AnchorSide::Top);
        }
        // Equidistant from bottom and right.
        assert_eq!(nearest_anchor(&a, Point::new(60.0, 60.0)).side, AnchorSide::Bottom);
        // Equidistant from left and top.
        assert_eq!(nearest_anchor(&a, Point::new(-60.0, -60.0)).side, AnchorSide::Top);
    }

    #[test]
    fn route_curve_bends_by_start_edge() {
        let cfg = GeometryConfig::default();
        let right = Anchor {
            side: AnchorSide::Right,
            point: Point::new(80.0, 0.0),
        };
        let path = route_curve(right, Point::new(120.0, 0.0), &cfg);
        assert_eq!(path.quad_control(), Some(Point::new(100.0, 30.0)));

        let bottom = Anchor {
            side: AnchorSide::Bottom,
            point: Point::new(0.0, 30.0),
        };
        let path = route_curve(bottom, Point::new(0.0, 130.0), &cfg);
        assert_eq!(path.quad_control(), Some(Point::new(30.0, 80.0)));
    }

    #[test]
    fn coincident_endpoints_make_a_loop() {
        let cfg = GeometryConfig::default();
        let top = Anchor {
            side: AnchorSide::Top,
            point: Point::new(0.0, -30.0),
        };
        let path = route_curve(top, top.point, &cfg);
        assert_eq!(path.start, top.point);
        assert_eq!(path.end(), top.point);
        match path.segments[0] {
            PathSegment::Cubic { c1, c2, .. } => {
                assert!(c1.y < top.point.y && c2.y < top.point.y, "loop must leave upward");
                assert!(c1.x.is_finite() && c2.x.is_finite());
                assert!(c1 != c2);
            }
            other => panic!("expected cubic loop, got {other:?}"),
        }
    }

    #[test]
    fn route_through_visits_waypoints_in_order() {
        let wps = [Point::new(10.0, 10.0), Point::new(20.0, 40.0)];
        let path = route_through(Point::new(0.0, 0.0), &wps, Point::new(50.0, 50.0));
        let ends: Vec<Point> = path.segments.iter().map(PathSegment::end).collect();
        assert_eq!(ends, vec![wps[0], wps[1], Point::new(50.0, 50.0)]);
    }

    #[test]
    fn route_is_deterministic() {
        let cfg = GeometryConfig::default();
        let a = Anchor {
            side: AnchorSide::Left,
            point: Point::new(3.0, 4.0),
        };
        assert_eq!(
            route_curve(a, Point::new(-50.0, 9.0), &cfg),
            route_curve(a, Point::new(-50.0, 9.0), &cfg)
        );
    }
}
