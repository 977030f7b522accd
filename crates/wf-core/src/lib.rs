pub mod error;
pub mod geometry;
pub mod id;
pub mod lint;
pub mod model;
pub mod snapshot;

pub use error::{EntityKind, GraphError, GraphResult};
pub use geometry::{
    Anchor, AnchorSide, Anchors, GeometryConfig, PathSegment, PathSpec, RoutedTransition,
    anchors_cached, anchors_of, loop_at, nearest_anchor, route_curve, route_in_graph, route_through,
    route_transition,
};
pub use id::{GateId, StateId, TransitionId};
pub use lint::{LintDiagnostic, LintSeverity, lint_graph};
pub use model::*;
pub use snapshot::{GateRecord, GraphSnapshot, TransitionRecord};
