//! Error taxonomy for graph mutations and snapshot decoding.
//!
//! Degenerate geometry is deliberately absent: the geometry engine falls back
//! to a loop shape instead of failing.

use thiserror::Error;

/// The kind of entity an id was expected to resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    State,
    Transition,
    Gate,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EntityKind::State => "state",
            EntityKind::Transition => "transition",
            EntityKind::Gate => "gate",
        })
    }
}

/// Errors raised by `WorkflowGraph` operations.
///
/// Every variant is recoverable: on error the graph is left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// A mutation referenced an id that does not resolve to a live entity.
    #[error("unknown {kind} `{id}`")]
    InvalidEndpoint { kind: EntityKind, id: String },

    /// A deferred action resolved against an id that was deleted meanwhile.
    #[error("target `{id}` no longer exists")]
    StaleTargetReference { id: String },

    /// A waypoint index outside the transition's waypoint list.
    #[error("waypoint index {index} out of range for `{transition}` ({len} waypoints)")]
    InvalidIndex {
        transition: String,
        index: usize,
        len: usize,
    },

    /// A snapshot could not be decoded or violated id uniqueness.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl GraphError {
    pub fn missing(kind: EntityKind, id: impl std::fmt::Display) -> Self {
        GraphError::InvalidEndpoint {
            kind,
            id: id.to_string(),
        }
    }

    /// Reclassify a missing id hit while replaying a deferred action
    /// (gesture step, menu dispatch) as a stale target.
    pub fn into_stale(self) -> Self {
        match self {
            GraphError::InvalidEndpoint { id, .. } => GraphError::StaleTargetReference { id },
            other => other,
        }
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(e: serde_json::Error) -> Self {
        GraphError::Snapshot(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for GraphError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        GraphError::Snapshot(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for GraphError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        GraphError::Snapshot(e.to_string())
    }
}

/// Result alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
