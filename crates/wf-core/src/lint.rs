//! Structural lint for workflow graphs.
//!
//! Reports advisories without modifying the graph. Whether a transition is
//! allowed for a given role is not this module's business; only shape is.

use crate::model::WorkflowGraph;
use petgraph::Direction;
use petgraph::visit::Dfs;
use std::collections::{HashMap, HashSet};

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// Likely a modelling mistake.
    Warning,
    /// Worth a look, often intentional.
    Info,
}

/// A single lint diagnostic.
#[derive(Debug, Clone)]
pub struct LintDiagnostic {
    /// Id of the state, transition, or gate the finding refers to.
    pub target: String,
    pub message: String,
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "unreachable-state").
    pub rule: &'static str,
}

/// Run all lint rules.
#[must_use]
pub fn lint_graph(graph: &WorkflowGraph) -> Vec<LintDiagnostic> {
    let mut diags = Vec::new();
    lint_isolated_states(graph, &mut diags);
    lint_unreachable_states(graph, &mut diags);
    lint_duplicate_labels(graph, &mut diags);
    lint_empty_gate_labels(graph, &mut diags);
    lint_duplicate_transitions(graph, &mut diags);
    diags
}

// ─── Rules ────────────────────────────────────────────────────────────────

fn lint_isolated_states(graph: &WorkflowGraph, diags: &mut Vec<LintDiagnostic>) {
    if graph.state_count() < 2 {
        return;
    }
    for state in graph.states() {
        if graph.transitions().all(|t| !t.touches(state.id)) {
            diags.push(LintDiagnostic {
                target: state.id.to_string(),
                message: format!("State `{}` has no transitions.", state.label),
                severity: LintSeverity::Warning,
                rule: "isolated-state",
            });
        }
    }
}

/// States nothing can reach from an entry state (one with no incoming
/// transition from another state). A graph that is all cycles is entered
/// at its first state.
fn lint_unreachable_states(graph: &WorkflowGraph, diags: &mut Vec<LintDiagnostic>) {
    let pg = graph.petgraph();
    let mut entries: Vec<_> = graph
        .node_indices()
        .filter(|&idx| {
            pg.neighbors_directed(idx, Direction::Incoming)
                .all(|src| src == idx)
        })
        .collect();
    if entries.is_empty() {
        entries.extend(graph.node_indices().next());
    }

    let mut reached = HashSet::new();
    for entry in entries {
        let mut dfs = Dfs::new(pg, entry);
        while let Some(idx) = dfs.next(pg) {
            reached.insert(idx);
        }
    }

    for idx in graph.node_indices() {
        if !reached.contains(&idx) {
            let state = &pg[idx];
            diags.push(LintDiagnostic {
                target: state.id.to_string(),
                message: format!("State `{}` is unreachable from any entry state.", state.label),
                severity: LintSeverity::Warning,
                rule: "unreachable-state",
            });
        }
    }
}

fn lint_duplicate_labels(graph: &WorkflowGraph, diags: &mut Vec<LintDiagnostic>) {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for state in graph.states() {
        let n = seen.entry(state.label.as_str()).or_default();
        *n += 1;
        if *n == 2 {
            diags.push(LintDiagnostic {
                target: state.id.to_string(),
                message: format!("More than one state is labelled `{}`.", state.label),
                severity: LintSeverity::Warning,
                rule: "duplicate-label",
            });
        }
    }
}

fn lint_empty_gate_labels(graph: &WorkflowGraph, diags: &mut Vec<LintDiagnostic>) {
    for gate in graph.transitions().flat_map(|t| t.gates.iter()) {
        if gate.label.trim().is_empty() {
            diags.push(LintDiagnostic {
                target: gate.id.to_string(),
                message: format!("Gate on `{}` has an empty label.", gate.transition_id),
                severity: LintSeverity::Warning,
                rule: "empty-gate-label",
            });
        }
    }
}

fn lint_duplicate_transitions(graph: &WorkflowGraph, diags: &mut Vec<LintDiagnostic>) {
    let mut seen = HashSet::new();
    for t in graph.transitions() {
        if !seen.insert((t.from, t.to)) {
            diags.push(LintDiagnostic {
                target: t.id.to_string(),
                message: format!("Parallel transition from `{}` to `{}`.", t.from, t.to),
                severity: LintSeverity::Info,
                rule: "duplicate-transition",
            });
        }
    }
}
