//! `gatecraft`: inspect saved workflow graphs from the command line.
//!
//! ```text
//! gatecraft lint <snapshot.json|snapshot.msgpack>
//! gatecraft svg  <snapshot.json|snapshot.msgpack>
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use wf_core::{DimensionCache, GeometryConfig, GraphError, GraphSnapshot, LintSeverity, WorkflowGraph, lint_graph};
use wf_render::{build_frame, render_svg};

#[derive(Error, Debug)]
enum CliError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Parser, Debug)]
#[command(name = "gatecraft")]
#[command(about = "Inspect saved workflow graphs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Report structural problems in a snapshot.
    Lint { path: PathBuf },
    /// Render a snapshot as a standalone SVG document.
    Svg { path: PathBuf },
}

fn load(path: &Path) -> Result<WorkflowGraph, CliError> {
    let read_err = |source| CliError::Read {
        path: path.display().to_string(),
        source,
    };
    let snapshot = if path.extension().is_some_and(|e| e == "msgpack") {
        GraphSnapshot::from_msgpack(&std::fs::read(path).map_err(read_err)?)?
    } else {
        GraphSnapshot::from_json(&std::fs::read_to_string(path).map_err(read_err)?)?
    };
    let graph = WorkflowGraph::from_snapshot(snapshot)?;
    log::info!(
        "loaded {}: {} states, {} transitions, {} gates",
        path.display(),
        graph.state_count(),
        graph.transition_count(),
        graph.gate_count()
    );
    Ok(graph)
}

fn lint_report(graph: &WorkflowGraph) -> String {
    let diags = lint_graph(graph);
    if diags.is_empty() {
        return "no problems found\n".to_string();
    }
    let mut out = String::new();
    for d in &diags {
        let level = match d.severity {
            LintSeverity::Warning => "warning",
            LintSeverity::Info => "info",
        };
        out.push_str(&format!("{level}[{}] {}: {}\n", d.rule, d.target, d.message));
    }
    out
}

fn svg_document(graph: &WorkflowGraph) -> String {
    let frame = build_frame(graph, &DimensionCache::default(), &GeometryConfig::default(), None);
    render_svg(&frame)
}

fn run(command: &Command) -> Result<String, CliError> {
    Ok(match command {
        Command::Lint { path } => lint_report(&load(path)?),
        Command::Svg { path } => svg_document(&load(path)?),
    })
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli.command) {
        Ok(out) => {
            print!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("gatecraft: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use wf_core::Point;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("gatecraft").chain(args.iter().copied()))
    }

    #[test]
    fn bad_arguments_are_rejected() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["fmt", "a.json"]).is_err());
        assert!(parse(&["lint"]).is_err());
        assert_eq!(
            parse(&["svg", "a.json"]).unwrap().command,
            Command::Svg {
                path: PathBuf::from("a.json")
            }
        );
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gatecraft.json");
        let err = run(&Command::Lint { path: path.clone() }).unwrap_err();
        assert!(matches!(err, CliError::Read { .. }));
        assert!(err.to_string().starts_with(&format!("cannot read {}", path.display())));
    }

    #[test]
    fn lint_report_lists_rules() {
        let mut graph = WorkflowGraph::new();
        graph.add_state(Point::new(0.0, 0.0));
        graph.add_state(Point::new(300.0, 0.0));
        let report = lint_report(&graph);
        assert!(report.contains("warning[isolated-state]"));
        assert!(report.contains("duplicate-label"));
        assert_eq!(lint_report(&WorkflowGraph::new()), "no problems found\n");
    }

    #[test]
    fn svg_round_trips_through_a_file() {
        let mut graph = WorkflowGraph::new();
        let a = graph.add_state(Point::new(0.0, 0.0)).id;
        let b = graph.add_state(Point::new(300.0, 0.0)).id;
        graph.add_transition(a, b).unwrap();

        let mut file = tempfile::Builder::new().suffix(".msgpack").tempfile().unwrap();
        file.write_all(&graph.to_snapshot().to_msgpack().unwrap()).unwrap();
        let svg = run(&Command::Svg {
            path: file.path().to_path_buf(),
        })
        .unwrap();

        assert_eq!(svg.matches("<rect").count(), 2);
        assert_eq!(svg.matches("marker-end").count(), 1);
    }

    #[test]
    fn json_snapshot_is_linted() {
        let mut graph = WorkflowGraph::new();
        graph.add_state(Point::new(0.0, 0.0));

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(graph.to_snapshot().to_json().unwrap().as_bytes()).unwrap();
        let report = run(&Command::Lint {
            path: file.path().to_path_buf(),
        })
        .unwrap();
        assert!(report.contains("isolated-state"));
    }
}
