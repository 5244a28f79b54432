//! Replay a JSON-lines request log through one shared optimizer

use anyhow::{Context, Result};
use futures::future::join_all;
use graphrag_cache::request::json_kind;
use graphrag_cache::{GraphType, OptimizationStats, SharedQueryOptimizer};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A log line that was not replayed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    /// 1-based line number
    pub line: usize,
    pub reason: String,
}

/// Requests parsed from a log, in file order
#[derive(Debug, Default)]
pub struct ReplayInput {
    pub requests: Vec<Value>,
    pub skipped: Vec<SkippedLine>,
}

/// Parse one JSON request per non-empty line; anything that is not an object is skipped
pub fn parse_requests(text: &str) -> ReplayInput {
    let mut input = ReplayInput::default();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(line) {
            Ok(value @ Value::Object(_)) => input.requests.push(value),
            Ok(other) => input.skipped.push(SkippedLine {
                line: line_no,
                reason: format!("expected object, found {}", json_kind(&other)),
            }),
            Err(e) => input.skipped.push(SkippedLine {
                line: line_no,
                reason: format!("invalid JSON: {}", e),
            }),
        }
    }

    input
}

pub fn load_requests(path: &Path) -> Result<ReplayInput> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request log {}", path.display()))?;

    let input = parse_requests(&text);
    tracing::info!(
        "Loaded {} requests from {} ({} skipped)",
        input.requests.len(),
        path.display(),
        input.skipped.len()
    );

    Ok(input)
}

/// Outcome of a replay run
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub processed: usize,
    pub workers: usize,
    pub skipped: Vec<SkippedLine>,
    pub graph_types: BTreeMap<&'static str, usize>,
    pub stats: OptimizationStats,
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Replayed {} requests with {} workers", self.processed, self.workers)?;
        for skipped in &self.skipped {
            writeln!(f, "  skipped line {}: {}", skipped.line, skipped.reason)?;
        }

        writeln!(f, "Graph types:")?;
        for (graph_type, count) in &self.graph_types {
            writeln!(f, "  {:<10} {}", graph_type, count)?;
        }

        write!(f, "{}", self.stats)
    }
}

/// Run `optimize` and `detect_type` for every request, striping requests over `workers`
/// blocking tasks
pub async fn replay(
    optimizer: SharedQueryOptimizer,
    input: ReplayInput,
    workers: usize,
) -> Result<ReplayReport> {
    let workers = workers.max(1);
    let requests = Arc::new(input.requests);

    tracing::info!("Replaying {} requests on {} workers", requests.len(), workers);

    let mut handles = vec![];
    for worker in 0..workers {
        let optimizer = optimizer.clone();
        let requests = Arc::clone(&requests);

        // Each call is CPU-bound and holds a blocking lock
        let handle = tokio::task::spawn_blocking(move || {
            let mut types = Vec::new();
            for request in requests.iter().skip(worker).step_by(workers) {
                optimizer.optimize(request)?;
                types.push(optimizer.detect_type(request)?);
            }
            Ok::<_, graphrag_cache::OptimizerError>(types)
        });

        handles.push(handle);
    }

    let mut graph_types: BTreeMap<&'static str, usize> = GraphType::ALL
        .iter()
        .map(|graph_type| (graph_type.as_str(), 0))
        .collect();

    for result in join_all(handles).await {
        let types = result.context("Replay worker panicked")??;
        for graph_type in types {
            *graph_types.entry(graph_type.as_str()).or_default() += 1;
        }
    }

    Ok(ReplayReport {
        processed: requests.len(),
        workers,
        skipped: input.skipped,
        graph_types,
        stats: optimizer.get_optimization_stats(),
    })
}
