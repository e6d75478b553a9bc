//! Per-worker execution metrics
//!
//! In-process tally, updated by the orchestrator after every run. An absent
//! slot counts as an unsuccessful execution that contributes no timing.

use crate::models::{TaskOutput, TaskStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
struct Tally {
    executions: u64,
    successes: u64,
    reported: u64,
    total_ms: u64,
    total_confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerMetrics {
    pub name: String,
    pub executions: u64,
    /// Fraction of executions that ended with status success.
    pub success_rate: f64,
    pub avg_execution_time_ms: f64,
    pub avg_confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSnapshot {
    pub total_runs: u64,
    pub agents: Vec<WorkerMetrics>,
}

#[derive(Default)]
struct Ledger {
    runs: u64,
    workers: HashMap<String, Tally>,
}

/// Execution tally storage
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    ledger: Arc<RwLock<Ledger>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one orchestration run, as `(worker name, output-or-absent)` pairs.
    pub async fn record_run<'a, I>(&self, results: I)
    where
        I: IntoIterator<Item = (&'a str, Option<&'a TaskOutput>)>,
    {
        let mut ledger = self.ledger.write().await;
        ledger.runs += 1;

        for (name, output) in results {
            let tally = ledger.workers.entry(name.to_string()).or_default();
            tally.executions += 1;

            if let Some(output) = output {
                tally.reported += 1;
                tally.total_ms += output.execution_time_ms;
                tally.total_confidence += output.confidence;
                if output.status == TaskStatus::Success {
                    tally.successes += 1;
                }
            }
        }
    }

    /// Metrics for the named workers, in the order given. Workers that never
    /// ran report zeros.
    pub async fn snapshot(&self, names: &[&str]) -> MetricsSnapshot {
        let ledger = self.ledger.read().await;

        let agents = names
            .iter()
            .map(|name| {
                let tally = ledger.workers.get(*name).cloned().unwrap_or_default();
                WorkerMetrics {
                    name: name.to_string(),
                    executions: tally.executions,
                    success_rate: ratio(tally.successes as f64, tally.executions),
                    avg_execution_time_ms: ratio(tally.total_ms as f64, tally.reported),
                    avg_confidence: ratio(tally.total_confidence, tally.reported),
                }
            })
            .collect();

        MetricsSnapshot {
            total_runs: ledger.runs,
            agents,
        }
    }
}

fn ratio(total: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
