//! Worker trait and the built-in data-gathering workers
//!
//! Every task implements the same capability: turn a `TaskInput` into a
//! `TaskOutput`. `run` is the boundary; whatever `gather` does wrong is
//! converted into an error-status output there and never escapes.

use crate::models::{TaskInput, TaskOutput};
use crate::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub mod financial;
pub mod news;
pub mod research;
pub mod social;

pub use financial::FinancialWorker;
pub use news::{NewsClient, NewsWorker};
pub use research::ResearchWorker;
pub use social::SocialWorker;

/// What a worker gathered before it is stamped into a `TaskOutput`.
#[derive(Debug, Clone, Default)]
pub struct Findings {
    pub data: Map<String, Value>,
    pub insights: Vec<String>,
    pub confidence: f64,
    /// False when the worker had to settle for degraded data.
    pub complete: bool,
}

impl Findings {
    pub fn complete(data: Map<String, Value>, insights: Vec<String>, confidence: f64) -> Self {
        Self {
            data,
            insights,
            confidence,
            complete: true,
        }
    }

    pub fn degraded(data: Map<String, Value>, insights: Vec<String>, confidence: f64) -> Self {
        Self {
            data,
            insights,
            confidence,
            complete: false,
        }
    }
}

/// Trait for a single unit of work
#[async_trait]
pub trait Worker: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn capabilities(&self) -> &'static [&'static str] {
        &[]
    }

    fn data_sources(&self) -> &'static [&'static str] {
        &[]
    }

    /// Internal, fallible data gathering.
    async fn gather(&self, input: &TaskInput) -> Result<Findings>;

    /// Run the worker. Never fails: faults become an error-status output
    /// with the elapsed time still recorded.
    async fn run(&self, input: &TaskInput) -> TaskOutput {
        let start = Instant::now();

        let result = match input.validate() {
            Ok(()) => self.gather(input).await,
            Err(e) => Err(e),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;

        let output = match result {
            Ok(findings) if findings.complete => TaskOutput::success(
                self.name(),
                findings.data,
                findings.insights,
                findings.confidence,
                elapsed_ms,
            ),
            Ok(findings) => TaskOutput::partial(
                self.name(),
                findings.data,
                findings.insights,
                findings.confidence,
                elapsed_ms,
            ),
            Err(e) => {
                warn!(worker = self.name(), error = %e, "Worker failed");
                TaskOutput::failure(self.name(), e.to_string(), elapsed_ms)
            }
        };

        info!(
            worker = self.name(),
            entity = %input.entity,
            status = %output.status,
            elapsed_ms = output.execution_time_ms,
            confidence = output.confidence,
            "Worker executed"
        );

        output
    }
}

/// Stand-in for upstream I/O latency in the built-in workers.
pub(crate) async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

/// Stable small number derived from the entity, so the built-in workers
/// produce varied but reproducible figures.
pub(crate) fn entity_seed(entity: &str) -> u64 {
    entity
        .to_lowercase()
        .bytes()
        .fold(7u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
}

pub(crate) fn entity_slug(entity: &str) -> String {
    entity
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}
