//! Orchestrator: fan-out / fan-in over the data-gathering workers
//!
//! INPUT → VALIDATE → FAN-OUT → JOIN → SYNTHESIZE → DIGEST → COMPLETE
//!
//! Each worker runs in its own task under a timeout. A worker that panics
//! is recorded as absent; a worker that hangs is recorded as an error
//! output. Neither affects its siblings. Synthesis only starts once every
//! slot has settled.

use crate::config::Settings;
use crate::error::OrchestrationError;
use crate::llm;
use crate::models::{
    AgentOutputs, AgentRoster, AgentStatus, AggregateResult, Digest, Priority, RunKind,
    RunStatus, TaskInput, TaskOutput, WorkerSlot,
};
use crate::synthesis::InsightSynthesizer;
use crate::workers::{FinancialWorker, NewsClient, NewsWorker, ResearchWorker, SocialWorker, Worker};
use crate::Result;
use chrono::Utc;
use futures::future::join_all;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub mod metrics;
pub mod summary;
pub use metrics::{MetricsRegistry, MetricsSnapshot, WorkerMetrics};
pub use summary::build_digest;

pub const QUICK_BRIEF_LOOKBACK_DAYS: u32 = 7;
const QUICK_BRIEF_SLOTS: [WorkerSlot; 2] = [WorkerSlot::Research, WorkerSlot::News];

/// The four data-gathering workers, one per slot.
#[derive(Clone)]
pub struct WorkerSet {
    pub research: Arc<dyn Worker>,
    pub news: Arc<dyn Worker>,
    pub financial: Arc<dyn Worker>,
    pub social: Arc<dyn Worker>,
}

impl WorkerSet {
    pub fn get(&self, slot: WorkerSlot) -> &Arc<dyn Worker> {
        match slot {
            WorkerSlot::Research => &self.research,
            WorkerSlot::News => &self.news,
            WorkerSlot::Financial => &self.financial,
            WorkerSlot::SocialMedia => &self.social,
        }
    }

    /// Built-in workers, wired from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let latency = settings.simulated_latency;

        Ok(Self {
            research: Arc::new(ResearchWorker::new(latency)),
            news: Arc::new(NewsWorker::new(latency, NewsClient::from_settings(settings)?)),
            financial: Arc::new(FinancialWorker::new(latency)),
            social: Arc::new(SocialWorker::new(latency)),
        })
    }
}

/// Main orchestrator that coordinates the workers and the synthesizer
pub struct Orchestrator {
    workers: WorkerSet,
    synthesizer: Arc<dyn Worker>,
    worker_timeout: Duration,
    metrics: MetricsRegistry,
}

impl Orchestrator {
    pub fn new(workers: WorkerSet, synthesizer: Arc<dyn Worker>, worker_timeout: Duration) -> Self {
        Self {
            workers,
            synthesizer,
            worker_timeout,
            metrics: MetricsRegistry::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let workers = WorkerSet::from_settings(settings)?;
        let synthesizer = Arc::new(InsightSynthesizer::new(llm::from_settings(settings)?));

        Ok(Self::new(workers, synthesizer, settings.worker_timeout))
    }

    /// Full run: all four workers, then synthesis and digest.
    ///
    /// Only input validation fails the call. Degraded or missing workers
    /// show up in the result, not as an error.
    pub async fn run_all(
        &self,
        entity: &str,
        context: Map<String, Value>,
        lookback_days: u32,
        priority: Priority,
    ) -> Result<AggregateResult> {
        let start = Instant::now();
        let input = TaskInput::new(entity)
            .with_context(context)
            .with_lookback_days(lookback_days)
            .with_priority(priority);
        input.validate()?;

        let run_id = Uuid::new_v4();
        info!(
            %run_id,
            entity = %input.entity,
            lookback_days,
            %priority,
            "Orchestrator: starting insight gathering"
        );

        let input = Arc::new(input);
        let outputs = self.fan_out(Arc::clone(&input), &WorkerSlot::ALL).await;

        let synthesis_input = match synthesis_input(&input, &outputs) {
            Ok(synthesis_input) => synthesis_input,
            Err(e) => {
                error!(%run_id, error = %e, "Could not assemble synthesis input");
                return Ok(failed_result(run_id, &input.entity, RunKind::Full, outputs, e, start));
            }
        };

        debug!(%run_id, "Synthesizing insights");
        let synthesis = self.synthesize(synthesis_input).await;
        let summary = build_digest(&outputs, Some(&synthesis));
        self.metrics
            .record_run(
                self.named(&outputs)
                    .chain(std::iter::once((self.synthesizer.name(), Some(&synthesis)))),
            )
            .await;

        let execution_time_ms = start.elapsed().as_millis() as u64;
        info!(
            %run_id,
            entity = %input.entity,
            completeness = %summary.data_completeness,
            ready = summary.ready_for_meeting,
            execution_time_ms,
            "Orchestrator: insight gathering complete"
        );

        Ok(AggregateResult {
            run_id,
            entity: input.entity.clone(),
            status: RunStatus::Success,
            kind: RunKind::Full,
            timestamp: Utc::now(),
            execution_time_ms,
            agent_outputs: outputs,
            synthesis: Some(synthesis),
            summary,
            error: None,
        })
    }

    /// Reduced run: research and news only, short lookback, no synthesis.
    pub async fn quick_brief(&self, entity: &str) -> Result<AggregateResult> {
        let start = Instant::now();
        let input = TaskInput::new(entity)
            .with_lookback_days(QUICK_BRIEF_LOOKBACK_DAYS)
            .with_priority(Priority::High);
        input.validate()?;

        let run_id = Uuid::new_v4();
        info!(%run_id, entity = %input.entity, "Orchestrator: generating quick brief");

        let input = Arc::new(input);
        let outputs = self.fan_out(Arc::clone(&input), &QUICK_BRIEF_SLOTS).await;
        let summary = build_digest(&outputs, None);
        self.metrics.record_run(self.named(&outputs)).await;

        Ok(AggregateResult {
            run_id,
            entity: input.entity.clone(),
            status: RunStatus::Success,
            kind: RunKind::QuickBrief,
            timestamp: Utc::now(),
            execution_time_ms: start.elapsed().as_millis() as u64,
            agent_outputs: outputs,
            synthesis: None,
            summary,
            error: None,
        })
    }

    pub fn agent_status(&self) -> AgentRoster {
        let available_agents: Vec<AgentStatus> = self
            .roster()
            .into_iter()
            .map(|worker| AgentStatus {
                name: worker.name().to_string(),
                description: worker.description().to_string(),
                status: "active".to_string(),
                capabilities: worker.capabilities().iter().map(|c| c.to_string()).collect(),
                data_sources: worker.data_sources().iter().map(|s| s.to_string()).collect(),
            })
            .collect();

        AgentRoster {
            total_agents: available_agents.len(),
            available_agents,
            orchestrator_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Execution metrics per worker, in roster order.
    pub async fn metrics(&self) -> MetricsSnapshot {
        let names: Vec<&str> = self.roster().iter().map(|worker| worker.name()).collect();
        self.metrics.snapshot(&names).await
    }

    fn roster(&self) -> Vec<&Arc<dyn Worker>> {
        let mut workers: Vec<&Arc<dyn Worker>> =
            WorkerSlot::ALL.iter().map(|slot| self.workers.get(*slot)).collect();
        workers.push(&self.synthesizer);
        workers
    }

    fn named<'a>(
        &'a self,
        outputs: &'a AgentOutputs,
    ) -> impl Iterator<Item = (&'a str, Option<&'a TaskOutput>)> + 'a {
        outputs
            .iter()
            .map(move |(slot, output)| (self.workers.get(slot).name(), output))
    }

    /// Spawn one task per slot and wait for all of them to settle.
    async fn fan_out(&self, input: Arc<TaskInput>, slots: &[WorkerSlot]) -> AgentOutputs {
        debug!(workers = slots.len(), "Fanning out data-gathering workers");

        let handles = slots.iter().map(|slot| {
            let worker = Arc::clone(self.workers.get(*slot));
            tokio::spawn(run_with_timeout(
                worker,
                Arc::clone(&input),
                self.worker_timeout,
                OrchestrationError::Worker,
            ))
        });
        let results = join_all(handles).await;

        let mut outputs = AgentOutputs::new();
        for (slot, result) in slots.iter().zip(results) {
            match result {
                Ok(output) => outputs.insert(*slot, Some(output)),
                Err(e) => {
                    error!(
                        worker = self.workers.get(*slot).name(),
                        error = %describe_join_error(&e),
                        "Worker aborted before producing output"
                    );
                    outputs.insert(*slot, None);
                }
            }
        }

        debug!(
            present = outputs.present_count(),
            scheduled = outputs.slot_count(),
            "All workers settled"
        );

        outputs
    }

    /// Run the synthesizer in its own task so a crash there degrades only
    /// the synthesis slot.
    async fn synthesize(&self, input: TaskInput) -> TaskOutput {
        let start = Instant::now();
        let name = self.synthesizer.name();
        let handle = tokio::spawn(run_with_timeout(
            Arc::clone(&self.synthesizer),
            Arc::new(input),
            self.worker_timeout,
            OrchestrationError::Aggregation,
        ));

        match handle.await {
            Ok(output) => output,
            Err(e) => {
                let fault = OrchestrationError::Aggregation(describe_join_error(&e));
                error!(worker = name, error = %fault, "Synthesizer aborted");
                TaskOutput::failure(name, fault.to_string(), start.elapsed().as_millis() as u64)
            }
        }
    }
}

/// A hang becomes an error-status output rather than an unresolved join.
/// `fault` classifies the timeout for the slot being run.
async fn run_with_timeout(
    worker: Arc<dyn Worker>,
    input: Arc<TaskInput>,
    limit: Duration,
    fault: fn(String) -> OrchestrationError,
) -> TaskOutput {
    let start = Instant::now();

    match tokio::time::timeout(limit, worker.run(&input)).await {
        Ok(output) => output,
        Err(_) => {
            warn!(
                worker = worker.name(),
                timeout_ms = limit.as_millis() as u64,
                "Worker timed out"
            );
            TaskOutput::failure(
                worker.name(),
                fault(format!("timed out after {}ms", limit.as_millis())).to_string(),
                start.elapsed().as_millis() as u64,
            )
        }
    }
}

fn synthesis_input(input: &TaskInput, outputs: &AgentOutputs) -> Result<TaskInput> {
    TaskInput::new(input.entity.clone())
        .with_lookback_days(input.lookback_days)
        .with_priority(input.priority)
        .with_agent_outputs(outputs)
        .map_err(|e| {
            OrchestrationError::Scheduler(format!("could not snapshot worker outputs: {}", e))
        })
}

fn describe_join_error(e: &JoinError) -> String {
    if e.is_panic() {
        "worker panicked".to_string()
    } else if e.is_cancelled() {
        "worker was cancelled".to_string()
    } else {
        e.to_string()
    }
}

fn failed_result(
    run_id: Uuid,
    entity: &str,
    kind: RunKind,
    outputs: AgentOutputs,
    fault: OrchestrationError,
    start: Instant,
) -> AggregateResult {
    let summary = Digest {
        data_completeness: format!(
            "{}/{} agents successful",
            outputs.success_count(),
            outputs.slot_count()
        ),
        top_insights: Vec::new(),
        preparation_score: None,
        ready_for_meeting: false,
    };

    AggregateResult {
        run_id,
        entity: entity.to_string(),
        status: RunStatus::Error,
        kind,
        timestamp: Utc::now(),
        execution_time_ms: start.elapsed().as_millis() as u64,
        agent_outputs: outputs,
        synthesis: None,
        summary,
        error: Some(fault.to_string()),
    }
}
