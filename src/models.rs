//! Core data models: the task contract shared by every worker

use crate::error::OrchestrationError;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Context key under which the normalized worker map travels to the synthesizer.
pub const AGENT_OUTPUTS_KEY: &str = "agent_outputs";

pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;
pub const MAX_LOOKBACK_DAYS: u32 = 90;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    Partial,
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Full,
    QuickBrief,
}

/// The four fixed data-gathering slots, in rollup order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkerSlot {
    Research,
    News,
    Financial,
    SocialMedia,
}

impl WorkerSlot {
    pub const ALL: [WorkerSlot; 4] = [
        WorkerSlot::Research,
        WorkerSlot::News,
        WorkerSlot::Financial,
        WorkerSlot::SocialMedia,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            WorkerSlot::Research => "research",
            WorkerSlot::News => "news",
            WorkerSlot::Financial => "financial",
            WorkerSlot::SocialMedia => "social_media",
        }
    }
}

//
// ================= Task Input =================
//

/// Immutable per-request input handed to every worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInput {
    pub entity: String,
    #[serde(default)]
    pub context: Map<String, Value>,
    pub lookback_days: u32,
    #[serde(default)]
    pub priority: Priority,
}

impl TaskInput {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            context: Map::new(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            priority: Priority::default(),
        }
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Attach a snapshot of the normalized worker map for the synthesizer.
    pub fn with_agent_outputs(mut self, outputs: &AgentOutputs) -> Result<Self> {
        self.context
            .insert(AGENT_OUTPUTS_KEY.to_string(), serde_json::to_value(outputs)?);
        Ok(self)
    }

    /// Read back the worker map carried in the context, if any.
    pub fn agent_outputs(&self) -> Result<Option<AgentOutputs>> {
        match self.context.get(AGENT_OUTPUTS_KEY) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.entity.trim().is_empty() {
            return Err(OrchestrationError::Validation(
                "entity identifier is required".to_string(),
            ));
        }

        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(OrchestrationError::Validation(format!(
                "lookback_days must be between 1 and {}, got {}",
                MAX_LOOKBACK_DAYS, self.lookback_days
            )));
        }

        Ok(())
    }
}

//
// ================= Task Output =================
//

/// Output of exactly one worker invocation. Never mutated after return.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskOutput {
    pub worker: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub insights: Vec<String>,
    pub confidence: f64,
    pub execution_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskOutput {
    pub fn success(
        worker: impl Into<String>,
        data: Map<String, Value>,
        insights: Vec<String>,
        confidence: f64,
        execution_time_ms: u64,
    ) -> Self {
        Self::completed(
            worker,
            TaskStatus::Success,
            data,
            insights,
            confidence,
            execution_time_ms,
        )
    }

    pub fn partial(
        worker: impl Into<String>,
        data: Map<String, Value>,
        insights: Vec<String>,
        confidence: f64,
        execution_time_ms: u64,
    ) -> Self {
        Self::completed(
            worker,
            TaskStatus::Partial,
            data,
            insights,
            confidence,
            execution_time_ms,
        )
    }

    /// Error-status output: zero confidence, empty payload, non-empty error.
    pub fn failure(
        worker: impl Into<String>,
        error: impl Into<String>,
        execution_time_ms: u64,
    ) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "unknown worker failure".to_string();
        }

        Self {
            worker: worker.into(),
            status: TaskStatus::Error,
            data: Map::new(),
            insights: Vec::new(),
            confidence: 0.0,
            execution_time_ms,
            timestamp: Utc::now(),
            error: Some(error),
        }
    }

    fn completed(
        worker: impl Into<String>,
        status: TaskStatus,
        data: Map<String, Value>,
        insights: Vec<String>,
        confidence: f64,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            worker: worker.into(),
            status,
            data,
            insights,
            confidence: clamp_confidence(confidence),
            execution_time_ms,
            timestamp: Utc::now(),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

//
// ================= Normalized Map =================
//

/// Worker slot → output-or-absent. `None` marks a worker that raised
/// or never completed. Iterates in fixed slot order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct AgentOutputs {
    slots: BTreeMap<WorkerSlot, Option<TaskOutput>>,
}

impl AgentOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slot: WorkerSlot, output: Option<TaskOutput>) {
        self.slots.insert(slot, output);
    }

    pub fn get(&self, slot: WorkerSlot) -> Option<&TaskOutput> {
        self.slots.get(&slot).and_then(Option::as_ref)
    }

    pub fn is_present(&self, slot: WorkerSlot) -> bool {
        self.get(slot).is_some()
    }

    /// Slots that were scheduled, present or not.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (WorkerSlot, Option<&TaskOutput>)> {
        self.slots.iter().map(|(slot, output)| (*slot, output.as_ref()))
    }

    pub fn present(&self) -> impl Iterator<Item = (WorkerSlot, &TaskOutput)> {
        self.slots
            .iter()
            .filter_map(|(slot, output)| output.as_ref().map(|o| (*slot, o)))
    }

    pub fn present_count(&self) -> usize {
        self.present().count()
    }

    pub fn success_count(&self) -> usize {
        self.present().filter(|(_, o)| o.is_success()).count()
    }
}

//
// ================= Aggregate =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PrepLevel {
    Excellent,
    Good,
    Fair,
}

impl PrepLevel {
    pub fn from_score(score: u32) -> Self {
        if score >= 80 {
            PrepLevel::Excellent
        } else if score >= 60 {
            PrepLevel::Good
        } else {
            PrepLevel::Fair
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            PrepLevel::Excellent => "#10b981",
            PrepLevel::Good => "#f59e0b",
            PrepLevel::Fair => "#ef4444",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreparationScore {
    pub score: u32,
    pub max_score: u32,
    pub percentage: u32,
    pub level: PrepLevel,
    pub color: String,
    pub present_agents: usize,
    /// Presence-based readiness (at least three slots recorded).
    pub ready: bool,
}

/// Short human-facing reduction of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Digest {
    pub data_completeness: String,
    pub top_insights: Vec<String>,
    pub preparation_score: Option<PreparationScore>,
    /// Strict-success readiness (at least three slots with status success).
    pub ready_for_meeting: bool,
}

/// Terminal artifact of one orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    pub run_id: Uuid,
    pub entity: String,
    pub status: RunStatus,
    pub kind: RunKind,
    pub timestamp: DateTime<Utc>,
    pub execution_time_ms: u64,
    pub agent_outputs: AgentOutputs,
    pub synthesis: Option<TaskOutput>,
    pub summary: Digest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

//
// ================= Agent Status =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatus {
    pub name: String,
    pub description: String,
    pub status: String,
    pub capabilities: Vec<String>,
    pub data_sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRoster {
    pub available_agents: Vec<AgentStatus>,
    pub total_agents: usize,
    pub orchestrator_version: String,
}

impl FromStr for Priority {
    type Err = OrchestrationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(OrchestrationError::Validation(format!(
                "priority must be one of low, medium, high; got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Success => "success",
            TaskStatus::Partial => "partial",
            TaskStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for PrepLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrepLevel::Excellent => "Excellent",
            PrepLevel::Good => "Good",
            PrepLevel::Fair => "Fair",
        };
        write!(f, "{}", s)
    }
}
