//! Sales Insight Orchestrator
//!
//! Builds a pre-meeting brief for a target company:
//! - Fans out to independent data-gathering workers concurrently
//! - Tolerates failed, hung or crashed workers without failing the run
//! - Synthesizes findings into a summary, talking points and a readiness score
//! - Optionally uses a hosted LLM for prose, with a deterministic template fallback
//!
//! UNIFIED LOOP:
//! INPUT → VALIDATE → FAN-OUT → JOIN → SYNTHESIZE → DIGEST → COMPLETE

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod synthesis;
pub mod workers;

pub use error::{OrchestrationError, Result};

// Re-export common types
pub use config::Settings;
pub use models::*;
pub use orchestrator::{MetricsSnapshot, Orchestrator, WorkerMetrics, WorkerSet};
pub use synthesis::InsightSynthesizer;
pub use workers::{Findings, Worker};
