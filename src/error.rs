//! Error types for the sales insight orchestrator

use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

#[derive(Error, Debug)]
pub enum OrchestrationError {

    // =============================
    // Core Pipeline Errors
    // =============================

    /// Bad task input. Fatal, surfaced before any worker is scheduled.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A single worker's internal fault. Converted to an error-status
    /// output at the worker boundary, never propagated past it.
    #[error("Worker error: {0}")]
    Worker(String),

    /// The synthesizer itself faulted.
    #[error("Aggregation fault: {0}")]
    Aggregation(String),

    /// Join/assembly logic faulted. The only class that fails a run.
    #[error("Scheduler fault: {0}")]
    Scheduler(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl OrchestrationError {
    pub fn is_validation(&self) -> bool {
        matches!(self, OrchestrationError::Validation(_))
    }
}
