//! REST API Server for the Sales Insight Orchestrator
//!
//! Exposes the orchestrator via HTTP endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::OrchestrationError;
use crate::models::{AggregateResult, Priority, RunStatus, DEFAULT_LOOKBACK_DAYS};
use crate::orchestrator::Orchestrator;

const SERVICE_NAME: &str = "Sales Insight API";
const MIN_COMPANY_NAME_LEN: usize = 2;
const MAX_COMPANY_NAME_LEN: usize = 200;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InsightRequest {
    pub company_name: String,
    pub timeframe_days: Option<u32>,
    pub priority: Option<String>,
    pub context: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuickBriefRequest {
    pub company_name: String,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiReply = (StatusCode, Json<ApiResponse>);

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
}

/// =============================
/// Helpers
/// =============================

fn validate_company_name(name: &str) -> Result<(), OrchestrationError> {
    let len = name.trim().chars().count();
    if !(MIN_COMPANY_NAME_LEN..=MAX_COMPANY_NAME_LEN).contains(&len) {
        return Err(OrchestrationError::Validation(format!(
            "company_name must be between {} and {} characters",
            MIN_COMPANY_NAME_LEN, MAX_COMPANY_NAME_LEN
        )));
    }
    Ok(())
}

fn failure(e: OrchestrationError) -> ApiReply {
    let status = if e.is_validation() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ApiResponse::error(e.to_string())))
}

fn reply(result: crate::Result<AggregateResult>) -> ApiReply {
    match result {
        Ok(result) if result.status == RunStatus::Error => {
            let message = result
                .error
                .clone()
                .unwrap_or_else(|| "orchestration failed".to_string());
            error!(entity = %result.entity, error = %message, "Run finished with error status");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(message)),
            )
        }
        Ok(result) => (StatusCode::OK, Json(ApiResponse::success(result))),
        Err(e) => failure(e),
    }
}

/// =============================
/// Health Endpoints
/// =============================

async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": SERVICE_NAME,
    }))
}

async fn health_detailed(State(state): State<ApiState>) -> Json<Value> {
    let roster = state.orchestrator.agent_status();

    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": SERVICE_NAME,
        "version": roster.orchestrator_version,
        "components": {
            "api": "operational",
            "agents": "operational",
            "agent_count": roster.total_agents,
        },
    }))
}

/// =============================
/// Insight Endpoints
/// =============================

async fn generate_insights(
    State(state): State<ApiState>,
    Json(req): Json<InsightRequest>,
) -> ApiReply {
    info!(company = %req.company_name, "Received insight request");

    if let Err(e) = validate_company_name(&req.company_name) {
        return failure(e);
    }

    let priority = match req.priority.as_deref() {
        Some(raw) => match raw.parse::<Priority>() {
            Ok(priority) => priority,
            Err(e) => return failure(e),
        },
        None => Priority::default(),
    };

    let result = state
        .orchestrator
        .run_all(
            &req.company_name,
            req.context.unwrap_or_default(),
            req.timeframe_days.unwrap_or(DEFAULT_LOOKBACK_DAYS),
            priority,
        )
        .await;

    reply(result)
}

async fn quick_brief(
    State(state): State<ApiState>,
    Json(req): Json<QuickBriefRequest>,
) -> ApiReply {
    info!(company = %req.company_name, "Received quick brief request");

    if let Err(e) = validate_company_name(&req.company_name) {
        return failure(e);
    }

    reply(state.orchestrator.quick_brief(&req.company_name).await)
}

/// =============================
/// Agent Endpoints
/// =============================

async fn agents_status(State(state): State<ApiState>) -> ApiReply {
    (
        StatusCode::OK,
        Json(ApiResponse::success(state.orchestrator.agent_status())),
    )
}

async fn agents_capabilities(State(state): State<ApiState>) -> ApiReply {
    let agents: Vec<Value> = state
        .orchestrator
        .agent_status()
        .available_agents
        .into_iter()
        .map(|agent| {
            serde_json::json!({
                "name": agent.name,
                "capabilities": agent.capabilities,
                "data_sources": agent.data_sources,
            })
        })
        .collect();

    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({ "agents": agents }))),
    )
}

async fn agents_metrics(State(state): State<ApiState>) -> ApiReply {
    (
        StatusCode::OK,
        Json(ApiResponse::success(state.orchestrator.metrics().await)),
    )
}

/// =============================
/// Router
/// =============================

pub fn create_router(orchestrator: Arc<Orchestrator>) -> Router {
    let state = ApiState { orchestrator };

    Router::new()
        .route("/health", get(health))
        .route("/health/detailed", get(health_detailed))
        .route("/api/v1/insights/generate", post(generate_insights))
        .route("/api/v1/insights/quick-brief", post(quick_brief))
        .route("/api/v1/agents/status", get(agents_status))
        .route("/api/v1/agents/capabilities", get(agents_capabilities))
        .route("/api/v1/agents/metrics", get(agents_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    orchestrator: Arc<Orchestrator>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(orchestrator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
