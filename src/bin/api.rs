use sales_insight_orchestrator::{api::start_server, Orchestrator, Settings};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    let settings = Settings::from_env();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .init();

    if settings.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY not set, synthesis will use templates");
    }
    if settings.news_api_key.is_none() {
        warn!("NEWS_API_KEY not set, news worker will use curated coverage");
    }

    info!("Sales Insight Orchestrator - API Server");
    info!(port = settings.port, timeout_s = settings.worker_timeout.as_secs(), "Settings loaded");

    let orchestrator = Arc::new(Orchestrator::from_settings(&settings)?);

    info!("Orchestrator initialized");

    start_server(orchestrator, settings.port).await?;

    Ok(())
}
