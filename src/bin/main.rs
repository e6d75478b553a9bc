use sales_insight_orchestrator::{Orchestrator, Priority, Settings};
use serde_json::Map;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .init();

    let entity = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if entity.trim().is_empty() {
        eprintln!("usage: insight <company name>");
        std::process::exit(2);
    }

    info!(entity = %entity, "Sales Insight Orchestrator starting");

    let orchestrator = Orchestrator::from_settings(&settings)?;

    match orchestrator
        .run_all(&entity, Map::new(), settings.default_lookback_days, Priority::Medium)
        .await
    {
        Ok(result) => {
            println!("\n=== MEETING BRIEF: {} ===", result.entity);
            println!("Run ID: {}", result.run_id);
            println!("Status: {:?}", result.status);
            println!("Coverage: {}", result.summary.data_completeness);
            if let Some(score) = &result.summary.preparation_score {
                println!(
                    "Preparation: {} ({}/{})",
                    score.level, score.score, score.max_score
                );
            }
            println!("Ready for meeting: {}", result.summary.ready_for_meeting);

            println!("\nTop Insights:");
            for (i, insight) in result.summary.top_insights.iter().enumerate() {
                println!("  {}: {}", i + 1, insight);
            }

            if let Some(summary) = result
                .synthesis
                .as_ref()
                .and_then(|s| s.data.get("executive_summary"))
                .and_then(|v| v.as_str())
            {
                println!("\n{}", summary);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Insight run failed: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
