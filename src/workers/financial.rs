//! Funding and financial metrics

use super::{entity_seed, simulate_latency, Findings, Worker};
use crate::models::TaskInput;
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map};
use std::time::Duration;

const FUNDING_STAGES: &[&str] = &["Seed", "Series A", "Series B", "Series C", "Public"];

pub struct FinancialWorker {
    latency: Duration,
}

impl FinancialWorker {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl Worker for FinancialWorker {
    fn name(&self) -> &'static str {
        "FinancialAgent"
    }

    fn description(&self) -> &'static str {
        "Gathers stock performance, funding rounds, and financial reports"
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &[
            "Stock performance tracking",
            "Funding round monitoring",
            "Financial metrics analysis",
            "Revenue estimation",
        ]
    }

    fn data_sources(&self) -> &'static [&'static str] {
        &["Yahoo Finance", "Alpha Vantage", "Crunchbase", "PitchBook"]
    }

    async fn gather(&self, input: &TaskInput) -> Result<Findings> {
        simulate_latency(self.latency).await;

        let seed = entity_seed(&input.entity);
        let stage = FUNDING_STAGES[(seed % FUNDING_STAGES.len() as u64) as usize];
        let revenue_growth_pct = 10 + seed % 50;
        let churn_pct = 4 + seed % 12;
        let arr_musd = 5 + seed % 120;

        let mut data = Map::new();
        data.insert(
            "funding_info".to_string(),
            json!({
                "latest_stage": stage,
                "publicly_traded": stage == "Public",
            }),
        );
        data.insert(
            "financial_metrics".to_string(),
            json!({
                "arr_musd": arr_musd,
                "revenue_growth_yoy_pct": revenue_growth_pct,
                "annual_churn_pct": churn_pct,
            }),
        );
        data.insert("last_updated".to_string(), json!(Utc::now().to_rfc3339()));

        let mut insights = vec![
            format!("Latest funding stage: {}", stage),
            format!(
                "Revenue growing {}% year over year on ~${}M ARR",
                revenue_growth_pct, arr_musd
            ),
            format!("Annual churn around {}%", churn_pct),
        ];
        if revenue_growth_pct >= 40 {
            insights.push("High-growth phase: budget likely available for new tooling".to_string());
        }

        Ok(Findings::complete(data, insights, 0.78))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;

    #[tokio::test]
    async fn test_financial_output_is_reproducible() {
        let worker = FinancialWorker::new(Duration::ZERO);
        let first = worker.run(&TaskInput::new("Globex")).await;
        let second = worker.run(&TaskInput::new("Globex")).await;

        assert_eq!(first.status, TaskStatus::Success);
        assert_eq!(first.data["financial_metrics"], second.data["financial_metrics"]);
        assert_eq!(first.insights, second.insights);
        assert!(first.insights.len() >= 3);
    }
}
