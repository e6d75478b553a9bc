//! Company background research

use super::{entity_seed, entity_slug, simulate_latency, Findings, Worker};
use crate::models::TaskInput;
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::time::Duration;

const INDUSTRIES: &[&str] = &[
    "Technology / SaaS",
    "Financial Services",
    "Manufacturing",
    "Retail / E-commerce",
    "Healthcare",
];

const SIZES: &[&str] = &[
    "50-200 employees",
    "200-500 employees",
    "500-1000 employees",
    "1000-5000 employees",
];

pub struct ResearchWorker {
    latency: Duration,
}

impl ResearchWorker {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl Worker for ResearchWorker {
    fn name(&self) -> &'static str {
        "ResearchAgent"
    }

    fn description(&self) -> &'static str {
        "Gathers company background, products, services, and key personnel"
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &[
            "Company background research",
            "Decision-maker identification",
            "Products and services analysis",
            "Organizational structure",
        ]
    }

    fn data_sources(&self) -> &'static [&'static str] {
        &["LinkedIn", "Company websites", "Business directories", "Clearbit API"]
    }

    async fn gather(&self, input: &TaskInput) -> Result<Findings> {
        simulate_latency(self.latency).await;

        let seed = entity_seed(&input.entity);
        let industry = INDUSTRIES[(seed % INDUSTRIES.len() as u64) as usize];
        let size = SIZES[(seed / 7 % SIZES.len() as u64) as usize];

        let decision_makers = json!([
            { "title": "VP of Sales", "function": "Sales" },
            { "title": "CTO", "function": "Technology" },
            { "title": "Head of Procurement", "function": "Procurement" },
        ]);

        let mut data = Map::new();
        data.insert(
            "company_info".to_string(),
            json!({
                "name": input.entity,
                "industry": industry,
                "size": size,
                "website": format!("www.{}.com", entity_slug(&input.entity)),
            }),
        );
        data.insert("decision_makers".to_string(), decision_makers);
        data.insert(
            "focus_areas".to_string(),
            input
                .context
                .get("focus_areas")
                .cloned()
                .unwrap_or(Value::Array(vec![])),
        );
        data.insert("last_updated".to_string(), json!(Utc::now().to_rfc3339()));

        let insights = vec![
            format!("{} operates in {} ({})", input.entity, industry, size),
            "Decision-making team spans Sales, Technology, and Procurement".to_string(),
            format!(
                "Company website identified at www.{}.com",
                entity_slug(&input.entity)
            ),
            "Enterprise focus suggests multi-stakeholder buying process".to_string(),
        ];

        Ok(Findings::complete(data, insights, 0.85))
    }
}
