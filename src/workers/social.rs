//! Social presence and brand sentiment

use super::{entity_seed, entity_slug, simulate_latency, Findings, Worker};
use crate::models::TaskInput;
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map};
use std::time::Duration;

pub struct SocialWorker {
    latency: Duration,
}

impl SocialWorker {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl Worker for SocialWorker {
    fn name(&self) -> &'static str {
        "SocialMediaAgent"
    }

    fn description(&self) -> &'static str {
        "Tracks social media presence, engagement, and brand sentiment"
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &[
            "LinkedIn activity monitoring",
            "Twitter/X tracking",
            "Engagement analysis",
            "Brand sentiment analysis",
        ]
    }

    fn data_sources(&self) -> &'static [&'static str] {
        &["LinkedIn API", "Twitter API", "Social listening tools"]
    }

    async fn gather(&self, input: &TaskInput) -> Result<Findings> {
        simulate_latency(self.latency).await;

        let seed = entity_seed(&input.entity);
        let sentiment_score = 40 + seed % 55;
        let engagement_rate = 1.0 + (seed % 40) as f64 / 10.0;
        let open_positions = seed % 60;

        let label = if sentiment_score >= 65 {
            "positive"
        } else if sentiment_score >= 50 {
            "neutral"
        } else {
            "negative"
        };

        let mut data = Map::new();
        data.insert(
            "profiles".to_string(),
            json!({
                "linkedin": format!("linkedin.com/company/{}", entity_slug(&input.entity)),
                "twitter": format!("@{}", entity_slug(&input.entity)),
            }),
        );
        data.insert(
            "sentiment".to_string(),
            json!({ "score": sentiment_score, "label": label }),
        );
        data.insert("engagement_rate_pct".to_string(), json!(engagement_rate));
        data.insert("open_positions".to_string(), json!(open_positions));
        data.insert("last_updated".to_string(), json!(Utc::now().to_rfc3339()));

        let insights = vec![
            format!("Brand sentiment is {} ({}%)", label, sentiment_score),
            format!("Social engagement rate around {:.1}%", engagement_rate),
            format!("{} open positions advertised", open_positions),
        ];

        Ok(Findings::complete(data, insights, 0.75))
    }
}
