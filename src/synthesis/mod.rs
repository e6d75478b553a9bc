//! Insight synthesizer
//!
//! Consumes the normalized worker map produced by the orchestrator (carried
//! in its own `TaskInput` as a snapshot) and derives a composite judgment:
//! preparation score, executive summary, talking points, action items,
//! opportunities and risks.
//!
//! Text generation is optional. Every generated item has a deterministic
//! template counterpart built from the structured fields in the map.

use crate::llm::TextGenerator;
use crate::models::{
    AgentOutputs, PrepLevel, PreparationScore, TaskInput, TaskStatus, WorkerSlot,
};
use crate::workers::{Findings, Worker};
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};
use std::sync::Arc;
use tracing::{debug, warn};

pub mod template;

pub const SLOT_WEIGHT: u32 = 25;
pub const MAX_SCORE: u32 = 100;
pub const READY_THRESHOLD: usize = 3;
pub const INSIGHTS_PER_SLOT: usize = 2;
pub const MAX_TOP_INSIGHTS: usize = 5;
const MAX_TALKING_POINTS: usize = 7;

const SUMMARY_SYSTEM_PROMPT: &str = r#"You are an expert B2B sales intelligence analyst. Synthesize
information from multiple data sources into a concise, actionable executive brief for sales professionals.

Focus on:
1. Company overview and current status
2. Recent developments and strategic initiatives
3. Financial health and growth trajectory
4. Market presence and sentiment
5. Recommended sales approach

Be specific, data-driven, and action-oriented. Format with clear sections using markdown."#;

const TALKING_POINTS_SYSTEM_PROMPT: &str = r#"You are a B2B sales coach. Generate 5-7 specific, personalized talking points
for a sales meeting. Each point should be specific to the company's situation, conversational,
and grounded in recent developments.

Format as a JSON array of strings."#;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    Llm,
    Template,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionItem {
    pub action: String,
    pub priority: String,
    pub due: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Opportunity {
    pub opportunity: String,
    pub description: String,
    pub confidence: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Risk {
    pub risk: String,
    pub description: String,
    pub severity: String,
    pub mitigation: String,
}

/// Completeness score over the four fixed slots: 25 per recorded output.
/// Partial and error outputs count as present; only absent slots score 0.
pub fn preparation_score(outputs: &AgentOutputs) -> PreparationScore {
    let present = WorkerSlot::ALL
        .iter()
        .filter(|slot| outputs.is_present(**slot))
        .count();
    let score = SLOT_WEIGHT * present as u32;
    let level = PrepLevel::from_score(score);

    PreparationScore {
        score,
        max_score: MAX_SCORE,
        percentage: score * 100 / MAX_SCORE,
        level,
        color: level.color().to_string(),
        present_agents: present,
        ready: present >= READY_THRESHOLD,
    }
}

/// First two insights from each present slot, in fixed slot order, capped at five.
pub fn rollup_insights(outputs: &AgentOutputs) -> Vec<String> {
    outputs
        .present()
        .flat_map(|(_, output)| output.insights.iter().take(INSIGHTS_PER_SLOT).cloned())
        .take(MAX_TOP_INSIGHTS)
        .collect()
}

pub struct InsightSynthesizer {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl InsightSynthesizer {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub fn template_only() -> Self {
        Self { generator: None }
    }

    async fn executive_summary(
        &self,
        entity: &str,
        outputs: &AgentOutputs,
        score: &PreparationScore,
    ) -> (String, ContentSource) {
        if let Some(generator) = self.usable_generator(outputs) {
            let prompt = summary_prompt(entity, outputs);
            match generator
                .generate(&prompt, Some(SUMMARY_SYSTEM_PROMPT), 0.7, 800)
                .await
            {
                Ok(text) if !text.trim().is_empty() => return (text, ContentSource::Llm),
                Ok(_) => warn!(entity, "Generator returned empty summary, using template"),
                Err(e) => warn!(entity, error = %e, "Summary generation failed, using template"),
            }
        }

        (
            template::executive_summary(entity, outputs, score),
            ContentSource::Template,
        )
    }

    async fn talking_points(&self, entity: &str, outputs: &AgentOutputs) -> Vec<String> {
        if let Some(generator) = self.usable_generator(outputs) {
            let prompt = talking_points_prompt(outputs);
            match generator
                .generate(&prompt, Some(TALKING_POINTS_SYSTEM_PROMPT), 0.8, 500)
                .await
            {
                Ok(text) => {
                    let points = parse_talking_points(&text);
                    if !points.is_empty() {
                        return points;
                    }
                    warn!(entity, "Could not parse generated talking points, using template");
                }
                Err(e) => warn!(entity, error = %e, "Talking point generation failed, using template"),
            }
        }

        template::talking_points(entity, outputs)
    }

    /// The generator is only called when some non-error slot has insights to summarize.
    fn usable_generator(&self, outputs: &AgentOutputs) -> Option<&Arc<dyn TextGenerator>> {
        let has_material = outputs
            .present()
            .any(|(_, o)| o.status != TaskStatus::Error && !o.insights.is_empty());
        self.generator.as_ref().filter(|_| has_material)
    }
}

#[async_trait]
impl Worker for InsightSynthesizer {
    fn name(&self) -> &'static str {
        "InsightSynthesizerAgent"
    }

    fn description(&self) -> &'static str {
        "Synthesizes data from multiple agents into actionable insights"
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &[
            "Multi-source data synthesis",
            "Actionable insights generation",
            "Talking points creation",
            "Opportunity identification",
            "Risk assessment",
        ]
    }

    fn data_sources(&self) -> &'static [&'static str] {
        &["Gemini", "All agent outputs"]
    }

    async fn gather(&self, input: &TaskInput) -> Result<Findings> {
        let outputs = input.agent_outputs()?.unwrap_or_default();
        let score = preparation_score(&outputs);

        debug!(
            entity = %input.entity,
            present = score.present_agents,
            score = score.score,
            "Synthesizing insights"
        );

        let (executive_summary, source) =
            self.executive_summary(&input.entity, &outputs, &score).await;
        let talking_points = self.talking_points(&input.entity, &outputs).await;
        let action_items = template::action_items(&input.entity, &outputs);
        let opportunities = template::opportunities(&outputs);
        let risks = template::risks(&outputs);

        let insights = meta_insights(&score, opportunities.len(), risks.len());
        let confidence = composite_confidence(&outputs);

        let mut data = Map::new();
        data.insert("executive_summary".to_string(), json!(executive_summary));
        data.insert("talking_points".to_string(), json!(talking_points));
        data.insert("action_items".to_string(), serde_json::to_value(&action_items)?);
        data.insert("opportunities".to_string(), serde_json::to_value(&opportunities)?);
        data.insert("risks".to_string(), serde_json::to_value(&risks)?);
        data.insert(
            "meeting_preparation_score".to_string(),
            serde_json::to_value(&score)?,
        );
        data.insert("content_source".to_string(), serde_json::to_value(source)?);
        data.insert("last_updated".to_string(), json!(Utc::now().to_rfc3339()));

        let usable = outputs
            .present()
            .filter(|(_, o)| o.status != TaskStatus::Error)
            .count();
        if usable == WorkerSlot::ALL.len() {
            Ok(Findings::complete(data, insights, confidence))
        } else {
            Ok(Findings::degraded(data, insights, confidence))
        }
    }
}

fn meta_insights(score: &PreparationScore, opportunities: usize, risks: usize) -> Vec<String> {
    vec![
        format!("Meeting preparation: {} ({}%)", score.level, score.percentage),
        format!(
            "{} of {} data sources available",
            score.present_agents,
            WorkerSlot::ALL.len()
        ),
        format!("{} opportunities identified", opportunities),
        format!("{} risks flagged", risks),
    ]
}

/// Mean confidence of present non-error outputs, scaled by coverage.
fn composite_confidence(outputs: &AgentOutputs) -> f64 {
    let usable: Vec<f64> = outputs
        .present()
        .filter(|(_, o)| o.status != TaskStatus::Error)
        .map(|(_, o)| o.confidence)
        .collect();

    if usable.is_empty() {
        return 0.0;
    }

    let mean = usable.iter().sum::<f64>() / usable.len() as f64;
    let coverage = preparation_score(outputs).present_agents as f64 / WorkerSlot::ALL.len() as f64;
    (mean * coverage).clamp(0.0, 1.0)
}

fn bullet_list(outputs: &AgentOutputs, slot: WorkerSlot, limit: usize) -> String {
    outputs
        .get(slot)
        .map(|o| {
            o.insights
                .iter()
                .take(limit)
                .map(|i| format!("• {}", i))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

fn summary_prompt(entity: &str, outputs: &AgentOutputs) -> String {
    format!(
        r#"Generate an executive summary for a sales meeting with {entity}.

**Research Intelligence:**
{research}

**News & Announcements:**
{news}

**Financial Data:**
{financial}

**Social Media Sentiment:**
{social}

Keep it under 400 words but information-dense."#,
        entity = entity,
        research = bullet_list(outputs, WorkerSlot::Research, 10),
        news = bullet_list(outputs, WorkerSlot::News, 8),
        financial = bullet_list(outputs, WorkerSlot::Financial, 8),
        social = bullet_list(outputs, WorkerSlot::SocialMedia, 6),
    )
}

fn talking_points_prompt(outputs: &AgentOutputs) -> String {
    let joined = |slot: WorkerSlot, limit: usize| {
        outputs
            .get(slot)
            .map(|o| {
                o.insights
                    .iter()
                    .take(limit)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_default()
    };

    format!(
        "Based on this company intelligence, generate talking points:\n\n\
         Research: {}\nNews: {}\nFinancial: {}\n\n\
         Return only a JSON array of 5-7 talking point strings.",
        joined(WorkerSlot::Research, 8),
        joined(WorkerSlot::News, 6),
        joined(WorkerSlot::Financial, 6),
    )
}

/// Accepts a JSON array anywhere in the text, else one point per line.
fn parse_talking_points(text: &str) -> Vec<String> {
    if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
        if start < end {
            if let Ok(points) = serde_json::from_str::<Vec<String>>(&text[start..=end]) {
                return points
                    .into_iter()
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .take(MAX_TALKING_POINTS)
                    .collect();
            }
        }
    }

    text.lines()
        .map(|line| line.trim().trim_start_matches(['-', '•', '*', ' ']).trim())
        .filter(|line| line.chars().count() > 20)
        .map(str::to_string)
        .take(MAX_TALKING_POINTS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrchestrationError;
    use crate::models::TaskOutput;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn output(worker: &str, insights: &[&str], status: TaskStatus) -> TaskOutput {
        let insights = insights.iter().map(|s| s.to_string()).collect();
        match status {
            TaskStatus::Success => TaskOutput::success(worker, Map::new(), insights, 0.8, 1),
            TaskStatus::Partial => TaskOutput::partial(worker, Map::new(), insights, 0.4, 1),
            TaskStatus::Error => TaskOutput::failure(worker, "boom", 1),
        }
    }

    fn full_map() -> AgentOutputs {
        let mut outputs = AgentOutputs::new();
        outputs.insert(
            WorkerSlot::Research,
            Some(output("ResearchAgent", &["r1", "r2", "r3", "r4", "r5"], TaskStatus::Success)),
        );
        outputs.insert(
            WorkerSlot::News,
            Some(output("NewsAgent", &["n1", "n2", "n3", "n4"], TaskStatus::Success)),
        );
        outputs.insert(
            WorkerSlot::Financial,
            Some(output("FinancialAgent", &["f1", "f2", "f3"], TaskStatus::Success)),
        );
        outputs.insert(
            WorkerSlot::SocialMedia,
            Some(output(
                "SocialMediaAgent",
                &["s1", "s2", "s3", "s4", "s5", "s6"],
                TaskStatus::Success,
            )),
        );
        outputs
    }

    struct CountingGenerator {
        calls: AtomicUsize,
        reply: std::result::Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl TextGenerator for CountingGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _system_prompt: Option<&str>,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .map_err(|e| OrchestrationError::Llm(e.to_string()))
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_score_for_every_presence_combination() {
        for mask in 0u8..16 {
            let mut outputs = AgentOutputs::new();
            for (i, slot) in WorkerSlot::ALL.iter().enumerate() {
                let present = mask & (1 << i) != 0;
                outputs.insert(
                    *slot,
                    present.then(|| output("W", &["x"], TaskStatus::Success)),
                );
            }

            let present = mask.count_ones() as usize;
            let score = preparation_score(&outputs);
            assert_eq!(score.score, 25 * present as u32, "mask {:04b}", mask);
            assert_eq!(score.ready, present >= 3, "mask {:04b}", mask);
            assert_eq!(score.max_score, 100);
        }
    }

    #[test]
    fn test_partial_and_error_outputs_count_as_present() {
        let mut outputs = AgentOutputs::new();
        outputs.insert(WorkerSlot::Research, Some(output("R", &[], TaskStatus::Partial)));
        outputs.insert(WorkerSlot::News, Some(output("N", &[], TaskStatus::Error)));
        outputs.insert(WorkerSlot::Financial, None);

        let score = preparation_score(&outputs);
        assert_eq!(score.score, 50);
        assert_eq!(score.level, PrepLevel::Fair);
        assert!(!score.ready);
    }

    #[test]
    fn test_rollup_takes_two_per_slot_in_order() {
        let top = rollup_insights(&full_map());
        assert_eq!(top, vec!["r1", "r2", "n1", "n2", "f1"]);
    }

    #[test]
    fn test_rollup_skips_absent_slots() {
        let mut outputs = full_map();
        outputs.insert(WorkerSlot::Research, None);
        let top = rollup_insights(&outputs);
        assert_eq!(top, vec!["n1", "n2", "f1", "f2", "s1"]);
    }

    #[tokio::test]
    async fn test_empty_map_uses_template() {
        let generator = Arc::new(CountingGenerator {
            calls: AtomicUsize::new(0),
            reply: Ok("should not be used"),
        });
        let synthesizer = InsightSynthesizer::new(Some(generator.clone()));

        let input = TaskInput::new("Acme")
            .with_agent_outputs(&AgentOutputs::new())
            .unwrap();
        let result = synthesizer.run(&input).await;

        assert_eq!(result.status, TaskStatus::Partial);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.data["content_source"], "template");
        assert_eq!(result.data["meeting_preparation_score"]["score"], 0);
        assert_eq!(result.data["meeting_preparation_score"]["level"], "Fair");
        assert_eq!(result.data["meeting_preparation_score"]["ready"], false);
        assert!(!result.data["executive_summary"].as_str().unwrap().is_empty());
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_missing_context_entry_is_an_empty_map() {
        let result = InsightSynthesizer::template_only()
            .run(&TaskInput::new("Acme"))
            .await;
        assert_eq!(result.status, TaskStatus::Partial);
        assert_eq!(result.data["meeting_preparation_score"]["score"], 0);
    }

    #[tokio::test]
    async fn test_generator_output_is_used() {
        let generator = Arc::new(CountingGenerator {
            calls: AtomicUsize::new(0),
            reply: Ok(r#"["Congratulate them on the recent expansion", "Ask how the new platform launch is going"]"#),
        });
        let synthesizer = InsightSynthesizer::new(Some(generator.clone()));

        let input = TaskInput::new("Acme").with_agent_outputs(&full_map()).unwrap();
        let result = synthesizer.run(&input).await;

        assert_eq!(result.status, TaskStatus::Success);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.data["content_source"], "llm");
        assert_eq!(result.data["talking_points"].as_array().unwrap().len(), 2);
        assert!((result.confidence - 0.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_generator_failure_falls_back() {
        let generator = Arc::new(CountingGenerator {
            calls: AtomicUsize::new(0),
            reply: Err("quota exceeded"),
        });
        let synthesizer = InsightSynthesizer::new(Some(generator));

        let input = TaskInput::new("Acme").with_agent_outputs(&full_map()).unwrap();
        let result = synthesizer.run(&input).await;

        assert_eq!(result.status, TaskStatus::Success);
        assert_eq!(result.data["content_source"], "template");
        assert!(!result.data["talking_points"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error_output() {
        let mut context = Map::new();
        context.insert(
            crate::models::AGENT_OUTPUTS_KEY.to_string(),
            json!({"research": "not an output"}),
        );
        let input = TaskInput::new("Acme").with_context(context);

        let result = InsightSynthesizer::template_only().run(&input).await;
        assert_eq!(result.status, TaskStatus::Error);
        assert!(result.data.is_empty());
    }

    #[tokio::test]
    async fn test_all_error_outputs_skip_the_generator() {
        let generator = Arc::new(CountingGenerator {
            calls: AtomicUsize::new(0),
            reply: Ok("Acme is a thriving market leader with strong growth."),
        });
        let synthesizer = InsightSynthesizer::new(Some(generator.clone()));

        let mut outputs = AgentOutputs::new();
        for slot in WorkerSlot::ALL {
            outputs.insert(slot, Some(output("W", &[], TaskStatus::Error)));
        }
        let input = TaskInput::new("Acme").with_agent_outputs(&outputs).unwrap();
        let result = synthesizer.run(&input).await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.data["content_source"], "template");
        assert_eq!(result.status, TaskStatus::Partial);
        assert_eq!(result.data["meeting_preparation_score"]["score"], 100);
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_one_error_slot_makes_synthesis_partial() {
        let mut outputs = full_map();
        outputs.insert(WorkerSlot::News, Some(output("NewsAgent", &[], TaskStatus::Error)));

        let input = TaskInput::new("Acme").with_agent_outputs(&outputs).unwrap();
        let result = InsightSynthesizer::template_only().run(&input).await;

        assert_eq!(result.status, TaskStatus::Partial);
        assert_eq!(result.data["meeting_preparation_score"]["score"], 100);
    }

    #[test]
    fn test_parse_talking_points_counts_characters() {
        // 11 characters, 22 bytes
        let points = parse_talking_points("- ééééééééééé\n- Mention the cloud partnership briefly");
        assert_eq!(points, vec!["Mention the cloud partnership briefly"]);
    }

    #[test]
    fn test_parse_talking_points() {
        let points = parse_talking_points("Sure!\n[\"one point\", \"two point\"]\nThanks");
        assert_eq!(points, vec!["one point", "two point"]);

        let points = parse_talking_points(
            "- Congratulate the team on the funding round\n- short\n• Mention the cloud partnership briefly",
        );
        assert_eq!(points.len(), 2);
        assert!(points[0].starts_with("Congratulate"));
    }
}
