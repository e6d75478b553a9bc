//! Deterministic content built purely from the structured fields of the
//! worker map. None of these functions can fail, and all of them produce
//! usable output for an empty map.

use super::{ActionItem, Opportunity, Risk};
use crate::models::{AgentOutputs, PreparationScore, TaskStatus, WorkerSlot};
use serde_json::Value;

fn section_title(slot: WorkerSlot) -> &'static str {
    match slot {
        WorkerSlot::Research => "Research Intelligence",
        WorkerSlot::News => "News & Announcements",
        WorkerSlot::Financial => "Financial Data",
        WorkerSlot::SocialMedia => "Social Media Sentiment",
    }
}

pub fn executive_summary(entity: &str, outputs: &AgentOutputs, score: &PreparationScore) -> String {
    let mut out = format!("**{} - Executive Brief**\n\n", entity);

    let mut sections = 0;
    for (slot, output) in outputs.present() {
        if output.insights.is_empty() {
            continue;
        }
        out.push_str(&format!("**{}:**\n", section_title(slot)));
        for insight in output.insights.iter().take(3) {
            out.push_str(&format!("• {}\n", insight));
        }
        out.push('\n');
        sections += 1;
    }

    if sections == 0 {
        out.push_str(&format!(
            "No source data could be gathered for {} in this run. \
             Treat this brief as a placeholder and re-run before the meeting.\n\n",
            entity
        ));
    }

    out.push_str(&format!(
        "**Coverage:** {} of {} sources, preparation {} ({}%).",
        score.present_agents,
        WorkerSlot::ALL.len(),
        score.level,
        score.percentage
    ));

    out
}

pub fn talking_points(entity: &str, outputs: &AgentOutputs) -> Vec<String> {
    let mut points: Vec<String> = outputs
        .present()
        .filter(|(_, o)| o.status != TaskStatus::Error)
        .flat_map(|(slot, o)| {
            o.insights
                .iter()
                .take(2)
                .map(move |i| format!("{}: {}", section_title(slot), i))
        })
        .take(5)
        .collect();

    points.push(format!(
        "Ask what {} is prioritizing over the next two quarters",
        entity
    ));
    points.push("Confirm who else is involved in evaluating new vendors".to_string());

    points
}

pub fn action_items(entity: &str, outputs: &AgentOutputs) -> Vec<ActionItem> {
    let mut items = Vec::new();

    if let Some(makers) = outputs
        .get(WorkerSlot::Research)
        .and_then(|o| o.data.get("decision_makers"))
        .and_then(Value::as_array)
    {
        for title in makers
            .iter()
            .filter_map(|m| m.get("title").and_then(Value::as_str))
            .take(2)
        {
            items.push(ActionItem {
                action: format!("Reach out to the {} before the meeting", title),
                priority: "High".to_string(),
                due: "Before meeting".to_string(),
            });
        }
    }

    for (slot, output) in outputs.iter() {
        let degraded = match output {
            None => true,
            Some(o) => o.status != TaskStatus::Success,
        };
        if degraded {
            items.push(ActionItem {
                action: format!("Manually verify {} before relying on it", section_title(slot)),
                priority: "Medium".to_string(),
                due: "Before meeting".to_string(),
            });
        }
    }

    items.push(ActionItem {
        action: format!("Prepare an ROI summary tailored to {}", entity),
        priority: "High".to_string(),
        due: "Before meeting".to_string(),
    });

    items
}

fn metric(outputs: &AgentOutputs, slot: WorkerSlot, path: &[&str]) -> Option<f64> {
    let output = outputs.get(slot)?;
    let (first, rest) = path.split_first()?;
    let mut value = output.data.get(*first)?;
    for key in rest {
        value = value.get(*key)?;
    }
    value.as_f64()
}

pub fn opportunities(outputs: &AgentOutputs) -> Vec<Opportunity> {
    let mut found = Vec::new();

    if let Some(growth) = metric(
        outputs,
        WorkerSlot::Financial,
        &["financial_metrics", "revenue_growth_yoy_pct"],
    ) {
        if growth >= 30.0 {
            found.push(Opportunity {
                opportunity: "Growth Budget".to_string(),
                description: format!(
                    "{:.0}% revenue growth suggests budget for scaling tools",
                    growth
                ),
                confidence: "High".to_string(),
            });
        }
    }

    if let Some(openings) = metric(outputs, WorkerSlot::SocialMedia, &["open_positions"]) {
        if openings >= 20.0 {
            found.push(Opportunity {
                opportunity: "Team Scaling".to_string(),
                description: format!(
                    "{:.0} open positions point to onboarding and enablement needs",
                    openings
                ),
                confidence: "Medium".to_string(),
            });
        }
    }

    if let Some(articles) = metric(outputs, WorkerSlot::News, &["total_articles"]) {
        if articles >= 3.0 {
            found.push(Opportunity {
                opportunity: "Recent Momentum".to_string(),
                description: "Steady news coverage gives natural conversation openers".to_string(),
                confidence: "Medium".to_string(),
            });
        }
    }

    found
}

pub fn risks(outputs: &AgentOutputs) -> Vec<Risk> {
    let mut found = Vec::new();

    for slot in WorkerSlot::ALL {
        match outputs.get(slot) {
            None => found.push(Risk {
                risk: format!("Missing {}", section_title(slot)),
                description: "This source did not report in this run".to_string(),
                severity: "Medium".to_string(),
                mitigation: "Fill the gap with manual research".to_string(),
            }),
            Some(o) if o.status == TaskStatus::Error => found.push(Risk {
                risk: format!("Failed {}", section_title(slot)),
                description: o
                    .error
                    .clone()
                    .unwrap_or_else(|| "Source reported an error".to_string()),
                severity: "Medium".to_string(),
                mitigation: "Re-run the brief or verify manually".to_string(),
            }),
            Some(_) => {}
        }
    }

    if let Some(churn) = metric(
        outputs,
        WorkerSlot::Financial,
        &["financial_metrics", "annual_churn_pct"],
    ) {
        if churn >= 12.0 {
            found.push(Risk {
                risk: "Elevated Churn".to_string(),
                description: format!("{:.0}% annual churn may tighten spending", churn),
                severity: "Low".to_string(),
                mitigation: "Lead with retention and time-to-value".to_string(),
            });
        }
    }

    let negative_sentiment = outputs
        .get(WorkerSlot::SocialMedia)
        .and_then(|o| o.data.get("sentiment"))
        .and_then(|s| s.get("label"))
        .and_then(Value::as_str)
        == Some("negative");
    if negative_sentiment {
        found.push(Risk {
            risk: "Negative Brand Sentiment".to_string(),
            description: "Public sentiment is currently negative".to_string(),
            severity: "Medium".to_string(),
            mitigation: "Avoid references to recent public coverage".to_string(),
        });
    }

    found
}
