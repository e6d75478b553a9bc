//! End-to-end scheduler behavior against instrumented test-double workers.

use async_trait::async_trait;
use sales_insight_orchestrator::{
    AggregateResult, Findings, InsightSynthesizer, OrchestrationError, Orchestrator, PrepLevel,
    Priority, RunKind, RunStatus, TaskInput, TaskStatus, Worker, WorkerSet, WorkerSlot,
};
use serde_json::{json, Map};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Copy, Debug)]
enum Behavior {
    Succeed(usize),
    Degrade(usize),
    Fail,
    Panic,
    Hang,
}

struct Scripted {
    name: &'static str,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Worker for Scripted {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "instrumented test double"
    }

    async fn gather(&self, input: &TaskInput) -> sales_insight_orchestrator::Result<Findings> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let insights = |n: usize| -> Vec<String> {
            (0..n).map(|i| format!("{} insight {}", self.name, i)).collect()
        };
        let mut data = Map::new();
        data.insert("entity".to_string(), json!(input.entity));

        match self.behavior {
            Behavior::Succeed(n) => Ok(Findings::complete(data, insights(n), 0.9)),
            Behavior::Degrade(n) => Ok(Findings::degraded(data, insights(n), 0.4)),
            Behavior::Fail => Err(OrchestrationError::Worker("upstream unavailable".to_string())),
            Behavior::Panic => panic!("{} blew up", self.name),
            Behavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

struct Harness {
    orchestrator: Orchestrator,
    research: Arc<AtomicUsize>,
    news: Arc<AtomicUsize>,
    financial: Arc<AtomicUsize>,
    social: Arc<AtomicUsize>,
    synthesis: Arc<AtomicUsize>,
}

impl Harness {
    fn total_calls(&self) -> usize {
        [
            &self.research,
            &self.news,
            &self.financial,
            &self.social,
            &self.synthesis,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

fn scripted(name: &'static str, behavior: Behavior) -> (Arc<dyn Worker>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let worker = Scripted {
        name,
        behavior,
        calls: Arc::clone(&calls),
    };
    (Arc::new(worker), calls)
}

/// Counts calls to the real synthesizer without changing what it does.
struct CountingSynthesizer {
    inner: InsightSynthesizer,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Worker for CountingSynthesizer {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn description(&self) -> &'static str {
        self.inner.description()
    }

    async fn gather(&self, input: &TaskInput) -> sales_insight_orchestrator::Result<Findings> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.gather(input).await
    }
}

fn harness(behaviors: [Behavior; 4]) -> Harness {
    let (research, research_calls) = scripted("ResearchAgent", behaviors[0]);
    let (news, news_calls) = scripted("NewsAgent", behaviors[1]);
    let (financial, financial_calls) = scripted("FinancialAgent", behaviors[2]);
    let (social, social_calls) = scripted("SocialMediaAgent", behaviors[3]);

    let synthesis_calls = Arc::new(AtomicUsize::new(0));
    let synthesizer = Arc::new(CountingSynthesizer {
        inner: InsightSynthesizer::template_only(),
        calls: Arc::clone(&synthesis_calls),
    });

    let workers = WorkerSet {
        research,
        news,
        financial,
        social,
    };

    Harness {
        orchestrator: Orchestrator::new(workers, synthesizer, Duration::from_millis(200)),
        research: research_calls,
        news: news_calls,
        financial: financial_calls,
        social: social_calls,
        synthesis: synthesis_calls,
    }
}

async fn run(h: &Harness, entity: &str) -> AggregateResult {
    h.orchestrator
        .run_all(entity, Map::new(), 30, Priority::Medium)
        .await
        .unwrap()
}

fn prep_score(result: &AggregateResult) -> (u32, bool, PrepLevel) {
    let synthesis = result.synthesis.as_ref().unwrap();
    let score = &synthesis.data["meeting_preparation_score"];
    (
        score["score"].as_u64().unwrap() as u32,
        score["ready"].as_bool().unwrap(),
        serde_json::from_value(score["level"].clone()).unwrap(),
    )
}

#[tokio::test]
async fn empty_entity_is_rejected_before_any_worker_runs() {
    let h = harness([Behavior::Succeed(2); 4]);

    for entity in ["", "   ", "\t\n"] {
        let err = h
            .orchestrator
            .run_all(entity, Map::new(), 30, Priority::High)
            .await
            .unwrap_err();
        assert!(err.is_validation(), "expected validation error, got {}", err);

        let err = h.orchestrator.quick_brief(entity).await.unwrap_err();
        assert!(err.is_validation());
    }

    assert_eq!(h.total_calls(), 0);
}

#[tokio::test]
async fn completeness_tracks_presence_across_all_combinations() {
    for mask in 0u8..16 {
        let behaviors: [Behavior; 4] = std::array::from_fn(|i| {
            if mask & (1 << i) != 0 {
                Behavior::Succeed(1)
            } else {
                Behavior::Panic
            }
        });
        let present = mask.count_ones();

        let h = harness(behaviors);
        let result = run(&h, "Acme").await;

        assert_eq!(result.status, RunStatus::Success, "mask {:04b}", mask);
        assert_eq!(result.agent_outputs.present_count() as u32, present);
        for (i, slot) in WorkerSlot::ALL.iter().enumerate() {
            assert_eq!(result.agent_outputs.is_present(*slot), mask & (1 << i) != 0);
        }

        let (score, ready, _) = prep_score(&result);
        assert_eq!(score, 25 * present, "mask {:04b}", mask);
        assert_eq!(ready, present >= 3, "mask {:04b}", mask);
        assert_eq!(result.summary.ready_for_meeting, present >= 3);
        assert_eq!(
            result.summary.data_completeness,
            format!("{}/4 agents successful", present)
        );
    }
}

#[tokio::test]
async fn error_outputs_count_as_present_but_not_successful() {
    let h = harness([
        Behavior::Fail,
        Behavior::Fail,
        Behavior::Succeed(1),
        Behavior::Degrade(1),
    ]);
    let result = run(&h, "Acme").await;

    let research = result.agent_outputs.get(WorkerSlot::Research).unwrap();
    assert_eq!(research.status, TaskStatus::Error);
    assert_eq!(research.confidence, 0.0);
    assert!(research.data.is_empty());
    assert!(research.error.as_deref().unwrap().contains("upstream unavailable"));

    let (score, ready, level) = prep_score(&result);
    assert_eq!(score, 100);
    assert!(ready);
    assert_eq!(level, PrepLevel::Excellent);

    assert_eq!(result.summary.data_completeness, "1/4 agents successful");
    assert!(!result.summary.ready_for_meeting);
}

#[tokio::test]
async fn a_panicking_worker_does_not_disturb_its_siblings() {
    let baseline = run(&harness([Behavior::Succeed(3); 4]), "Acme").await;

    let h = harness([
        Behavior::Succeed(3),
        Behavior::Panic,
        Behavior::Succeed(3),
        Behavior::Succeed(3),
    ]);
    let result = run(&h, "Acme").await;

    assert_eq!(result.status, RunStatus::Success);
    assert!(!result.agent_outputs.is_present(WorkerSlot::News));
    assert_eq!(h.news.load(Ordering::SeqCst), 1);

    for slot in [WorkerSlot::Research, WorkerSlot::Financial, WorkerSlot::SocialMedia] {
        let expected = baseline.agent_outputs.get(slot).unwrap();
        let actual = result.agent_outputs.get(slot).unwrap();
        assert_eq!(actual.status, expected.status);
        assert_eq!(actual.insights, expected.insights);
        assert_eq!(actual.data, expected.data);
        assert_eq!(actual.confidence, expected.confidence);
    }
}

#[tokio::test]
async fn a_hung_worker_times_out_into_an_error_output() {
    let h = harness([
        Behavior::Succeed(1),
        Behavior::Succeed(1),
        Behavior::Hang,
        Behavior::Succeed(1),
    ]);
    let result = run(&h, "Acme").await;

    let financial = result.agent_outputs.get(WorkerSlot::Financial).unwrap();
    assert_eq!(financial.worker, "FinancialAgent");
    assert_eq!(financial.status, TaskStatus::Error);
    assert!(financial.error.as_deref().unwrap().contains("timed out"));
    assert_eq!(result.summary.data_completeness, "3/4 agents successful");
    assert!(result.summary.ready_for_meeting);
}

#[tokio::test]
async fn synthesis_still_reports_when_every_worker_is_absent() {
    let h = harness([Behavior::Panic; 4]);
    let result = run(&h, "Acme").await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.agent_outputs.present_count(), 0);
    assert_eq!(h.synthesis.load(Ordering::SeqCst), 1);

    let synthesis = result.synthesis.as_ref().unwrap();
    assert_ne!(synthesis.status, TaskStatus::Error);
    let summary = synthesis.data["executive_summary"].as_str().unwrap();
    assert!(!summary.is_empty());
    assert_eq!(synthesis.data["content_source"], "template");

    let (score, ready, level) = prep_score(&result);
    assert_eq!(score, 0);
    assert!(!ready);
    assert_eq!(level, PrepLevel::Fair);
    assert!(result.summary.top_insights.is_empty());
}

#[tokio::test]
async fn synthesizer_crash_only_degrades_the_synthesis_slot() {
    let (research, _) = scripted("ResearchAgent", Behavior::Succeed(1));
    let (news, _) = scripted("NewsAgent", Behavior::Succeed(1));
    let (financial, _) = scripted("FinancialAgent", Behavior::Succeed(1));
    let (social, _) = scripted("SocialMediaAgent", Behavior::Succeed(1));
    let (synthesizer, _) = scripted("InsightSynthesizerAgent", Behavior::Panic);

    let orchestrator = Orchestrator::new(
        WorkerSet {
            research,
            news,
            financial,
            social,
        },
        synthesizer,
        Duration::from_millis(200),
    );
    let result = orchestrator
        .run_all("Acme", Map::new(), 30, Priority::Low)
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Success);
    let synthesis = result.synthesis.as_ref().unwrap();
    assert_eq!(synthesis.status, TaskStatus::Error);
    assert!(synthesis.error.as_deref().unwrap().contains("Aggregation fault"));
    assert!(result.summary.preparation_score.is_none());
    assert_eq!(result.summary.data_completeness, "4/4 agents successful");
}

#[tokio::test]
async fn quick_brief_skips_financial_social_and_synthesis() {
    let h = harness([Behavior::Succeed(2); 4]);
    let result = h.orchestrator.quick_brief("Acme").await.unwrap();

    assert_eq!(result.kind, RunKind::QuickBrief);
    assert_eq!(h.research.load(Ordering::SeqCst), 1);
    assert_eq!(h.news.load(Ordering::SeqCst), 1);
    assert_eq!(h.financial.load(Ordering::SeqCst), 0);
    assert_eq!(h.social.load(Ordering::SeqCst), 0);
    assert_eq!(h.synthesis.load(Ordering::SeqCst), 0);

    assert!(result.synthesis.is_none());
    assert_eq!(result.summary.data_completeness, "2/2 agents successful");
    assert_eq!(result.summary.top_insights.len(), 4);
}

#[tokio::test]
async fn a_hung_synthesizer_times_out_into_an_error_output() {
    let (research, _) = scripted("ResearchAgent", Behavior::Succeed(1));
    let (news, _) = scripted("NewsAgent", Behavior::Succeed(1));
    let (financial, _) = scripted("FinancialAgent", Behavior::Succeed(1));
    let (social, _) = scripted("SocialMediaAgent", Behavior::Succeed(1));
    let (synthesizer, synthesis_calls) = scripted("InsightSynthesizerAgent", Behavior::Hang);

    let orchestrator = Orchestrator::new(
        WorkerSet {
            research,
            news,
            financial,
            social,
        },
        synthesizer,
        Duration::from_millis(100),
    );
    let result = orchestrator
        .run_all("Acme", Map::new(), 30, Priority::Medium)
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(synthesis_calls.load(Ordering::SeqCst), 1);

    let synthesis = result.synthesis.as_ref().unwrap();
    assert_eq!(synthesis.worker, "InsightSynthesizerAgent");
    assert_eq!(synthesis.status, TaskStatus::Error);
    let error = synthesis.error.as_deref().unwrap();
    assert!(error.starts_with("Aggregation fault"), "{}", error);
    assert!(error.contains("timed out after 100ms"), "{}", error);

    assert!(result.summary.preparation_score.is_none());
    assert_eq!(result.summary.data_completeness, "4/4 agents successful");
    assert!(result.summary.ready_for_meeting);
}

#[tokio::test]
async fn quick_brief_isolates_a_panicking_worker() {
    let h = harness([
        Behavior::Panic,
        Behavior::Succeed(2),
        Behavior::Succeed(2),
        Behavior::Succeed(2),
    ]);
    let result = h.orchestrator.quick_brief("Acme").await.unwrap();

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(h.research.load(Ordering::SeqCst), 1);
    assert!(!result.agent_outputs.is_present(WorkerSlot::Research));
    let news = result.agent_outputs.get(WorkerSlot::News).unwrap();
    assert_eq!(news.status, TaskStatus::Success);
    assert_eq!(news.insights, vec!["NewsAgent insight 0", "NewsAgent insight 1"]);

    assert_eq!(result.summary.data_completeness, "1/2 agents successful");
    assert!(!result.summary.ready_for_meeting);
    assert_eq!(h.financial.load(Ordering::SeqCst), 0);
    assert_eq!(h.social.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn quick_brief_times_out_a_hung_worker() {
    let h = harness([
        Behavior::Succeed(1),
        Behavior::Hang,
        Behavior::Succeed(1),
        Behavior::Succeed(1),
    ]);
    let result = h.orchestrator.quick_brief("Acme").await.unwrap();

    let news = result.agent_outputs.get(WorkerSlot::News).unwrap();
    assert_eq!(news.status, TaskStatus::Error);
    let error = news.error.as_deref().unwrap();
    assert!(error.starts_with("Worker error"), "{}", error);
    assert!(error.contains("timed out"), "{}", error);
    assert!(result.agent_outputs.get(WorkerSlot::Research).unwrap().is_success());
    assert_eq!(result.summary.data_completeness, "1/2 agents successful");
}

#[tokio::test]
async fn metrics_count_absent_and_failed_workers_as_unsuccessful() {
    let h = harness([
        Behavior::Succeed(1),
        Behavior::Panic,
        Behavior::Fail,
        Behavior::Degrade(1),
    ]);
    run(&h, "Acme").await;

    let metrics = h.orchestrator.metrics().await;
    assert_eq!(metrics.total_runs, 1);

    let rate = |name: &str| {
        metrics
            .agents
            .iter()
            .find(|a| a.name == name)
            .map(|a| (a.executions, a.success_rate))
            .unwrap()
    };
    assert_eq!(rate("ResearchAgent"), (1, 1.0));
    assert_eq!(rate("NewsAgent"), (1, 0.0));
    assert_eq!(rate("FinancialAgent"), (1, 0.0));
    assert_eq!(rate("SocialMediaAgent"), (1, 0.0));
    assert_eq!(rate("InsightSynthesizerAgent"), (1, 0.0));

    let news = metrics.agents.iter().find(|a| a.name == "NewsAgent").unwrap();
    assert_eq!(news.avg_execution_time_ms, 0.0);
    assert_eq!(news.avg_confidence, 0.0);
}

#[tokio::test]
async fn repeated_runs_have_the_same_shape() {
    let h = harness([
        Behavior::Succeed(2),
        Behavior::Fail,
        Behavior::Panic,
        Behavior::Degrade(1),
    ]);

    let first = run(&h, "Acme").await;
    let second = run(&h, "Acme").await;

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(prep_score(&first), prep_score(&second));
    assert_eq!(first.summary.data_completeness, second.summary.data_completeness);
    assert_eq!(first.summary.ready_for_meeting, second.summary.ready_for_meeting);
    assert_eq!(first.summary.top_insights, second.summary.top_insights);

    let presence = |r: &AggregateResult| -> Vec<WorkerSlot> {
        r.agent_outputs.present().map(|(slot, _)| slot).collect()
    };
    assert_eq!(presence(&first), presence(&second));
    assert_eq!(presence(&first), vec![WorkerSlot::Research, WorkerSlot::News, WorkerSlot::SocialMedia]);
}

#[tokio::test]
async fn top_insights_take_two_per_worker_capped_at_five() {
    let h = harness([
        Behavior::Succeed(5),
        Behavior::Succeed(4),
        Behavior::Succeed(3),
        Behavior::Succeed(6),
    ]);
    let result = run(&h, "Acme").await;

    assert_eq!(
        result.summary.top_insights,
        vec![
            "ResearchAgent insight 0",
            "ResearchAgent insight 1",
            "NewsAgent insight 0",
            "NewsAgent insight 1",
            "FinancialAgent insight 0",
        ]
    );
}
