//! Digest builder
//!
//! Pure reduction of a run into the short human-facing summary.
//! Readiness here counts strict successes only; the synthesizer's
//! completeness score counts presence. Both are reported on purpose.

use crate::models::{AgentOutputs, Digest, PreparationScore, TaskOutput};
use crate::synthesis::{rollup_insights, READY_THRESHOLD};

pub fn build_digest(outputs: &AgentOutputs, synthesis: Option<&TaskOutput>) -> Digest {
    let successful = outputs.success_count();

    Digest {
        data_completeness: format!(
            "{}/{} agents successful",
            successful,
            outputs.slot_count()
        ),
        top_insights: rollup_insights(outputs),
        preparation_score: synthesis.and_then(preparation_score_of),
        ready_for_meeting: successful >= READY_THRESHOLD,
    }
}

fn preparation_score_of(synthesis: &TaskOutput) -> Option<PreparationScore> {
    synthesis
        .data
        .get("meeting_preparation_score")
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}
