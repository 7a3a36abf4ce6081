//! Stage 2: one cheap model call that gives every clause a coarse 0–100 risk estimate.

use dealvelocity_core::{Clause, PrescreenedClause};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::AnalyzerConfig;
use crate::decode::{clamp_score, decode_json, excerpt};
use crate::llm::{ChatModel, ChatRequest};
use crate::prompts;

/// Score given to clauses the prescreener did not score. Sits above the
/// default threshold so unscored clauses still get a detailed analysis.
pub const FALLBACK_RISK: u8 = 50;

#[derive(Deserialize)]
#[serde(untagged)]
enum ScoresPayload {
    Wrapped { scores: Vec<Value> },
    Bare(Vec<Value>),
}

/// Decode prescreen scores and attach them to `clauses` by position.
///
/// Entries are matched on their `index`; the first entry for an index wins.
/// Clauses with no usable entry get [`FALLBACK_RISK`].
pub fn parse_prescreen(
    raw: &str,
    clauses: &[Clause],
) -> Result<Vec<PrescreenedClause>, serde_json::Error> {
    let entries = match decode_json::<ScoresPayload>(raw)? {
        ScoresPayload::Wrapped { scores } | ScoresPayload::Bare(scores) => scores,
    };

    let mut scores: Vec<Option<u8>> = vec![None; clauses.len()];
    for entry in &entries {
        let index = entry.get("index").and_then(Value::as_u64);
        let score = entry
            .get("risk_score")
            .and_then(Value::as_f64)
            .and_then(clamp_score);
        if let (Some(index), Some(score)) = (index, score)
            && let Some(slot) = scores.get_mut(index as usize)
            && slot.is_none()
        {
            *slot = Some(score);
        }
    }

    let unscored = scores.iter().filter(|s| s.is_none()).count();
    if unscored > 0 {
        warn!(unscored, "prescreen left clauses unscored, using fallback risk");
    }

    Ok(clauses
        .iter()
        .zip(scores)
        .map(|(clause, score)| PrescreenedClause {
            clause: clause.clone(),
            preliminary_risk: score.unwrap_or(FALLBACK_RISK),
        })
        .collect())
}

/// Every clause at [`FALLBACK_RISK`]: over-include rather than drop.
fn all_fallback(clauses: &[Clause]) -> Vec<PrescreenedClause> {
    clauses
        .iter()
        .map(|clause| PrescreenedClause {
            clause: clause.clone(),
            preliminary_risk: FALLBACK_RISK,
        })
        .collect()
}

/// Prescreen all clauses with a single model call.
///
/// Never fails: on a failed call or unusable response every clause gets
/// [`FALLBACK_RISK`].
pub async fn prescreen_clauses(
    model: &dyn ChatModel,
    config: &AnalyzerConfig,
    clauses: &[Clause],
) -> Vec<PrescreenedClause> {
    if clauses.is_empty() {
        return Vec::new();
    }

    let request = ChatRequest::json(
        &config.model,
        prompts::JSON_ASSISTANT,
        prompts::prescreen_prompt(clauses, config.excerpt_chars),
    );
    let raw = match model.complete(&request).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "prescreen call failed, analysing every clause");
            return all_fallback(clauses);
        }
    };

    match parse_prescreen(&raw, clauses) {
        Ok(prescreened) => {
            info!(count = prescreened.len(), "prescreened clauses");
            prescreened
        }
        Err(e) => {
            warn!(error = %e, raw = excerpt(&raw, 200), "could not parse prescreen scores");
            all_fallback(clauses)
        }
    }
}
