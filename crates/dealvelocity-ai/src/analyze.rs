//! Stage 3: detailed per-clause risk analysis in bounded, sequential batches.

use dealvelocity_core::{Clause, ClauseAnalysis, RiskCategory, RiskLevel};
use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::AnalyzerConfig;
use crate::decode::{clamp_score, decode_json, excerpt};
use crate::error::AiError;
use crate::llm::{ChatModel, ChatRequest};
use crate::prompts;

#[derive(Deserialize)]
struct RawAnalysis {
    risk_score: f64,
    risk_category: RiskCategory,
    risk_level: RiskLevel,
    risk_description: String,
    impact_description: String,
    suggested_alternative: String,
    reasoning: String,
}

/// Decode one detailed analysis response for `clause`.
///
/// Clause text and type always come from the input clause, never the model.
pub fn parse_analysis(raw: &str, clause: &Clause) -> Result<ClauseAnalysis, serde_json::Error> {
    let parsed: RawAnalysis = decode_json(raw)?;
    // JSON cannot carry NaN or infinities, so clamping always yields a score.
    let risk_score = clamp_score(parsed.risk_score).unwrap_or(0);

    Ok(ClauseAnalysis {
        clause_text: clause.text.clone(),
        clause_type: clause.clause_type.clone(),
        risk_score,
        risk_category: parsed.risk_category,
        risk_level: parsed.risk_level,
        risk_description: parsed.risk_description,
        impact_description: parsed.impact_description,
        suggested_alternative: parsed.suggested_alternative,
        reasoning: parsed.reasoning,
        redline_status: None,
    })
}

/// Analyse a single clause.
///
/// Never fails: any error degrades to [`ClauseAnalysis::failed`].
pub async fn analyze_clause(
    model: &dyn ChatModel,
    config: &AnalyzerConfig,
    clause: &Clause,
) -> ClauseAnalysis {
    let request = ChatRequest::json(
        &config.model,
        prompts::JSON_ASSISTANT,
        prompts::analyze_risk_prompt(clause),
    );

    let result = match model.complete(&request).await {
        Ok(raw) => parse_analysis(&raw, clause)
            .inspect_err(|e| {
                warn!(error = %e, raw = excerpt(&raw, 200), "could not parse clause analysis");
            })
            .map_err(AiError::from),
        Err(e) => Err(e),
    };

    result.unwrap_or_else(|e| {
        warn!(
            error = %e,
            clause = excerpt(&clause.text, 80),
            "clause analysis failed, recording placeholder"
        );
        ClauseAnalysis::failed(clause)
    })
}

/// Analyse clauses `batch_size` at a time.
///
/// Calls within a batch run concurrently; the next batch starts only after
/// every call in the current one has resolved. Output order matches input.
pub async fn analyze_clauses(
    model: &dyn ChatModel,
    config: &AnalyzerConfig,
    clauses: &[Clause],
) -> Vec<ClauseAnalysis> {
    let batch_size = config.batch_size.max(1);
    let batch_count = clauses.len().div_ceil(batch_size);
    let mut analyses = Vec::with_capacity(clauses.len());

    for (n, batch) in clauses.chunks(batch_size).enumerate() {
        debug!(batch = n + 1, of = batch_count, size = batch.len(), "analysing batch");
        let results = join_all(batch.iter().map(|c| analyze_clause(model, config, c))).await;
        analyses.extend(results);
    }

    info!(count = analyses.len(), batches = batch_count, "detailed analysis complete");
    analyses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedModel, analysis_json};

    fn clauses(n: usize) -> Vec<Clause> {
        (0..n)
            .map(|i| Clause::new(format!("Clause number {i}."), "Liability"))
            .collect()
    }

    #[test]
    fn parse_uses_input_clause_identity() {
        let clause = Clause::new("Liability is unlimited.", "Liability");
        let raw = r#"{
            "clause_type": "Indemnity",
            "risk_score": 92,
            "risk_category": "Financial",
            "risk_level": "critical",
            "risk_description": "Uncapped exposure.",
            "impact_description": "A single claim could exceed contract value.",
            "suggested_alternative": "Liability is capped at fees paid in the prior 12 months.",
            "reasoning": "Unlimited liability is a standard red flag."
        }"#;
        let a = parse_analysis(raw, &clause).unwrap();
        assert_eq!(a.clause_type, "Liability");
        assert_eq!(a.clause_text, clause.text);
        assert_eq!(a.risk_score, 92);
        assert_eq!(a.risk_level, RiskLevel::Critical);
        assert_eq!(a.risk_category, RiskCategory::Financial);
        assert!(a.redline_status.is_none());
    }

    #[test]
    fn parse_rejects_missing_fields_and_bad_levels() {
        let clause = Clause::new("x", "Other");
        assert!(parse_analysis(r#"{"risk_score": 10}"#, &clause).is_err());

        let bad_level = analysis_json(10, "extreme").to_string();
        assert!(parse_analysis(&bad_level, &clause).is_err());
    }

    #[test]
    fn parse_clamps_out_of_range_scores() {
        let clause = Clause::new("x", "Other");
        let raw = analysis_json(180, "high").to_string();
        assert_eq!(parse_analysis(&raw, &clause).unwrap().risk_score, 100);
    }

    #[tokio::test]
    async fn failing_clause_degrades_and_others_continue() {
        let mut input = clauses(7);
        input[2] = Clause::new("FAIL this clause.", "Payment");
        let model = ScriptedModel::new().analysis_fails_for("FAIL");

        let out = analyze_clauses(&model, &AnalyzerConfig::new("k"), &input).await;

        assert_eq!(out.len(), 7);
        let failed = &out[2];
        assert_eq!(failed.risk_score, 0);
        assert_eq!(failed.risk_level, RiskLevel::Low);
        assert_eq!(failed.suggested_alternative, "FAIL this clause.");
        assert_eq!(failed.clause_type, "Payment");
        // Later clauses, including the second batch, were still analysed.
        assert!(out[3].risk_score > 0);
        assert!(out[6].risk_score > 0);
    }

    #[tokio::test]
    async fn malformed_response_degrades_like_a_failure() {
        let model = ScriptedModel::new().analysis_raw("{\"risk_score\": \"very\"}");
        let out = analyze_clauses(&model, &AnalyzerConfig::new("k"), &clauses(1)).await;
        assert_eq!(out[0], ClauseAnalysis::failed(&clauses(1)[0]));
    }

    #[tokio::test]
    async fn twelve_clauses_run_as_three_batches() {
        let model = ScriptedModel::new();
        let out = analyze_clauses(&model, &AnalyzerConfig::new("k"), &clauses(12)).await;

        assert_eq!(out.len(), 12);
        assert_eq!(model.analysis_batches(), vec![5, 5, 2]);
        assert_eq!(model.peak_in_flight(), 5);
    }

    #[tokio::test]
    async fn batch_size_is_configurable() {
        let model = ScriptedModel::new();
        let config = AnalyzerConfig::new("k").with_batch_size(3);
        analyze_clauses(&model, &config, &clauses(7)).await;

        assert_eq!(model.analysis_batches(), vec![3, 3, 1]);
        assert_eq!(model.peak_in_flight(), 3);
    }

    #[tokio::test]
    async fn output_preserves_input_order() {
        let model = ScriptedModel::new();
        let input = clauses(6);
        let out = analyze_clauses(&model, &AnalyzerConfig::new("k"), &input).await;
        let texts: Vec<&str> = out.iter().map(|a| a.clause_text.as_str()).collect();
        let expected: Vec<&str> = input.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, expected);
    }
}
