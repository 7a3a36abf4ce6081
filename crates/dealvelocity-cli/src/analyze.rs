//! Contract analysis: run the pipeline and turn its output into redline changes.

use anyhow::Context;
use dealvelocity_ai::{AnalyzerConfig, ContractAnalyzer};
use dealvelocity_core::{AnalysisResult, ReviewError, ReviewLedger, RiskLevel};

/// Run the full pipeline over `text`.
pub async fn run_analysis(config: AnalyzerConfig, text: &str) -> anyhow::Result<AnalysisResult> {
    eprintln!(
        "  Analysing {} chars with {} (threshold {}, batch {})",
        text.chars().count(),
        config.model,
        config.prescreen_threshold,
        config.batch_size
    );
    let analyzer = ContractAnalyzer::from_config(config)?;
    let result = analyzer
        .analyze(text)
        .await
        .context("contract analysis failed")?;
    eprintln!(
        "  Analysed {} clauses in {:.1}s",
        result.clauses.len(),
        result.processing_time_ms as f64 / 1000.0
    );
    Ok(result)
}

/// Review ledger with every changing suggestion at or above `min_level` accepted.
pub fn accept_from_level(
    result: &AnalysisResult,
    min_level: RiskLevel,
) -> Result<ReviewLedger, ReviewError> {
    let mut ledger = ReviewLedger::from_result(result);
    let ids: Vec<_> = ledger
        .iter()
        .filter(|(_, a)| a.risk_level >= min_level && a.proposes_change())
        .map(|(id, _)| id)
        .collect();
    for id in ids {
        ledger.accept(id)?;
    }
    Ok(ledger)
}
