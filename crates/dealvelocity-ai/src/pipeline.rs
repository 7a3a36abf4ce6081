//! Orchestrator: extraction → prescreen → threshold filter → batched analysis → aggregate.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use dealvelocity_core::{AnalysisResult, Clause, PrescreenedClause, overall_risk_score};
use tracing::{info, warn};

use crate::analyze::analyze_clauses;
use crate::config::AnalyzerConfig;
use crate::error::{AiError, PipelineError};
use crate::extract::extract_clauses;
use crate::llm::{ChatModel, ChatRequest, OpenAiClient};
use crate::prescreen::prescreen_clauses;

/// Keep clauses whose preliminary risk is at or above `threshold`, dropping the score.
pub fn select_for_analysis(prescreened: Vec<PrescreenedClause>, threshold: u8) -> Vec<Clause> {
    prescreened
        .into_iter()
        .filter(|p| p.preliminary_risk >= threshold)
        .map(|p| p.clause)
        .collect()
}

/// Counts the calls of one run and how many never reached the model.
struct Metered<'a> {
    inner: &'a dyn ChatModel,
    attempts: AtomicUsize,
    upstream_failures: AtomicUsize,
}

impl<'a> Metered<'a> {
    fn new(inner: &'a dyn ChatModel) -> Self {
        Self {
            inner,
            attempts: AtomicUsize::new(0),
            upstream_failures: AtomicUsize::new(0),
        }
    }

    fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    fn all_unreachable(&self) -> bool {
        let attempts = self.attempts();
        attempts > 0 && self.upstream_failures.load(Ordering::Relaxed) == attempts
    }
}

#[async_trait]
impl<'a> ChatModel for Metered<'a> {
    async fn complete(&self, request: &ChatRequest) -> Result<String, AiError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        let result = self.inner.complete(request).await;
        if let Err(e) = &result
            && e.is_upstream()
        {
            self.upstream_failures.fetch_add(1, Ordering::Relaxed);
        }
        result
    }
}

/// Runs the contract risk pipeline against one model.
pub struct ContractAnalyzer {
    model: Arc<dyn ChatModel>,
    config: AnalyzerConfig,
}

impl ContractAnalyzer {
    pub fn new(model: Arc<dyn ChatModel>, config: AnalyzerConfig) -> Self {
        Self { model, config }
    }

    /// Analyzer backed by an [`OpenAiClient`] built from `config`.
    pub fn from_config(config: AnalyzerConfig) -> Result<Self, PipelineError> {
        let client = OpenAiClient::new(&config).map_err(PipelineError::Config)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyse one contract.
    ///
    /// Stage failures degrade to their defaults. The run itself fails only on
    /// invalid configuration (before any call) or when every model call of the
    /// run failed to reach the model.
    pub async fn analyze(&self, contract_text: &str) -> Result<AnalysisResult, PipelineError> {
        self.config.validate().map_err(PipelineError::Config)?;

        let started = Instant::now();
        let model = Metered::new(self.model.as_ref());
        let config = &self.config;

        let clauses = extract_clauses(&model, config, contract_text).await;
        let prescreened = prescreen_clauses(&model, config, &clauses).await;
        let selected = select_for_analysis(prescreened, config.prescreen_threshold);
        info!(
            passed = selected.len(),
            skipped = clauses.len() - selected.len(),
            threshold = config.prescreen_threshold,
            "prescreen filter applied"
        );
        let analyses = analyze_clauses(&model, config, &selected).await;

        if model.all_unreachable() {
            warn!(attempts = model.attempts(), "every model call failed");
            return Err(PipelineError::ModelUnreachable {
                attempts: model.attempts(),
            });
        }

        let overall = overall_risk_score(&analyses);
        let processing_time_ms = started.elapsed().as_millis() as u64;
        info!(
            clauses = analyses.len(),
            overall_risk_score = overall,
            elapsed_ms = processing_time_ms,
            "contract analysis complete"
        );

        Ok(AnalysisResult {
            clauses: analyses,
            overall_risk_score: overall,
            processing_time_ms,
        })
    }
}
