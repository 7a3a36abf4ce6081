//! Scripted [`ChatModel`] for unit tests.
//!
//! Recognises which pipeline stage a request belongs to from its prompts and
//! answers with a per-stage script. Detailed-analysis calls are tracked so
//! tests can assert batch sizes and peak concurrency.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::AiError;
use crate::llm::{ChatModel, ChatRequest};
use crate::prompts;

type Responder = Box<dyn Fn(&str) -> Result<String, AiError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Extraction,
    Prescreen,
    Analysis,
    Other,
}

pub(crate) fn analysis_json(score: i64, level: &str) -> Value {
    json!({
        "risk_score": score,
        "risk_category": "Legal",
        "risk_level": level,
        "risk_description": "One-sided obligation.",
        "impact_description": "Exposure beyond contract value.",
        "suggested_alternative": "Mutual obligation capped at fees paid.",
        "reasoning": "The clause shifts risk to the vendor."
    })
}

pub(crate) fn unreachable_error() -> AiError {
    AiError::Server {
        status: 503,
        body: "upstream unavailable".to_string(),
    }
}

pub(crate) struct ScriptedModel {
    extraction: Responder,
    prescreen: Responder,
    analysis: Responder,
    other: Responder,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    batches: Mutex<Vec<usize>>,
    user_prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub(crate) fn new() -> Self {
        Self {
            extraction: Box::new(|_| Ok(r#"{"clauses": []}"#.to_string())),
            prescreen: Box::new(|_| Ok(r#"{"scores": []}"#.to_string())),
            analysis: Box::new(|_| Ok(analysis_json(60, "high").to_string())),
            other: Box::new(|_| Ok("{}".to_string())),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
            user_prompts: Mutex::new(Vec::new()),
        }
    }

    // ── Extraction ──

    pub(crate) fn extraction_raw(mut self, raw: &str) -> Self {
        let raw = raw.to_string();
        self.extraction = Box::new(move |_| Ok(raw.clone()));
        self
    }

    pub(crate) fn extraction_clauses(self, clauses: &[(&str, &str)]) -> Self {
        let list: Vec<Value> = clauses
            .iter()
            .map(|(text, ty)| json!({"text": text, "type": ty}))
            .collect();
        self.extraction_raw(&json!({ "clauses": list }).to_string())
    }

    pub(crate) fn extraction_unreachable(mut self) -> Self {
        self.extraction = Box::new(|_| Err(unreachable_error()));
        self
    }

    /// A 2xx reply whose body is not a completion.
    pub(crate) fn extraction_undecodable(mut self) -> Self {
        self.extraction = Box::new(|_| {
            Err(serde_json::from_str::<Value>("<html>ok</html>")
                .unwrap_err()
                .into())
        });
        self
    }

    // ── Prescreen ──

    pub(crate) fn prescreen_raw(mut self, raw: &str) -> Self {
        let raw = raw.to_string();
        self.prescreen = Box::new(move |_| Ok(raw.clone()));
        self
    }

    /// Scores for clauses `0..scores.len()`, in order.
    pub(crate) fn prescreen_scores(self, scores: &[u8]) -> Self {
        let list: Vec<Value> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| json!({"index": i, "risk_score": s}))
            .collect();
        self.prescreen_raw(&json!({ "scores": list }).to_string())
    }

    pub(crate) fn prescreen_unreachable(mut self) -> Self {
        self.prescreen = Box::new(|_| Err(unreachable_error()));
        self
    }

    // ── Detailed analysis ──

    pub(crate) fn analysis_raw(mut self, raw: &str) -> Self {
        let raw = raw.to_string();
        self.analysis = Box::new(move |_| Ok(raw.clone()));
        self
    }

    /// Fail the call for any clause whose prompt contains `marker`.
    pub(crate) fn analysis_fails_for(mut self, marker: &str) -> Self {
        let marker = marker.to_string();
        self.analysis = Box::new(move |prompt| {
            if prompt.contains(&marker) {
                Err(unreachable_error())
            } else {
                Ok(analysis_json(60, "high").to_string())
            }
        });
        self
    }

    pub(crate) fn analysis_unreachable(mut self) -> Self {
        self.analysis = Box::new(|_| Err(unreachable_error()));
        self
    }

    // ── Anything else (RFP agents) ──

    pub(crate) fn other_raw(mut self, raw: &str) -> Self {
        let raw = raw.to_string();
        self.other = Box::new(move |_| Ok(raw.clone()));
        self
    }

    pub(crate) fn other_with(
        mut self,
        f: impl Fn(&str) -> Result<String, AiError> + Send + Sync + 'static,
    ) -> Self {
        self.other = Box::new(f);
        self
    }

    // ── Observations ──

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Sizes of each group of concurrently started analysis calls.
    pub(crate) fn analysis_batches(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(crate) fn user_prompts(&self) -> Vec<String> {
        self.user_prompts.lock().unwrap().clone()
    }

    fn stage(request: &ChatRequest) -> Stage {
        let user = request.user_prompt().unwrap_or_default();
        if request.system_prompt() == Some(prompts::EXTRACT_CLAUSES) {
            Stage::Extraction
        } else if user.starts_with(prompts::PRESCREEN_PREAMBLE) {
            Stage::Prescreen
        } else if user.starts_with(prompts::ANALYZE_PREAMBLE) {
            Stage::Analysis
        } else {
            Stage::Other
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: &ChatRequest) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let user = request.user_prompt().unwrap_or_default().to_string();
        self.user_prompts.lock().unwrap().push(user.clone());

        let stage = Self::stage(request);
        if stage != Stage::Analysis {
            let responder = match stage {
                Stage::Extraction => &self.extraction,
                Stage::Prescreen => &self.prescreen,
                _ => &self.other,
            };
            return responder(user.as_str());
        }

        let before = self.in_flight.fetch_add(1, Ordering::SeqCst);
        {
            let mut batches = self.batches.lock().unwrap();
            match batches.last_mut() {
                Some(size) if before > 0 => *size += 1,
                _ => batches.push(1),
            }
        }
        self.peak.fetch_max(before + 1, Ordering::SeqCst);

        // Suspend so every call of a batch is in flight before any resolves.
        tokio::task::yield_now().await;

        let reply = (self.analysis)(user.as_str());
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}
