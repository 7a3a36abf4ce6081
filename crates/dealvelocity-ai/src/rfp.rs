//! RFP responder agents: requirement extraction, evaluator simulation and
//! proposal drafting.

use std::sync::Arc;

use async_trait::async_trait;
use dealvelocity_core::{
    EvaluatorPersona, EvaluatorSimulation, Priority, ProposalSection, RequirementType,
    RfpRequirement, chunk_text,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::AnalyzerConfig;
use crate::decode::{clamp_score, decode_json, excerpt};
use crate::error::AiError;
use crate::llm::{ChatModel, ChatRequest};
use crate::prompts;

/// Characters of RFP text sent per extraction call (roughly 4k tokens).
pub const RFP_CHUNK_CHARS: usize = 15_000;

/// Content used when the model produces no proposal text.
pub const DRAFT_FALLBACK: &str = "Failed to generate content.";

// ── Requirement extraction ──

/// Decode one chunk's extraction response.
///
/// Accepts `{"requirements": [...]}` or a bare array. Entries without text are
/// skipped; type and priority are normalised from whatever the model wrote.
pub fn parse_requirements(raw: &str) -> Result<Vec<RfpRequirement>, serde_json::Error> {
    let value: Value = decode_json(raw)?;
    let entries = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("requirements") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    Ok(entries.iter().filter_map(requirement_from_value).collect())
}

fn requirement_from_value(entry: &Value) -> Option<RfpRequirement> {
    let req_text = entry
        .get("req_text")
        .or_else(|| entry.get("text"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())?
        .to_string();
    let page_ref = match entry.get("page_ref") {
        Some(Value::Number(n)) => n.as_u64().and_then(|p| u32::try_from(p).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|&p| p > 0);

    Some(RfpRequirement {
        req_text,
        req_type: RequirementType::normalize(str_field(entry, "req_type")),
        priority: Priority::normalize(str_field(entry, "priority")),
        page_ref,
    })
}

fn str_field<'a>(entry: &'a Value, key: &str) -> &'a str {
    entry.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// Extracts requirements from RFP text, one model call per chunk.
pub struct RfpParser {
    model: Arc<dyn ChatModel>,
    config: AnalyzerConfig,
    chunk_chars: usize,
}

impl RfpParser {
    pub fn new(model: Arc<dyn ChatModel>, config: AnalyzerConfig) -> Self {
        Self {
            model,
            config,
            chunk_chars: RFP_CHUNK_CHARS,
        }
    }

    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars.max(1);
        self
    }

    /// Requirements from every chunk, in document order.
    ///
    /// A chunk whose call or response fails contributes nothing.
    pub async fn parse(&self, rfp_text: &str) -> Vec<RfpRequirement> {
        let chunks = chunk_text(rfp_text, self.chunk_chars);
        let mut requirements = Vec::new();

        for (n, chunk) in chunks.iter().enumerate() {
            debug!(chunk = n + 1, of = chunks.len(), chars = chunk.len(), "extracting requirements");
            requirements.extend(self.extract_chunk(chunk).await);
        }

        info!(count = requirements.len(), chunks = chunks.len(), "parsed RFP requirements");
        requirements
    }

    async fn extract_chunk(&self, chunk: &str) -> Vec<RfpRequirement> {
        let request = ChatRequest::json(&self.config.model, prompts::EXTRACT_REQUIREMENTS, chunk);
        let raw = match self.model.complete(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "requirement extraction call failed, skipping chunk");
                return Vec::new();
            }
        };
        parse_requirements(&raw).unwrap_or_else(|e| {
            warn!(error = %e, raw = excerpt(&raw, 200), "could not parse requirements");
            Vec::new()
        })
    }
}

// ── Evaluator simulation ──

#[derive(Deserialize)]
struct RawEvaluation {
    score: f64,
    #[serde(default)]
    feedback: String,
    #[serde(default)]
    improvements: Value,
}

/// Decode an evaluator response. `improvements` may be a string or a list.
pub fn parse_evaluation(
    raw: &str,
    persona: EvaluatorPersona,
) -> Result<EvaluatorSimulation, serde_json::Error> {
    let parsed: RawEvaluation = decode_json(raw)?;
    let improvement_suggestions = match parsed.improvements {
        Value::String(s) => s,
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    };

    Ok(EvaluatorSimulation {
        simulated_score: clamp_score(parsed.score).unwrap_or(0),
        evaluator_persona: persona,
        feedback: parsed.feedback,
        improvement_suggestions,
    })
}

/// Scores a proposal section the way a given evaluator persona would.
pub struct EvaluatorAgent {
    model: Arc<dyn ChatModel>,
    config: AnalyzerConfig,
}

impl EvaluatorAgent {
    pub fn new(model: Arc<dyn ChatModel>, config: AnalyzerConfig) -> Self {
        Self { model, config }
    }

    /// Errors are returned to the caller; there is no fallback score.
    pub async fn simulate(
        &self,
        requirement: &str,
        proposal_text: &str,
        persona: EvaluatorPersona,
    ) -> Result<EvaluatorSimulation, AiError> {
        let request = ChatRequest::json(
            &self.config.model,
            prompts::JSON_ASSISTANT,
            prompts::evaluator_prompt(persona, requirement, proposal_text),
        );
        let raw = self.model.complete(&request).await?;
        let simulation = parse_evaluation(&raw, persona).inspect_err(|e| {
            warn!(error = %e, raw = excerpt(&raw, 200), "could not parse evaluation");
        })?;

        info!(persona = %persona, score = simulation.simulated_score, "simulated evaluation");
        Ok(simulation)
    }
}

// ── Proposal drafting ──

/// Supplies reference material for a proposal draft.
#[async_trait]
pub trait ContextSource: Send + Sync {
    async fn context_for(&self, query: &str) -> anyhow::Result<String>;
}

/// Context source that never has anything to offer.
pub struct NoContext;

#[async_trait]
impl ContextSource for NoContext {
    async fn context_for(&self, _query: &str) -> anyhow::Result<String> {
        Ok(String::new())
    }
}

/// Drafts proposal sections from retrieved context.
pub struct ProposalGenerator {
    model: Arc<dyn ChatModel>,
    config: AnalyzerConfig,
    context: Arc<dyn ContextSource>,
}

impl ProposalGenerator {
    pub fn new(
        model: Arc<dyn ChatModel>,
        config: AnalyzerConfig,
        context: Arc<dyn ContextSource>,
    ) -> Self {
        Self {
            model,
            config,
            context,
        }
    }

    /// Draft a response to `requirement`.
    ///
    /// Context retrieval failures leave the context empty. A reply with no
    /// content becomes [`DRAFT_FALLBACK`]; other model errors are returned.
    pub async fn draft(&self, requirement: &str) -> Result<ProposalSection, AiError> {
        let context = self.context.context_for(requirement).await.unwrap_or_else(|e| {
            warn!(error = %e, "context retrieval failed, drafting without context");
            String::new()
        });
        debug!(context_chars = context.len(), "retrieved proposal context");

        let request = ChatRequest::text(
            &self.config.model,
            prompts::PLAIN_ASSISTANT,
            prompts::proposal_prompt(requirement, &context),
        );
        let content = match self.model.complete(&request).await {
            Ok(content) => content,
            Err(AiError::EmptyResponse) => {
                warn!("model returned no draft content");
                DRAFT_FALLBACK.to_string()
            }
            Err(e) => return Err(e),
        };

        Ok(ProposalSection::draft(
            prompts::truncate_chars(requirement.trim(), 80),
            content,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedModel, unreachable_error};
    use dealvelocity_core::SectionStatus;
    use std::sync::Mutex;

    fn config() -> AnalyzerConfig {
        AnalyzerConfig::new("k")
    }

    #[test]
    fn requirements_are_normalised() {
        let raw = r#"{"requirements": [
            {"req_text": "The contractor shall provide 24/7 support.", "req_type": "Technical", "priority": "Shall", "page_ref": 12},
            {"req_text": "Describe similar past contracts.", "req_type": "Past Performance", "priority": "should", "page_ref": null},
            {"req_text": "Provide a staffing plan.", "req_type": "Program Management", "priority": "nice to have"},
            {"req_text": "Comply with FAR 52.204.", "req_type": "Regulatory"},
            {"req_type": "Technical"}
        ]}"#;
        let reqs = parse_requirements(raw).unwrap();
        assert_eq!(reqs.len(), 4);

        assert_eq!(reqs[0].req_type, RequirementType::Technical);
        assert_eq!(reqs[0].priority, Priority::Mandatory);
        assert_eq!(reqs[0].page_ref, Some(12));

        assert_eq!(reqs[1].req_type, RequirementType::PastPerformance);
        assert_eq!(reqs[1].priority, Priority::Desirable);
        assert_eq!(reqs[1].page_ref, None);

        assert_eq!(reqs[2].req_type, RequirementType::Management);
        assert_eq!(reqs[2].priority, Priority::Optional);

        assert_eq!(reqs[3].req_type, RequirementType::Compliance);
    }

    #[test]
    fn bare_array_and_string_page_refs() {
        let raw = r#"[{"req_text": "Weekly status reports.", "priority": "must", "page_ref": "7"}]"#;
        let reqs = parse_requirements(raw).unwrap();
        assert_eq!(reqs[0].page_ref, Some(7));
        assert_eq!(reqs[0].priority, Priority::Mandatory);
    }

    #[test]
    fn object_without_requirements_is_empty() {
        assert!(parse_requirements(r#"{"items": []}"#).unwrap().is_empty());
        assert!(parse_requirements("no requirements found").is_err());
    }

    #[tokio::test]
    async fn parser_calls_once_per_chunk_and_skips_failures() {
        let seen = Arc::new(Mutex::new(0usize));
        let counter = seen.clone();
        let model = Arc::new(ScriptedModel::new().other_with(move |_| {
            let mut n = counter.lock().unwrap();
            *n += 1;
            match *n {
                2 => Err(unreachable_error()),
                3 => Ok("not json".to_string()),
                _ => Ok(r#"{"requirements": [{"req_text": "Must be accessible.", "req_type": "Compliance", "priority": "Mandatory"}]}"#.to_string()),
            }
        }));
        let text = "First sentence here. Second sentence here. Third sentence here. Fourth one.";
        let parser = RfpParser::new(model.clone(), config()).with_chunk_chars(22);

        let reqs = parser.parse(text).await;

        assert_eq!(model.calls(), 4);
        assert_eq!(reqs.len(), 2);
        assert!(reqs.iter().all(|r| r.req_text == "Must be accessible."));
    }

    #[tokio::test]
    async fn empty_rfp_makes_no_calls() {
        let model = Arc::new(ScriptedModel::new());
        let reqs = RfpParser::new(model.clone(), config()).parse("   ").await;
        assert!(reqs.is_empty());
        assert_eq!(model.calls(), 0);
    }

    #[test]
    fn evaluation_accepts_list_improvements_and_clamps() {
        let raw = r#"{"score": 120, "feedback": "Specific.", "improvements": ["Add metrics", "Name staff"]}"#;
        let sim = parse_evaluation(raw, EvaluatorPersona::ContractOfficer).unwrap();
        assert_eq!(sim.simulated_score, 100);
        assert_eq!(sim.improvement_suggestions, "Add metrics\nName staff");
        assert_eq!(sim.evaluator_persona, EvaluatorPersona::ContractOfficer);
    }

    #[tokio::test]
    async fn evaluator_uses_persona_and_returns_score() {
        let model = Arc::new(ScriptedModel::new().other_raw(
            r#"{"score": 72, "feedback": "Too much fluff.", "improvements": "Cite uptime figures."}"#,
        ));
        let agent = EvaluatorAgent::new(model.clone(), config());

        let sim = agent
            .simulate("99.9% uptime", "We are the best.", EvaluatorPersona::TechnicalLead)
            .await
            .unwrap();
        assert_eq!(sim.simulated_score, 72);
        assert_eq!(sim.improvement_suggestions, "Cite uptime figures.");
        assert!(model.user_prompts()[0].contains("skeptical Technical Lead"));
    }

    #[tokio::test]
    async fn evaluator_errors_propagate() {
        let model = Arc::new(ScriptedModel::new().other_with(|_| Err(unreachable_error())));
        let agent = EvaluatorAgent::new(model, config());
        let err = agent
            .simulate("req", "text", EvaluatorPersona::Executive)
            .await
            .unwrap_err();
        assert!(err.is_upstream());

        let model = Arc::new(ScriptedModel::new().other_raw(r#"{"feedback": "no score"}"#));
        let agent = EvaluatorAgent::new(model, config());
        let err = agent
            .simulate("req", "text", EvaluatorPersona::Executive)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Json(_)));
    }

    struct FixedContext(&'static str);

    #[async_trait]
    impl ContextSource for FixedContext {
        async fn context_for(&self, _query: &str) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenContext;

    #[async_trait]
    impl ContextSource for BrokenContext {
        async fn context_for(&self, _query: &str) -> anyhow::Result<String> {
            anyhow::bail!("vector store returned 500")
        }
    }

    #[tokio::test]
    async fn draft_includes_retrieved_context() {
        let model = Arc::new(ScriptedModel::new().other_raw("Our team provides round-the-clock support."));
        let generator = ProposalGenerator::new(
            model.clone(),
            config(),
            Arc::new(FixedContext("[Source: past.pdf]\nWe ran a 24/7 NOC.")),
        );

        let section = generator.draft("Provide 24/7 support.").await.unwrap();
        assert_eq!(section.content, "Our team provides round-the-clock support.");
        assert_eq!(section.status, SectionStatus::Draft);
        assert_eq!(section.version, 1);
        assert!(model.user_prompts()[0].contains("[Source: past.pdf]"));
    }

    #[tokio::test]
    async fn draft_survives_context_failure() {
        let model = Arc::new(ScriptedModel::new().other_raw("Draft text."));
        let generator = ProposalGenerator::new(model, config(), Arc::new(BrokenContext));
        let section = generator.draft("Provide support.").await.unwrap();
        assert_eq!(section.content, "Draft text.");
    }

    #[tokio::test]
    async fn empty_reply_uses_fallback_text() {
        let model = Arc::new(ScriptedModel::new().other_with(|_| Err(AiError::EmptyResponse)));
        let generator = ProposalGenerator::new(model, config(), Arc::new(NoContext));
        let section = generator.draft("Provide support.").await.unwrap();
        assert_eq!(section.content, DRAFT_FALLBACK);
    }

    #[tokio::test]
    async fn upstream_failure_is_returned() {
        let model = Arc::new(ScriptedModel::new().other_with(|_| Err(unreachable_error())));
        let generator = ProposalGenerator::new(model, config(), Arc::new(NoContext));
        assert!(generator.draft("Provide support.").await.is_err());
    }
}
