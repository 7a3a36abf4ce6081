//! AI layer: chat-completion client, prompt templates, the contract risk
//! pipeline and the RFP responder agents.

mod analyze;
mod config;
pub mod decode;
mod error;
mod extract;
mod llm;
mod pipeline;
mod prescreen;
pub mod prompts;
pub mod rfp;

#[cfg(test)]
mod testing;

pub use analyze::{analyze_clause, analyze_clauses, parse_analysis};
pub use config::{
    AnalyzerConfig, DEFAULT_BASE_URL, DEFAULT_BATCH_SIZE, DEFAULT_EXCERPT_CHARS, DEFAULT_MODEL,
    DEFAULT_PRESCREEN_THRESHOLD,
};
pub use error::{AiError, PipelineError};
pub use extract::{extract_clauses, parse_extraction};
pub use llm::{ChatMessage, ChatModel, ChatRequest, OpenAiClient, Role};
pub use pipeline::{ContractAnalyzer, select_for_analysis};
pub use prescreen::{FALLBACK_RISK, parse_prescreen, prescreen_clauses};
pub use rfp::{ContextSource, EvaluatorAgent, NoContext, ProposalGenerator, RfpParser};
