//! Stage 1: split raw contract text into typed clauses with one model call.

use dealvelocity_core::Clause;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::AnalyzerConfig;
use crate::decode::{decode_json, excerpt};
use crate::llm::{ChatModel, ChatRequest};
use crate::prompts;

#[derive(Deserialize)]
#[serde(untagged)]
enum ExtractionPayload {
    Wrapped { clauses: Vec<Value> },
    Bare(Vec<Value>),
}

/// First non-blank string under any of `keys`.
fn trimmed_str(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| entry.get(*k).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Decode the extractor's response, keeping model order.
///
/// Entries are decoded one at a time. Entries without string text are
/// dropped; a missing or non-string type becomes `Other`.
pub fn parse_extraction(raw: &str) -> Result<Vec<Clause>, serde_json::Error> {
    let entries = match decode_json::<ExtractionPayload>(raw)? {
        ExtractionPayload::Wrapped { clauses } | ExtractionPayload::Bare(clauses) => clauses,
    };

    let total = entries.len();
    let clauses: Vec<Clause> = entries
        .iter()
        .filter_map(|entry| {
            let text = trimmed_str(entry, &["text", "clause_text"])?;
            let clause_type = trimmed_str(entry, &["type", "clause_type"])
                .unwrap_or_else(|| "Other".to_string());
            if !prompts::is_known_clause_type(&clause_type) {
                debug!(clause_type = %clause_type, "model returned an unlisted clause type");
            }
            Some(Clause { text, clause_type })
        })
        .collect();

    if clauses.len() < total {
        debug!(dropped = total - clauses.len(), "skipped extraction entries without text");
    }
    Ok(clauses)
}

/// Extract clauses from contract text.
///
/// Never fails: a failed call or an unusable response yields no clauses.
pub async fn extract_clauses(
    model: &dyn ChatModel,
    config: &AnalyzerConfig,
    contract_text: &str,
) -> Vec<Clause> {
    if contract_text.trim().is_empty() {
        info!("contract text is empty, nothing to extract");
        return Vec::new();
    }

    let request = ChatRequest::json(&config.model, prompts::EXTRACT_CLAUSES, contract_text);
    let raw = match model.complete(&request).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "clause extraction call failed");
            return Vec::new();
        }
    };

    match parse_extraction(&raw) {
        Ok(clauses) => {
            info!(count = clauses.len(), "extracted clauses");
            clauses
        }
        Err(e) => {
            warn!(error = %e, raw = excerpt(&raw, 200), "could not parse extracted clauses");
            Vec::new()
        }
    }
}
