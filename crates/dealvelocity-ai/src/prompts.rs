//! Prompt templates for each model call.
//!
//! Templates are rendered with `format!` so clause or requirement text that
//! happens to contain placeholder-like braces is never re-substituted.

use dealvelocity_core::{CLAUSE_TYPES, Clause, EvaluatorPersona};

/// System prompt shared by calls that only need "answer in JSON".
pub const JSON_ASSISTANT: &str = "You are a helpful assistant designed to output JSON.";

/// System prompt for free-text generation.
pub const PLAIN_ASSISTANT: &str = "You are a helpful assistant.";

// ── Contract pipeline ──

pub const EXTRACT_CLAUSES: &str = "\
You are a contract analysis expert. Your task is to extract distinct clauses from the provided contract text.

For each clause, identify:
1. The full text of the clause
2. The type of clause, one of: Liability, Termination, Indemnification, Payment, Confidentiality, \
Warranty, Governing Law, Dispute Resolution, Force Majeure, Assignment, Amendment, Severability, \
Notices, Entire Agreement, Waiver, Survival, Counterparts, Definitions, Interpretation, Other

Respond ONLY with a JSON object of the form:
{\"clauses\": [{\"text\": \"the full clause text\", \"type\": \"Liability\"}]}";

/// Opening line of the prescreen prompt; also how tests recognise the call.
pub const PRESCREEN_PREAMBLE: &str = "You are a contract risk screener.";

/// Opening line of the detailed analysis prompt.
pub const ANALYZE_PREAMBLE: &str =
    "You are a senior legal risk analyst specializing in vendor contract protection.";

/// Render the single prescreen prompt covering every clause.
///
/// Clause text is cut to `excerpt_chars` characters to keep the call cheap.
pub fn prescreen_prompt(clauses: &[Clause], excerpt_chars: usize) -> String {
    let listing = clauses
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "[{i}] Type: {ty}\nText: {text}",
                ty = c.clause_type,
                text = truncate_chars(&c.text, excerpt_chars),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{PRESCREEN_PREAMBLE} For each clause below, provide a quick preliminary risk score from 0-100.\n\
         Focus on identifying: unlimited liability, broad indemnification, unfavorable payment terms, \
         automatic renewals, non-compete clauses, and unusual termination rights.\n\
         \n\
         Return ONLY a JSON object of the form {{\"scores\": [{{\"index\": 0, \"risk_score\": 55}}]}} \
         with one entry per clause, where \"index\" is the 0-based clause number.\n\
         \n\
         Clauses:\n\
         {listing}"
    )
}

/// Render the per-clause detailed analysis prompt.
pub fn analyze_risk_prompt(clause: &Clause) -> String {
    format!(
        "{ANALYZE_PREAMBLE}\n\
         \n\
         Clause Type: {clause_type}\n\
         Clause Text: \"{clause_text}\"\n\
         \n\
         Analyze this clause for risks to the vendor (us). Focus on:\n\
         - Unlimited/uncapped liability exposure\n\
         - Broad indemnification obligations\n\
         - Unfavorable payment/billing terms\n\
         - Automatic renewals without opt-out\n\
         - Overly restrictive non-compete/exclusivity\n\
         - One-sided termination rights favoring client\n\
         - IP ownership concerns\n\
         \n\
         Provide JSON with:\n\
         1. risk_score (0-100): How damaging is this clause?\n\
         2. risk_category: Financial, Legal, Operational, Reputational, or Compliance\n\
         3. risk_level: low, medium, high, or critical\n\
         4. risk_description: What's the specific problem? (1 sentence)\n\
         5. impact_description: What could go wrong? (1 sentence)\n\
         6. suggested_alternative: Better language that protects us while being fair\n\
         7. reasoning: Why is this risky? (2-3 sentences max)\n\
         \n\
         Be strict on unlimited liability, automatic renewals, and broad indemnification. \
         Be lenient on standard boilerplate.",
        clause_type = clause.clause_type,
        clause_text = clause.text,
    )
}

// ── RFP responder ──

pub const EXTRACT_REQUIREMENTS: &str = "\
You are an expert Proposal Manager. Your task is to extract all requirements from the provided RFP text.

For each requirement, identify:
1. The exact text of the requirement.
2. The type (Technical, Management, Past Performance, Compliance).
3. The priority (Mandatory - must do, Desirable - good to have, Optional).
4. The page number reference (if available in context, otherwise null).

Respond ONLY with a JSON object of the form:
{\"requirements\": [{\"req_text\": \"...\", \"req_type\": \"Technical\", \"priority\": \"Mandatory\", \"page_ref\": null}]}";

pub fn evaluator_prompt(persona: EvaluatorPersona, requirement: &str, proposal_text: &str) -> String {
    format!(
        "You are a strict government contract evaluator. Your job is to score a proposal section \
         against a specific requirement.\n\
         \n\
         Persona: {persona}\n\
         \n\
         Requirement: \"{requirement}\"\n\
         \n\
         Proposal Section: \"{proposal_text}\"\n\
         \n\
         Evaluate this rigorously.\n\
         1. Score it from 0-100 based on how well it meets the requirement.\n\
         2. Provide specific feedback on strengths and weaknesses.\n\
         3. Suggest concrete improvements to increase the score.\n\
         \n\
         Return JSON: {{ \"score\": number, \"feedback\": string, \"improvements\": string }}",
        persona = persona.description(),
    )
}

pub fn proposal_prompt(requirement: &str, context: &str) -> String {
    format!(
        "You are a Proposal Writer for a government contractor. Write a response to the following \
         requirement.\n\
         \n\
         Requirement: \"{requirement}\"\n\
         \n\
         Context/Winning Patterns:\n\
         {context}\n\
         \n\
         Instructions:\n\
         1. Address the requirement directly and completely.\n\
         2. Use the \"Context\" provided to incorporate proven winning language and capabilities.\n\
         3. Be persuasive but factual.\n\
         4. Structure the response clearly.\n\
         \n\
         Return the response text."
    )
}

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Whether `clause_type` is one of the categories the extractor is asked for.
pub fn is_known_clause_type(clause_type: &str) -> bool {
    CLAUSE_TYPES
        .iter()
        .any(|t| t.eq_ignore_ascii_case(clause_type.trim()))
}
