//! RFP responder types: requirements, proposal sections, evaluator simulations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    Technical,
    Management,
    PastPerformance,
    Compliance,
}

impl RequirementType {
    /// Map free-form model output onto a requirement type.
    ///
    /// Anything unrecognised is treated as compliance.
    pub fn normalize(raw: &str) -> Self {
        let t = raw.to_lowercase();
        if t.contains("technical") {
            Self::Technical
        } else if t.contains("management") {
            Self::Management
        } else if t.contains("past") {
            Self::PastPerformance
        } else {
            Self::Compliance
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Management => "management",
            Self::PastPerformance => "past_performance",
            Self::Compliance => "compliance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Mandatory,
    Desirable,
    Optional,
}

impl Priority {
    /// Map free-form model output (including "shall"/"should" language) onto a priority.
    pub fn normalize(raw: &str) -> Self {
        let p = raw.to_lowercase();
        if p.contains("mandatory") || p.contains("shall") || p.contains("must") {
            Self::Mandatory
        } else if p.contains("desirable") || p.contains("should") {
            Self::Desirable
        } else {
            Self::Optional
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mandatory => "mandatory",
            Self::Desirable => "desirable",
            Self::Optional => "optional",
        }
    }
}

/// A single requirement extracted from an RFP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfpRequirement {
    pub req_text: String,
    pub req_type: RequirementType,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_ref: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    Draft,
    Review,
    Approved,
}

/// A drafted response to one requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalSection {
    pub section_title: String,
    pub content: String,
    pub status: SectionStatus,
    pub version: u32,
}

impl ProposalSection {
    pub fn draft(section_title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            section_title: section_title.into(),
            content: content.into(),
            status: SectionStatus::Draft,
            version: 1,
        }
    }
}

/// Evaluator viewpoint used to bias simulated proposal scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorPersona {
    #[default]
    TechnicalLead,
    ContractOfficer,
    Executive,
}

impl EvaluatorPersona {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TechnicalLead => "technical_lead",
            Self::ContractOfficer => "contract_officer",
            Self::Executive => "executive",
        }
    }

    /// Persona text injected into the evaluator prompt.
    pub fn description(&self) -> &'static str {
        match self {
            Self::TechnicalLead => {
                "You are a skeptical Technical Lead. You care about feasibility, specifics, and proven experience. You hate marketing fluff."
            }
            Self::ContractOfficer => {
                "You are a Contracting Officer. You care about compliance, risk mitigation, and adherence to requirements. You are very literal."
            }
            Self::Executive => {
                "You are a Senior Executive. You care about value, ROI, and high-level strategy. You have a short attention span."
            }
        }
    }
}

impl FromStr for EvaluatorPersona {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "technical_lead" => Ok(Self::TechnicalLead),
            "contract_officer" => Ok(Self::ContractOfficer),
            "executive" => Ok(Self::Executive),
            _ => Err(ParseEnumError::new("evaluator persona", s)),
        }
    }
}

impl fmt::Display for EvaluatorPersona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Simulated evaluator score for one proposal section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorSimulation {
    /// 0–100.
    pub simulated_score: u8,
    pub evaluator_persona: EvaluatorPersona,
    pub feedback: String,
    pub improvement_suggestions: String,
}

/// Split text into chunks of at most `max_len` characters on sentence boundaries.
///
/// Sentences end after `.`, `!` or `?` followed by whitespace. A single
/// sentence longer than `max_len` becomes its own oversized chunk. Empty
/// chunks are never produced.
pub fn chunk_text(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for sentence in sentences(text) {
        let sentence_chars = sentence.chars().count();
        if !current.is_empty() && current_chars + 1 + sentence_chars > max_len {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(sentence);
        current_chars += sentence_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?')
            && let Some(&(_, next)) = chars.peek()
            && next.is_whitespace()
        {
            let end = i + c.len_utf8();
            out.push(&text[start..end]);
            while let Some(&(j, w)) = chars.peek() {
                if !w.is_whitespace() {
                    break;
                }
                chars.next();
                start = j + w.len_utf8();
            }
        }
    }

    out.push(&text[start..]);
    out.into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
