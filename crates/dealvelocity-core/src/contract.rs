//! Contract clause and risk analysis types shared by the pipeline and its callers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

/// Clause categories the extractor asks the model to choose from.
pub const CLAUSE_TYPES: &[&str] = &[
    "Liability",
    "Termination",
    "Indemnification",
    "Payment",
    "Confidentiality",
    "Warranty",
    "Governing Law",
    "Dispute Resolution",
    "Force Majeure",
    "Assignment",
    "Amendment",
    "Severability",
    "Notices",
    "Entire Agreement",
    "Waiver",
    "Survival",
    "Counterparts",
    "Definitions",
    "Interpretation",
    "Other",
];

/// A discrete provision extracted from a contract.
///
/// Carries no identifier: two clauses with the same text are indistinguishable
/// here. Stable ids are assigned later by [`crate::ReviewLedger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub text: String,
    #[serde(rename = "type")]
    pub clause_type: String,
}

impl Clause {
    pub fn new(text: impl Into<String>, clause_type: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            clause_type: clause_type.into(),
        }
    }
}

/// A clause with its coarse prescreening estimate (0–100).
///
/// Only used to decide whether detailed analysis runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrescreenedClause {
    #[serde(flatten)]
    pub clause: Clause,
    pub preliminary_risk: u8,
}

/// Ordered severity bucket. Also drives aggregate weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Weight used by [`crate::overall_risk_score`].
    pub fn weight(&self) -> u32 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }
}

impl FromStr for RiskLevel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(ParseEnumError::new("risk level", s)),
        }
    }
}

impl TryFrom<String> for RiskLevel {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of exposure a clause creates.
///
/// Model output outside the five known categories decodes to `Unknown`
/// rather than failing the whole analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum RiskCategory {
    Financial,
    Legal,
    Operational,
    Reputational,
    Compliance,
    Unknown,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Financial => "Financial",
            Self::Legal => "Legal",
            Self::Operational => "Operational",
            Self::Reputational => "Reputational",
            Self::Compliance => "Compliance",
            Self::Unknown => "Unknown",
        }
    }
}

impl From<String> for RiskCategory {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "financial" => Self::Financial,
            "legal" => Self::Legal,
            "operational" => Self::Operational,
            "reputational" => Self::Reputational,
            "compliance" => Self::Compliance,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User decision on a suggested replacement. Never set by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedlineStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RedlineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// Full risk analysis of one clause: the unit persisted per clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseAnalysis {
    pub clause_text: String,
    pub clause_type: String,
    /// Always within 0–100.
    pub risk_score: u8,
    pub risk_category: RiskCategory,
    pub risk_level: RiskLevel,
    pub risk_description: String,
    pub impact_description: String,
    pub suggested_alternative: String,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redline_status: Option<RedlineStatus>,
}

impl ClauseAnalysis {
    /// Placeholder recorded when a clause's detailed analysis fails.
    ///
    /// Zero risk, low level, and the original text as its own alternative, so a
    /// failed clause never proposes a change.
    pub fn failed(clause: &Clause) -> Self {
        Self {
            clause_text: clause.text.clone(),
            clause_type: clause.clause_type.clone(),
            risk_score: 0,
            risk_category: RiskCategory::Unknown,
            risk_level: RiskLevel::Low,
            risk_description: "Analysis failed".to_string(),
            impact_description: "Unknown".to_string(),
            suggested_alternative: clause.text.clone(),
            reasoning: "Error during analysis".to_string(),
            redline_status: None,
        }
    }

    /// Whether the suggestion actually changes the clause text.
    pub fn proposes_change(&self) -> bool {
        self.suggested_alternative.trim() != self.clause_text.trim()
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Clauses that passed prescreening, in extraction order.
    pub clauses: Vec<ClauseAnalysis>,
    pub overall_risk_score: u8,
    pub processing_time_ms: u64,
}
