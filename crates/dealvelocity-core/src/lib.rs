//! Core types for contract risk analysis and RFP responses, plus deterministic scoring.

pub mod contract;
mod error;
pub mod review;
pub mod rfp;
pub mod scoring;

pub use contract::{
    AnalysisResult, CLAUSE_TYPES, Clause, ClauseAnalysis, PrescreenedClause, RedlineStatus,
    RiskCategory, RiskLevel,
};
pub use error::ParseEnumError;
pub use review::{ClauseId, FeedbackType, RedlineChange, ReviewError, ReviewLedger, UserFeedback};
pub use rfp::{
    EvaluatorPersona, EvaluatorSimulation, Priority, ProposalSection, RequirementType,
    RfpRequirement, SectionStatus, chunk_text,
};
pub use scoring::{RiskBand, overall_risk_score};
