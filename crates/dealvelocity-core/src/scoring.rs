//! Deterministic aggregation of per-clause risk into one contract score.
//!
//! # Weighting
//!
//! Each analysed clause contributes its `risk_score` weighted by its level:
//! critical = 4, high = 3, medium = 2, low = 1. The overall score is the
//! weighted mean rounded half-up, so a handful of critical clauses dominate a
//! contract that is otherwise boilerplate.

use serde::Serialize;

use crate::contract::ClauseAnalysis;

/// Weighted-mean risk score over the analysed clauses.
///
/// Returns 0 for an empty slice. The result stays within 0–100 because it is
/// a convex combination of scores in that range.
pub fn overall_risk_score(analyses: &[ClauseAnalysis]) -> u8 {
    let (total, weight) = analyses.iter().fold((0u64, 0u64), |(total, weight), a| {
        let w = a.risk_level.weight() as u64;
        (total + a.risk_score.min(100) as u64 * w, weight + w)
    });

    if weight == 0 {
        return 0;
    }

    // round(total / weight) with halves rounded up, in integers.
    ((2 * total + weight) / (2 * weight)) as u8
}

/// Display bucket for a 0–100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Moderate,
    Elevated,
    Severe,
}

impl RiskBand {
    pub fn for_score(score: u8) -> Self {
        match score {
            0..30 => Self::Low,
            30..60 => Self::Moderate,
            60..80 => Self::Elevated,
            _ => Self::Severe,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::Elevated => "elevated",
            Self::Severe => "severe",
        }
    }
}
