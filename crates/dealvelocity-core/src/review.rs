//! User review of suggested clause replacements.
//!
//! Every analysed clause gets a [`ClauseId`] (its position in the analysis
//! result) when it enters a [`ReviewLedger`]. Status changes address ids, so
//! two clauses with identical text are accepted or rejected independently.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::contract::{AnalysisResult, ClauseAnalysis, RedlineStatus};

/// Stable per-run identifier of an analysed clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClauseId(pub usize);

impl fmt::Display for ClauseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("no clause with id {0}")]
    UnknownClause(ClauseId),
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
}

/// One `{original, new}` substitution for the redline service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedlineChange {
    pub original: String,
    pub new: String,
}

/// Review state for one analysis result.
#[derive(Debug, Clone, Default)]
pub struct ReviewLedger {
    entries: Vec<ClauseAnalysis>,
}

impl ReviewLedger {
    /// Start reviewing a set of analyses. Clauses without a status become pending.
    pub fn new(analyses: Vec<ClauseAnalysis>) -> Self {
        let entries = analyses
            .into_iter()
            .map(|mut a| {
                a.redline_status.get_or_insert(RedlineStatus::Pending);
                a
            })
            .collect();
        Self { entries }
    }

    pub fn from_result(result: &AnalysisResult) -> Self {
        Self::new(result.clauses.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: ClauseId) -> Option<&ClauseAnalysis> {
        self.entries.get(id.0)
    }

    /// Iterate `(id, analysis)` pairs in result order.
    pub fn iter(&self) -> impl Iterator<Item = (ClauseId, &ClauseAnalysis)> {
        self.entries.iter().enumerate().map(|(i, a)| (ClauseId(i), a))
    }

    pub fn status(&self, id: ClauseId) -> Option<RedlineStatus> {
        self.get(id).and_then(|a| a.redline_status)
    }

    pub fn accept(&mut self, id: ClauseId) -> Result<(), ReviewError> {
        self.set_status(id, RedlineStatus::Accepted)
    }

    pub fn reject(&mut self, id: ClauseId) -> Result<(), ReviewError> {
        self.set_status(id, RedlineStatus::Rejected)
    }

    pub fn reset(&mut self, id: ClauseId) -> Result<(), ReviewError> {
        self.set_status(id, RedlineStatus::Pending)
    }

    /// Replace the suggested text of one clause. Status is left unchanged.
    pub fn edit_suggestion(
        &mut self,
        id: ClauseId,
        text: impl Into<String>,
    ) -> Result<(), ReviewError> {
        let entry = self
            .entries
            .get_mut(id.0)
            .ok_or(ReviewError::UnknownClause(id))?;
        entry.suggested_alternative = text.into();
        Ok(())
    }

    /// Ids currently in the given status.
    pub fn with_status(&self, status: RedlineStatus) -> Vec<ClauseId> {
        self.iter()
            .filter(|(_, a)| a.redline_status == Some(status))
            .map(|(id, _)| id)
            .collect()
    }

    /// Substitutions for accepted clauses whose suggestion changes the text.
    pub fn redline_changes(&self) -> Vec<RedlineChange> {
        self.entries
            .iter()
            .filter(|a| a.redline_status == Some(RedlineStatus::Accepted) && a.proposes_change())
            .map(|a| RedlineChange {
                original: a.clause_text.clone(),
                new: a.suggested_alternative.clone(),
            })
            .collect()
    }

    /// Apply accepted substitutions to the full contract text.
    ///
    /// Each change claims the first occurrence of its original text not
    /// already claimed by an earlier change; changes whose text cannot be
    /// found are skipped.
    pub fn final_text(&self, original: &str) -> String {
        let mut claimed: Vec<(usize, usize, &str)> = Vec::new();

        for a in self
            .entries
            .iter()
            .filter(|a| a.redline_status == Some(RedlineStatus::Accepted) && a.proposes_change())
        {
            if a.clause_text.is_empty() {
                continue;
            }
            let slot = original
                .match_indices(a.clause_text.as_str())
                .map(|(start, m)| (start, start + m.len()))
                .find(|&(start, end)| claimed.iter().all(|&(s, e, _)| end <= s || start >= e));

            match slot {
                Some((start, end)) => claimed.push((start, end, a.suggested_alternative.as_str())),
                None => debug!(clause = %a.clause_text, "accepted clause not found in original text"),
            }
        }

        claimed.sort_by_key(|&(start, _, _)| start);

        let mut out = String::with_capacity(original.len());
        let mut cursor = 0;
        for (start, end, replacement) in claimed {
            out.push_str(&original[cursor..start]);
            out.push_str(replacement);
            cursor = end;
        }
        out.push_str(&original[cursor..]);
        out
    }

    fn set_status(&mut self, id: ClauseId, status: RedlineStatus) -> Result<(), ReviewError> {
        let entry = self
            .entries
            .get_mut(id.0)
            .ok_or(ReviewError::UnknownClause(id))?;
        entry.redline_status = Some(status);
        Ok(())
    }

    pub fn into_analyses(self) -> Vec<ClauseAnalysis> {
        self.entries
    }
}

// ── Feedback ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Accurate,
    Inaccurate,
    Helpful,
    NotHelpful,
}

/// Reviewer feedback on one clause's analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFeedback {
    pub clause_id: ClauseId,
    pub feedback_type: FeedbackType,
    /// 1–5.
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl UserFeedback {
    pub fn new(
        clause_id: ClauseId,
        feedback_type: FeedbackType,
        rating: u8,
        comment: Option<String>,
    ) -> Result<Self, ReviewError> {
        if !(1..=5).contains(&rating) {
            return Err(ReviewError::InvalidRating(rating));
        }
        Ok(Self {
            clause_id,
            feedback_type,
            rating,
            comment,
        })
    }
}
