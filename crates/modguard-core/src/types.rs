//! Core types for modguard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Probabilities strictly above this are High risk
pub const HIGH_RISK_THRESHOLD: f64 = 0.60;

/// Probabilities strictly above this (and not High) are Medium risk
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.30;

/// Notice attached to a request that contained nothing to score
pub const EMPTY_REQUEST_NOTICE: &str = "Please enter at least one comment.";

/// Discrete risk bucket derived from a violation probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Map a probability to its tier.
    ///
    /// Comparisons are strict, so a value sitting exactly on a threshold
    /// falls into the lower tier. NaN maps to Low.
    pub fn from_probability(probability: f64) -> Self {
        if probability > HIGH_RISK_THRESHOLD {
            Self::High
        } else if probability > MEDIUM_RISK_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Medium => "Medium Risk",
            Self::High => "High Risk",
        }
    }

    /// CSS color name used by the HTML renderer
    pub fn color(&self) -> &'static str {
        match self {
            Self::Low => "green",
            Self::Medium => "orange",
            Self::High => "red",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Scoring outcome for a single comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// The comment as entered (trimmed, not normalized)
    pub comment: String,

    /// Calibrated probability of the violation class (0.0-1.0)
    pub probability: f64,

    /// Tier derived from `probability`
    pub tier: RiskTier,
}

impl ScoreResult {
    /// Create a result, clamping the probability and deriving the tier
    pub fn new(comment: impl Into<String>, probability: f64) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };

        Self {
            comment: comment.into(),
            probability,
            tier: RiskTier::from_probability(probability),
        }
    }

    /// Probability as a percentage with two decimals, e.g. `33.33%`
    pub fn percentage(&self) -> String {
        format!("{:.2}%", self.probability * 100.0)
    }
}

/// Outcome of one multi-line scoring request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBatch {
    /// Identifier for correlating log lines with rendered output
    pub request_id: Uuid,

    /// When the request was scored
    pub scored_at: DateTime<Utc>,

    /// Results in input order
    pub results: Vec<ScoreResult>,

    /// Non-blank lines dropped because nothing was left after normalization
    pub skipped: usize,

    /// Validation notice for the caller, set when nothing was scored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl ScoreBatch {
    /// Build a batch, attaching the empty-request notice when needed
    pub fn new(results: Vec<ScoreResult>, skipped: usize) -> Self {
        let notice = results
            .is_empty()
            .then(|| EMPTY_REQUEST_NOTICE.to_string());

        Self {
            request_id: Uuid::new_v4(),
            scored_at: Utc::now(),
            results,
            skipped,
            notice,
        }
    }

    /// True when no comment was scored
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The last scored result, if any
    pub fn last(&self) -> Option<&ScoreResult> {
        self.results.last()
    }

    /// Highest tier in the batch
    pub fn max_tier(&self) -> Option<RiskTier> {
        self.results.iter().map(|r| r.tier).max()
    }
}
