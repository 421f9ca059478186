//! modguard Core
//!
//! Core types and error handling shared across modguard components.
//!
//! This crate provides:
//! - The error taxonomy and `Result` alias
//! - Risk tiers and their fixed probability thresholds
//! - Per-comment and per-request scoring results

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    RiskTier, ScoreBatch, ScoreResult, EMPTY_REQUEST_NOTICE, HIGH_RISK_THRESHOLD,
    MEDIUM_RISK_THRESHOLD,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{RiskTier, ScoreBatch, ScoreResult};
}
