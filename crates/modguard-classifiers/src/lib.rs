//! modguard Classifiers
//!
//! Scores free-text comments for rule-violation probability.
//!
//! The pipeline is fixed:
//! - [`normalize`] cleans the raw comment
//! - [`TfidfVectorizer`] maps it onto the vocabulary frozen at training time
//! - a [`CalibratedClassifier`] turns features into a violation probability
//! - [`RiskTier`](modguard_core::RiskTier) buckets the probability
//!
//! The classifier/vectorizer pair is loaded once per process through
//! [`model_loader::load`] and shared read-only afterwards.

pub mod calibration;
pub mod classifier;
pub mod config;
pub mod forest;
pub mod linear;
pub mod model_loader;
pub mod normalize;
pub mod scoring;
pub mod vectorizer;

pub use calibration::{CalibratedClassifier, SigmoidCalibrator};
pub use classifier::{ModelArtifact, ModelKind, ProbabilityClassifier};
pub use config::{CalibrationSource, ScorerConfig};
pub use forest::RandomForest;
pub use linear::LinearModel;
pub use model_loader::{load, LoadedModel, ModelCache, ModelMetadata};
pub use normalize::normalize;
pub use scoring::{score, score_all, score_text, tier, Scorer};
pub use vectorizer::{FeatureVector, Norm, TfidfVectorizer, VectorizerArtifact};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::ProbabilityClassifier;
    pub use crate::config::ScorerConfig;
    pub use crate::model_loader::{load, LoadedModel};
    pub use crate::normalize::normalize;
    pub use crate::scoring::Scorer;
    pub use modguard_core::{RiskTier, ScoreBatch, ScoreResult};
}
