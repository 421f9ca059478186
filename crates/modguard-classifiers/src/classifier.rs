//! Classifier capability and the serialized model artifact

use crate::forest::{RandomForest, TreeArtifact};
use crate::linear::LinearModel;
use crate::vectorizer::FeatureVector;
use modguard_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Anything that can turn a feature vector into a violation probability
pub trait ProbabilityClassifier: Send + Sync {
    /// Probability of the positive ("violation") class, in [0, 1]
    fn predict_probability(&self, features: &FeatureVector) -> f64;

    /// Raw score a calibrator is fit against.
    ///
    /// Models with a decision function return the margin; the default is
    /// the uncalibrated probability.
    fn calibration_score(&self, features: &FeatureVector) -> f64 {
        self.predict_probability(features)
    }

    /// Input dimension the model was trained on
    fn n_features(&self) -> usize;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Serialized model artifact, tagged by model family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelArtifact {
    RandomForest {
        n_features: usize,
        classes: Vec<i64>,
        #[serde(default = "default_positive_label")]
        positive_label: i64,
        trees: Vec<TreeArtifact>,
    },

    Linear {
        n_features: usize,
        coef: Vec<f64>,
        intercept: f64,
    },
}

fn default_positive_label() -> i64 {
    1
}

/// Model family, as reported in metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    RandomForest,
    Linear,
}

impl ModelArtifact {
    /// Parse a JSON artifact without validating it
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::artifact_load(format!("malformed model artifact: {}", e)))
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Self::RandomForest { .. } => ModelKind::RandomForest,
            Self::Linear { .. } => ModelKind::Linear,
        }
    }

    /// Validate and build the concrete classifier
    pub fn build(self) -> Result<Box<dyn ProbabilityClassifier>> {
        match self {
            Self::RandomForest {
                n_features,
                classes,
                positive_label,
                trees,
            } => Ok(Box::new(RandomForest::new(
                n_features,
                classes,
                positive_label,
                trees,
            )?)),
            Self::Linear {
                n_features,
                coef,
                intercept,
            } => Ok(Box::new(LinearModel::new(n_features, coef, intercept)?)),
        }
    }
}
