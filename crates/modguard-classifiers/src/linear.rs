//! Linear model with a logistic link

use crate::calibration::sigmoid;
use crate::classifier::ProbabilityClassifier;
use crate::vectorizer::FeatureVector;
use modguard_core::{Error, Result};

/// `p = sigmoid(w·x + b)`; the margin `w·x + b` is the calibration score
#[derive(Debug, Clone)]
pub struct LinearModel {
    coef: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    pub fn new(n_features: usize, coef: Vec<f64>, intercept: f64) -> Result<Self> {
        if coef.len() != n_features {
            return Err(Error::artifact_load(format!(
                "linear model declares {} features but has {} coefficients",
                n_features,
                coef.len()
            )));
        }
        if !intercept.is_finite() || coef.iter().any(|c| !c.is_finite()) {
            return Err(Error::artifact_load(
                "linear model has non-finite coefficients",
            ));
        }

        Ok(Self { coef, intercept })
    }

    pub fn margin(&self, features: &FeatureVector) -> f64 {
        features.dot(&self.coef) + self.intercept
    }
}

impl ProbabilityClassifier for LinearModel {
    fn predict_probability(&self, features: &FeatureVector) -> f64 {
        sigmoid(self.margin(features))
    }

    fn calibration_score(&self, features: &FeatureVector) -> f64 {
        self.margin(features)
    }

    fn n_features(&self) -> usize {
        self.coef.len()
    }

    fn name(&self) -> &str {
        "linear"
    }
}
