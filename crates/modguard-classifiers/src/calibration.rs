//! Platt sigmoid calibration
//!
//! Maps a raw classifier score `f` to `P(violation) = 1 / (1 + exp(a·f + b))`.
//! Fitting follows Platt (1999) with the Newton/backtracking solver of
//! Lin, Lin and Weng (2007), including the prior-corrected soft targets.

use crate::classifier::ProbabilityClassifier;
use crate::vectorizer::FeatureVector;
use modguard_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const MAX_ITER: usize = 100;
const MIN_STEP: f64 = 1e-10;
const HESSIAN_RIDGE: f64 = 1e-12;
const GRAD_TOLERANCE: f64 = 1e-5;

/// Numerically stable logistic function
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Fitted sigmoid parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmoidCalibrator {
    pub a: f64,
    pub b: f64,
}

impl SigmoidCalibrator {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    /// Calibrated probability for a raw score
    pub fn predict(&self, score: f64) -> f64 {
        sigmoid(-(self.a * score + self.b))
    }

    /// Fit against raw scores and binary labels (`true` = violation).
    ///
    /// A single negative sample stays at the starting point
    /// `a = 0, b = ln 2`, i.e. a constant probability of 1/3.
    pub fn fit(scores: &[f64], labels: &[bool]) -> Result<Self> {
        if scores.is_empty() {
            return Err(Error::config("calibration requires at least one sample"));
        }
        if scores.len() != labels.len() {
            return Err(Error::config(format!(
                "calibration has {} scores but {} labels",
                scores.len(),
                labels.len()
            )));
        }
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(Error::config("calibration scores must be finite"));
        }

        let prior1 = labels.iter().filter(|l| **l).count() as f64;
        let prior0 = labels.len() as f64 - prior1;

        let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
        let lo_target = 1.0 / (prior0 + 2.0);
        let targets: Vec<f64> = labels
            .iter()
            .map(|l| if *l { hi_target } else { lo_target })
            .collect();

        let mut a = 0.0;
        let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
        let mut fval = objective(scores, &targets, a, b);

        for iter in 0..MAX_ITER {
            let mut h11 = HESSIAN_RIDGE;
            let mut h22 = HESSIAN_RIDGE;
            let mut h21 = 0.0;
            let mut g1 = 0.0;
            let mut g2 = 0.0;

            for (f, t) in scores.iter().zip(&targets) {
                let p = sigmoid(-(f * a + b));
                let q = 1.0 - p;
                let d2 = p * q;
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = t - p;
                g1 += f * d1;
                g2 += d1;
            }

            if g1.abs() < GRAD_TOLERANCE && g2.abs() < GRAD_TOLERANCE {
                debug!(iterations = iter, a, b, "Calibration converged");
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut step = 1.0;
            while step >= MIN_STEP {
                let new_a = a + step * da;
                let new_b = b + step * db;
                let new_f = objective(scores, &targets, new_a, new_b);
                if new_f < fval + 1e-4 * step * gd {
                    a = new_a;
                    b = new_b;
                    fval = new_f;
                    break;
                }
                step /= 2.0;
            }

            if step < MIN_STEP {
                warn!(iterations = iter, "Calibration line search failed; keeping last estimate");
                break;
            }
        }

        Ok(Self { a, b })
    }
}

/// Cross-entropy of the soft targets under parameters `(a, b)`
fn objective(scores: &[f64], targets: &[f64], a: f64, b: f64) -> f64 {
    scores
        .iter()
        .zip(targets)
        .map(|(f, t)| {
            let z = f * a + b;
            if z >= 0.0 {
                t * z + (-z).exp().ln_1p()
            } else {
                (t - 1.0) * z + z.exp().ln_1p()
            }
        })
        .sum()
}

/// A classifier whose raw scores pass through a fitted sigmoid
pub struct CalibratedClassifier {
    inner: Box<dyn ProbabilityClassifier>,
    calibrator: SigmoidCalibrator,
    name: String,
}

impl CalibratedClassifier {
    /// Wrap with already-known parameters
    pub fn new(inner: Box<dyn ProbabilityClassifier>, calibrator: SigmoidCalibrator) -> Self {
        let name = format!("calibrated_{}", inner.name());
        Self {
            inner,
            calibrator,
            name,
        }
    }

    /// Fit the calibrator on labeled feature vectors, then wrap
    pub fn fit(
        inner: Box<dyn ProbabilityClassifier>,
        samples: &[(FeatureVector, bool)],
    ) -> Result<Self> {
        let scores: Vec<f64> = samples
            .iter()
            .map(|(x, _)| inner.calibration_score(x))
            .collect();
        let labels: Vec<bool> = samples.iter().map(|(_, y)| *y).collect();

        let calibrator = SigmoidCalibrator::fit(&scores, &labels)?;
        Ok(Self::new(inner, calibrator))
    }

    pub fn calibrator(&self) -> SigmoidCalibrator {
        self.calibrator
    }

    pub fn inner(&self) -> &dyn ProbabilityClassifier {
        self.inner.as_ref()
    }
}

impl ProbabilityClassifier for CalibratedClassifier {
    fn predict_probability(&self, features: &FeatureVector) -> f64 {
        self.calibrator
            .predict(self.inner.calibration_score(features))
    }

    fn n_features(&self) -> usize {
        self.inner.n_features()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
