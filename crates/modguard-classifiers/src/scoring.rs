//! Comment scoring: normalize, vectorize, calibrated probability, risk tier

use crate::classifier::ProbabilityClassifier;
use crate::model_loader::LoadedModel;
use crate::normalize::normalize;
use crate::vectorizer::TfidfVectorizer;
use modguard_core::{Error, Result, RiskTier, ScoreBatch, ScoreResult};
use std::sync::Arc;
use tracing::debug;

/// Map a probability to its risk tier
pub fn tier(probability: f64) -> RiskTier {
    RiskTier::from_probability(probability)
}

/// Score one comment.
///
/// Fails with [`Error::InvalidInput`] when nothing is left after
/// normalization.
pub fn score(
    comment: &str,
    classifier: &dyn ProbabilityClassifier,
    vectorizer: &TfidfVectorizer,
) -> Result<ScoreResult> {
    let normalized = normalize(comment);
    if normalized.is_empty() {
        return Err(Error::invalid_input(format!(
            "comment {:?} is empty after normalization",
            comment
        )));
    }

    Ok(score_normalized(comment, &normalized, classifier, vectorizer))
}

/// Score text already known to be non-empty after normalization
fn score_normalized(
    comment: &str,
    normalized: &str,
    classifier: &dyn ProbabilityClassifier,
    vectorizer: &TfidfVectorizer,
) -> ScoreResult {
    let features = vectorizer.transform(normalized);
    let probability = classifier.predict_probability(&features);
    let result = ScoreResult::new(comment, probability);

    debug!(
        normalized = %normalized,
        nnz = features.nnz(),
        probability = result.probability,
        tier = ?result.tier,
        "Scored comment"
    );
    result
}

/// Score every non-blank line in order; returns results and the number of
/// lines skipped for normalizing to nothing
fn score_lines<I, S>(
    lines: I,
    classifier: &dyn ProbabilityClassifier,
    vectorizer: &TfidfVectorizer,
) -> (Vec<ScoreResult>, usize)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut results = Vec::new();
    let mut skipped = 0;

    for line in lines {
        let comment = line.as_ref().trim();
        if comment.is_empty() {
            continue;
        }

        let normalized = normalize(comment);
        if normalized.is_empty() {
            debug!(comment = %comment, "Skipping line: empty after normalization");
            skipped += 1;
            continue;
        }
        results.push(score_normalized(comment, &normalized, classifier, vectorizer));
    }

    (results, skipped)
}

/// Score a batch of lines.
///
/// Lines are trimmed and blank ones dropped; output follows input order
/// with no deduplication.
pub fn score_all<I, S>(
    lines: I,
    classifier: &dyn ProbabilityClassifier,
    vectorizer: &TfidfVectorizer,
) -> Vec<ScoreResult>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    score_lines(lines, classifier, vectorizer).0
}

/// Score a multi-line request, one comment per line.
///
/// An input with nothing to score yields an empty batch carrying a
/// validation notice rather than an error.
pub fn score_text(
    input: &str,
    classifier: &dyn ProbabilityClassifier,
    vectorizer: &TfidfVectorizer,
) -> ScoreBatch {
    let (results, skipped) = score_lines(input.lines(), classifier, vectorizer);
    let batch = ScoreBatch::new(results, skipped);

    debug!(
        request_id = %batch.request_id,
        scored = batch.results.len(),
        skipped = batch.skipped,
        "Scored request"
    );
    batch
}

/// Scoring front-end over a shared loaded model
#[derive(Clone)]
pub struct Scorer {
    model: Arc<LoadedModel>,
}

impl Scorer {
    pub fn new(model: Arc<LoadedModel>) -> Self {
        Self { model }
    }

    /// Get reference to the underlying model
    pub fn model(&self) -> &Arc<LoadedModel> {
        &self.model
    }

    pub fn score(&self, comment: &str) -> Result<ScoreResult> {
        score(
            comment,
            self.model.classifier(),
            self.model.vectorizer(),
        )
    }

    pub fn score_all<I, S>(&self, lines: I) -> Vec<ScoreResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        score_all(lines, self.model.classifier(), self.model.vectorizer())
    }

    pub fn score_text(&self, input: &str) -> ScoreBatch {
        score_text(input, self.model.classifier(), self.model.vectorizer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{CalibratedClassifier, SigmoidCalibrator};
    use crate::linear::LinearModel;
    use crate::vectorizer::{Norm, VectorizerArtifact};
    use modguard_core::EMPTY_REQUEST_NOTICE;

    fn vectorizer() -> TfidfVectorizer {
        let vocabulary = ["worst", "lost", "love", "ok", "thanks"]
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect();

        TfidfVectorizer::from_artifact(VectorizerArtifact {
            vocabulary,
            idf: vec![2.0, 2.0, 1.5, 1.2, 1.5],
            ngram_range: (1, 1),
            sublinear_tf: false,
            norm: Norm::L2,
            lowercase: true,
            token_pattern: r"\b\w\w+\b".to_string(),
            stop_words: Vec::new(),
        })
        .unwrap()
    }

    /// Identity calibration (`a = -1, b = 0`) over a linear margin
    fn classifier() -> CalibratedClassifier {
        let inner = LinearModel::new(5, vec![3.0, 2.0, -3.0, 0.0, -2.0], -0.5).unwrap();
        CalibratedClassifier::new(Box::new(inner), SigmoidCalibrator::new(-1.0, 0.0))
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(tier(0.60), RiskTier::Medium);
        assert_eq!(tier(0.6000001), RiskTier::High);
        assert_eq!(tier(0.30), RiskTier::Low);
        assert_eq!(tier(0.30001), RiskTier::Medium);
    }

    #[test]
    fn test_score_keeps_original_comment() {
        let result = score("You are the WORST!", &classifier(), &vectorizer()).unwrap();
        assert_eq!(result.comment, "You are the WORST!");
        assert_eq!(result.tier, RiskTier::High);
    }

    #[test]
    fn test_score_empty_after_normalization() {
        let err = score("!!! ???", &classifier(), &vectorizer()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_score_all_drops_blank_lines() {
        let results = score_all(["", "  ", "ok"], &classifier(), &vectorizer());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].comment, "ok");
    }

    #[test]
    fn test_score_all_keeps_order_and_duplicates() {
        let lines = ["I love this!", "you are the worst, get lost!", "I love this!"];
        let results = score_all(lines, &classifier(), &vectorizer());

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].comment, "I love this!");
        assert_eq!(results[1].comment, "you are the worst, get lost!");
        assert_eq!(results[0], results[2]);
        assert!(results[1].probability > results[0].probability);
        for r in &results {
            assert!((0.0..=1.0).contains(&r.probability));
            assert_eq!(r.tier, tier(r.probability));
        }
    }

    #[test]
    fn test_score_all_trims_lines() {
        let results = score_all(["   thanks   "], &classifier(), &vectorizer());
        assert_eq!(results[0].comment, "thanks");
        assert_eq!(results[0].tier, RiskTier::Low);
    }

    #[test]
    fn test_score_text_blank_request() {
        let batch = score_text("\n   \n\t\n", &classifier(), &vectorizer());
        assert!(batch.is_empty());
        assert_eq!(batch.skipped, 0);
        assert_eq!(batch.notice.as_deref(), Some(EMPTY_REQUEST_NOTICE));
    }

    #[test]
    fn test_score_text_counts_skipped() {
        let batch = score_text("I love this!\n!!!\n\nget lost", &classifier(), &vectorizer());
        assert_eq!(batch.results.len(), 2);
        assert_eq!(batch.skipped, 1);
        assert!(batch.notice.is_none());
    }

    #[test]
    fn test_batch_agrees_with_single_scores() {
        let (classifier, vectorizer) = (classifier(), vectorizer());
        let lines = ["get lost", "???", "thanks ok", "  worst  "];

        let batch = score_text(&lines.join("\n"), &classifier, &vectorizer);
        let singles: Vec<_> = lines
            .iter()
            .filter_map(|l| score(l.trim(), &classifier, &vectorizer).ok())
            .collect();

        assert_eq!(batch.results, singles);
        assert_eq!(batch.skipped, 1);
        assert!(matches!(
            score("???", &classifier, &vectorizer),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_out_of_vocabulary_comment_is_scored() {
        let result = score("zzz qqq", &classifier(), &vectorizer()).unwrap();
        // Zero vector: margin is the intercept.
        assert!((result.probability - crate::calibration::sigmoid(-0.5)).abs() < 1e-12);
    }
}
