//! Artifact loading and the process-wide model cache

use crate::calibration::{CalibratedClassifier, SigmoidCalibrator};
use crate::classifier::{ModelArtifact, ModelKind, ProbabilityClassifier};
use crate::config::{CalibrationSource, ScorerConfig};
use crate::normalize::normalize;
use crate::vectorizer::{FeatureVector, TfidfVectorizer};
use modguard_core::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Metadata about the loaded pair
#[derive(Debug, Clone, Serialize)]
pub struct ModelMetadata {
    /// Model family
    pub kind: ModelKind,

    /// Feature dimension shared by model and vectorizer
    pub n_features: usize,

    /// Number of trees (forests only)
    pub tree_count: Option<usize>,

    /// SHA-256 of the model artifact
    pub model_sha256: String,

    /// SHA-256 of the vectorizer artifact
    pub vectorizer_sha256: String,

    /// Number of samples the calibrator was fit on (0 for fixed parameters)
    pub calibration_samples: usize,

    /// Fitted sigmoid parameters
    pub calibration: SigmoidCalibrator,

    pub model_path: PathBuf,
    pub vectorizer_path: PathBuf,
}

/// Calibrated classifier and vectorizer, immutable once loaded
pub struct LoadedModel {
    classifier: CalibratedClassifier,
    vectorizer: TfidfVectorizer,
    metadata: ModelMetadata,
}

impl LoadedModel {
    /// Read both artifacts, check they agree, and fit the calibration
    pub fn load(config: &ScorerConfig) -> Result<Self> {
        let (model_bytes, model_sha256) = read_artifact(&config.model_path)?;
        let (vectorizer_bytes, vectorizer_sha256) = read_artifact(&config.vectorizer_path)?;

        let artifact = ModelArtifact::from_json(&model_bytes)?;
        let kind = artifact.kind();
        let tree_count = match &artifact {
            ModelArtifact::RandomForest { trees, .. } => Some(trees.len()),
            ModelArtifact::Linear { .. } => None,
        };
        let inner = artifact.build()?;
        let vectorizer = TfidfVectorizer::from_json(&vectorizer_bytes)?;

        if inner.n_features() != vectorizer.n_features() {
            return Err(Error::config(format!(
                "model expects {} features but vectorizer produces {}",
                inner.n_features(),
                vectorizer.n_features()
            )));
        }

        let (classifier, calibration_samples) =
            calibrate(inner, &vectorizer, &config.calibration)?;
        let calibration = classifier.calibrator();
        let n_features = vectorizer.n_features();

        info!(
            model = %config.model_path.display(),
            vectorizer = %config.vectorizer_path.display(),
            features = n_features,
            "Loaded {:?} classifier",
            kind
        );
        info!(
            a = calibration.a,
            b = calibration.b,
            samples = calibration_samples,
            "Calibration ready"
        );

        Ok(Self {
            classifier,
            vectorizer,
            metadata: ModelMetadata {
                kind,
                n_features,
                tree_count,
                model_sha256,
                vectorizer_sha256,
                calibration_samples,
                calibration,
                model_path: config.model_path.clone(),
                vectorizer_path: config.vectorizer_path.clone(),
            },
        })
    }

    /// Get reference to the calibrated classifier
    pub fn classifier(&self) -> &CalibratedClassifier {
        &self.classifier
    }

    /// Get reference to the vectorizer
    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    /// Get model metadata
    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

/// Read an artifact as UTF-8 and fingerprint it
fn read_artifact(path: &Path) -> Result<(String, String)> {
    let bytes = std::fs::read(path).map_err(|e| {
        Error::artifact_load(format!("failed to read {}: {}", path.display(), e))
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = format!("{:x}", hasher.finalize());

    let text = String::from_utf8(bytes).map_err(|e| {
        Error::artifact_load(format!("{} is not valid UTF-8: {}", path.display(), e))
    })?;

    debug!(path = %path.display(), sha256 = %digest, "Read artifact");
    Ok((text, digest))
}

/// One labeled record of a calibration dataset
#[derive(Debug, Deserialize)]
struct CalibrationRecord {
    text: String,
    label: u8,
}

fn calibrate(
    inner: Box<dyn ProbabilityClassifier>,
    vectorizer: &TfidfVectorizer,
    source: &CalibrationSource,
) -> Result<(CalibratedClassifier, usize)> {
    match source {
        CalibrationSource::Fixed { a, b } => Ok((
            CalibratedClassifier::new(inner, SigmoidCalibrator::new(*a, *b)),
            0,
        )),
        CalibrationSource::Dummy { text, label } => {
            let samples = vec![calibration_sample(vectorizer, text, *label != 0)];
            Ok((CalibratedClassifier::fit(inner, &samples)?, 1))
        }
        CalibrationSource::Dataset { path } => {
            let samples = read_calibration_set(path, vectorizer)?;
            let count = samples.len();
            Ok((CalibratedClassifier::fit(inner, &samples)?, count))
        }
    }
}

/// Features for one calibration text, normalized like scored comments
fn calibration_sample(
    vectorizer: &TfidfVectorizer,
    text: &str,
    label: bool,
) -> (FeatureVector, bool) {
    (vectorizer.transform(&normalize(text)), label)
}

fn read_calibration_set(
    path: &Path,
    vectorizer: &TfidfVectorizer,
) -> Result<Vec<(FeatureVector, bool)>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "failed to read calibration set {}: {}",
            path.display(),
            e
        ))
    })?;

    let mut samples = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: CalibrationRecord = serde_json::from_str(line).map_err(|e| {
            Error::config(format!(
                "{}:{}: invalid calibration record: {}",
                path.display(),
                line_no + 1,
                e
            ))
        })?;
        if record.label > 1 {
            return Err(Error::config(format!(
                "{}:{}: label must be 0 or 1, got {}",
                path.display(),
                line_no + 1,
                record.label
            )));
        }
        samples.push(calibration_sample(vectorizer, &record.text, record.label == 1));
    }

    if samples.is_empty() {
        return Err(Error::config(format!(
            "calibration set {} has no records",
            path.display()
        )));
    }
    Ok(samples)
}

/// Memoizes one [`LoadedModel`] for the lifetime of the cache.
///
/// The first successful [`get_or_load`](Self::get_or_load) performs I/O and
/// calibration under the lock; concurrent callers wait and then share the
/// same `Arc`. A failed load leaves the cache empty.
pub struct ModelCache {
    slot: Mutex<Option<Arc<LoadedModel>>>,
    loads: AtomicUsize,
}

impl ModelCache {
    pub const fn new() -> Self {
        Self {
            slot: parking_lot::const_mutex(None),
            loads: AtomicUsize::new(0),
        }
    }

    /// Return the cached model, loading it with `config` on first use
    pub fn get_or_load(&self, config: &ScorerConfig) -> Result<Arc<LoadedModel>> {
        let mut slot = self.slot.lock();
        if let Some(model) = slot.as_ref() {
            let meta = model.metadata();
            if meta.model_path != config.model_path || meta.vectorizer_path != config.vectorizer_path
            {
                warn!(
                    cached = %meta.model_path.display(),
                    requested = %config.model_path.display(),
                    "Model already loaded; ignoring different artifact paths"
                );
            }
            return Ok(Arc::clone(model));
        }

        let model = Arc::new(LoadedModel::load(config)?);
        self.loads.fetch_add(1, Ordering::SeqCst);
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Cached model, if loaded
    pub fn get(&self) -> Option<Arc<LoadedModel>> {
        self.slot.lock().clone()
    }

    /// Number of successful loads performed
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_MODEL: ModelCache = ModelCache::new();

/// Load the process-wide classifier/vectorizer pair.
///
/// Only the first call reads `config`; later calls return the cached pair.
pub fn load(config: &ScorerConfig) -> Result<Arc<LoadedModel>> {
    GLOBAL_MODEL.get_or_load(config)
}

/// The process-wide cache backing [`load`]
pub fn global_cache() -> &'static ModelCache {
    &GLOBAL_MODEL
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VECTORIZER: &str = r#"{
        "vocabulary": {"worst": 0, "lost": 1, "love": 2},
        "idf": [1.8, 2.1, 1.4]
    }"#;

    const FOREST: &str = r#"{
        "type": "random_forest",
        "n_features": 3,
        "classes": [0, 1],
        "trees": [{
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [0, -2, -2],
            "threshold": [0.2, -2.0, -2.0],
            "value": [[5.0, 5.0], [9.0, 1.0], [1.0, 9.0]]
        }]
    }"#;

    fn write_artifacts(dir: &Path, model: &str, vectorizer: &str) -> ScorerConfig {
        let model_path = dir.join("model.json");
        let vectorizer_path = dir.join("tfidf.json");
        std::fs::write(&model_path, model).unwrap();
        std::fs::write(&vectorizer_path, vectorizer).unwrap();
        ScorerConfig {
            model_path,
            vectorizer_path,
            calibration: CalibrationSource::default(),
        }
    }

    #[test]
    fn test_load_fits_dummy_calibration() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_artifacts(dir.path(), FOREST, VECTORIZER);

        let model = LoadedModel::load(&config).unwrap();
        let meta = model.metadata();
        assert_eq!(meta.kind, ModelKind::RandomForest);
        assert_eq!(meta.n_features, 3);
        assert_eq!(meta.tree_count, Some(1));
        assert_eq!(meta.calibration_samples, 1);
        assert_eq!(meta.model_sha256.len(), 64);
        assert_ne!(meta.model_sha256, meta.vectorizer_sha256);

        let p = model
            .classifier()
            .predict_probability(&model.vectorizer().transform("worst"));
        assert!((p - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_with_fixed_calibration() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_artifacts(dir.path(), FOREST, VECTORIZER);
        config.calibration = CalibrationSource::Fixed { a: -6.0, b: 3.0 };

        let model = LoadedModel::load(&config).unwrap();
        assert_eq!(model.metadata().calibration_samples, 0);

        let toxic = model
            .classifier()
            .predict_probability(&model.vectorizer().transform("worst"));
        let clean = model
            .classifier()
            .predict_probability(&model.vectorizer().transform("love"));
        assert!(toxic > 0.9);
        assert!(clean < 0.2);
    }

    #[test]
    fn test_load_with_dataset_calibration() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_artifacts(dir.path(), FOREST, VECTORIZER);
        let dataset = dir.path().join("calibration.jsonl");
        std::fs::write(
            &dataset,
            concat!(
                "{\"text\": \"You are the WORST\", \"label\": 1}\n",
                "{\"text\": \"get lost, worst take ever\", \"label\": 1}\n",
                "\n",
                "{\"text\": \"I love it\", \"label\": 0}\n",
                "{\"text\": \"love this, thanks\", \"label\": 0}\n",
                "{\"text\": \"worst day but I love you all\", \"label\": 0}\n",
            ),
        )
        .unwrap();
        config.calibration = CalibrationSource::Dataset { path: dataset };

        let model = LoadedModel::load(&config).unwrap();
        assert_eq!(model.metadata().calibration_samples, 5);
        assert!(model.metadata().calibration.a < 0.0);
    }

    #[test]
    fn test_calibration_text_is_normalized() {
        let vectorizer = TfidfVectorizer::from_json(VECTORIZER).unwrap();

        let (features, label) =
            calibration_sample(&vectorizer, "LOVE it http://worst.example", true);
        assert!(label);
        assert_eq!(features.get(0), 0.0);
        assert!(features.get(2) > 0.0);

        let (dummy, _) = calibration_sample(&vectorizer, "sample text", false);
        assert!(dummy.is_zero());
    }

    #[test]
    fn test_dataset_rejects_bad_label() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_artifacts(dir.path(), FOREST, VECTORIZER);
        let dataset = dir.path().join("calibration.jsonl");
        std::fs::write(&dataset, "{\"text\": \"hm\", \"label\": 3}\n").unwrap();
        config.calibration = CalibrationSource::Dataset { path: dataset };

        assert!(matches!(LoadedModel::load(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_artifact() {
        let config = ScorerConfig {
            model_path: PathBuf::from("/nonexistent/model.json"),
            ..ScorerConfig::default()
        };
        let err = LoadedModel::load(&config).err().unwrap();
        assert!(matches!(err, Error::ArtifactLoad(_)));
        assert!(err.to_string().contains("/nonexistent/model.json"));
    }

    #[test]
    fn test_malformed_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_artifacts(dir.path(), "{\"type\": \"random_forest\"", VECTORIZER);
        assert!(matches!(
            LoadedModel::load(&config),
            Err(Error::ArtifactLoad(_))
        ));
    }

    #[test]
    fn test_dimension_mismatch_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let vectorizer = r#"{"vocabulary": {"worst": 0, "lost": 1}, "idf": [1.0, 1.0]}"#;
        let config = write_artifacts(dir.path(), FOREST, vectorizer);

        let err = LoadedModel::load(&config).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_cache_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_artifacts(dir.path(), FOREST, VECTORIZER);
        let cache = ModelCache::new();

        let first = cache.get_or_load(&config).unwrap();
        let second = cache.get_or_load(&config).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.load_count(), 1);
        assert!(cache.get().is_some());
    }

    #[test]
    fn test_cache_concurrent_first_callers() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_artifacts(dir.path(), FOREST, VECTORIZER);
        let cache = ModelCache::new();

        let models: Vec<Arc<LoadedModel>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| cache.get_or_load(&config).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(cache.load_count(), 1);
        assert!(models.iter().all(|m| Arc::ptr_eq(m, &models[0])));
    }

    #[test]
    fn test_cache_failed_load_stays_empty() {
        let cache = ModelCache::new();
        let config = ScorerConfig {
            model_path: PathBuf::from("/nonexistent/model.json"),
            ..ScorerConfig::default()
        };

        assert!(cache.get_or_load(&config).is_err());
        assert!(cache.get().is_none());
        assert_eq!(cache.load_count(), 0);
    }
}
