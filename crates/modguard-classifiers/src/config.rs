//! Configuration for artifact locations and calibration

use modguard_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the configuration file looked up by [`ScorerConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "modguard.yaml";

/// Text used for the single-sample calibration fit
pub const DUMMY_CALIBRATION_TEXT: &str = "sample text";

/// Scorer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// Path to the serialized classifier
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Path to the serialized TF-IDF vectorizer
    #[serde(default = "default_vectorizer_path")]
    pub vectorizer_path: PathBuf,

    /// How the probability calibration is obtained
    #[serde(default)]
    pub calibration: CalibrationSource,
}

/// Calibration source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CalibrationSource {
    /// Fit against one vector for `text`, labeled with `label`
    Dummy {
        #[serde(default = "default_dummy_text")]
        text: String,
        #[serde(default)]
        label: u8,
    },

    /// Fit against a JSON-lines file of `{"text": ..., "label": 0|1}` records
    Dataset { path: PathBuf },

    /// Use known sigmoid parameters without fitting
    Fixed { a: f64, b: f64 },
}

impl Default for CalibrationSource {
    fn default() -> Self {
        Self::Dummy {
            text: default_dummy_text(),
            label: 0,
        }
    }
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            vectorizer_path: default_vectorizer_path(),
            calibration: CalibrationSource::default(),
        }
    }
}

impl ScorerConfig {
    /// Artifacts in `dir`, calibrated against `dir/calibration.jsonl` when present
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let dataset = dir.join("calibration.jsonl");
        let calibration = if dataset.exists() {
            CalibrationSource::Dataset { path: dataset }
        } else {
            CalibrationSource::default()
        };

        Self {
            model_path: dir.join(default_model_path()),
            vectorizer_path: dir.join(default_vectorizer_path()),
            calibration,
        }
    }

    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("invalid scorer config: {}", e)))
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read config {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_yaml(&content)?;

        // Relative artifact paths are resolved against the config file's directory.
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Load from file if it exists, otherwise use defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Search `./modguard.yaml`, then the user config directory
    pub fn discover() -> Result<Self> {
        for candidate in Self::search_paths() {
            if candidate.exists() {
                debug!("Using config {}", candidate.display());
                return Self::from_file(candidate);
            }
        }
        Ok(Self::default())
    }

    /// Candidate config locations in lookup order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("modguard").join(CONFIG_FILE_NAME));
        }
        paths
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.model_path);
        resolve(&mut self.vectorizer_path);
        if let CalibrationSource::Dataset { path } = &mut self.calibration {
            resolve(path);
        }
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from("model.json")
}

fn default_vectorizer_path() -> PathBuf {
    PathBuf::from("tfidf.json")
}

fn default_dummy_text() -> String {
    DUMMY_CALIBRATION_TEXT.to_string()
}
