//! TF-IDF feature extraction over a frozen vocabulary

use modguard_core::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Sparse feature vector: sorted `(column, weight)` pairs over a fixed dimension
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    dim: usize,
    entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    /// All-zero vector of the given dimension
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
        }
    }

    /// Build from arbitrary pairs.
    ///
    /// Duplicate columns are summed, zeros dropped, and columns outside
    /// `dim` rejected.
    pub fn from_pairs(dim: usize, pairs: impl IntoIterator<Item = (usize, f64)>) -> Result<Self> {
        let mut merged: BTreeMap<usize, f64> = BTreeMap::new();
        for (column, weight) in pairs {
            if column >= dim {
                return Err(Error::internal(format!(
                    "feature column {} out of range for dimension {}",
                    column, dim
                )));
            }
            *merged.entry(column).or_insert(0.0) += weight;
        }

        Ok(Self {
            dim,
            entries: merged.into_iter().filter(|(_, w)| *w != 0.0).collect(),
        })
    }

    /// Vector dimension
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Weight of a column (zero when absent)
    pub fn get(&self, column: usize) -> f64 {
        self.entries
            .binary_search_by_key(&column, |(c, _)| *c)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    /// Non-zero entries in column order
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// True when every weight is zero
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dot product with a dense weight vector of the same dimension
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.entries
            .iter()
            .map(|(c, w)| w * dense.get(*c).copied().unwrap_or(0.0))
            .sum()
    }
}

/// Row normalization applied after weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    L1,
    None,
}

/// Serialized vectorizer artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerArtifact {
    /// Term to column index
    pub vocabulary: HashMap<String, usize>,

    /// Inverse document frequency per column
    pub idf: Vec<f64>,

    /// Inclusive word n-gram range
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),

    /// Use `1 + ln(tf)` instead of raw counts
    #[serde(default)]
    pub sublinear_tf: bool,

    #[serde(default)]
    pub norm: Norm,

    #[serde(default = "default_true")]
    pub lowercase: bool,

    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,

    #[serde(default)]
    pub stop_words: Vec<String>,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_true() -> bool {
    true
}

fn default_token_pattern() -> String {
    r"\b\w\w+\b".to_string()
}

/// Fitted TF-IDF vectorizer. Immutable once built.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    norm: Norm,
    lowercase: bool,
    token_pattern: Regex,
    stop_words: HashSet<String>,
}

impl TfidfVectorizer {
    /// Validate an artifact and build the vectorizer
    pub fn from_artifact(artifact: VectorizerArtifact) -> Result<Self> {
        let n_features = artifact.idf.len();
        if n_features == 0 {
            return Err(Error::artifact_load("vectorizer has an empty idf table"));
        }

        if artifact.vocabulary.len() != n_features {
            return Err(Error::artifact_load(format!(
                "vectorizer vocabulary has {} terms but idf has {} entries",
                artifact.vocabulary.len(),
                n_features
            )));
        }

        let mut seen = vec![false; n_features];
        for (term, &column) in &artifact.vocabulary {
            if column >= n_features {
                return Err(Error::artifact_load(format!(
                    "vocabulary term '{}' maps to column {} (only {} columns)",
                    term, column, n_features
                )));
            }
            if std::mem::replace(&mut seen[column], true) {
                return Err(Error::artifact_load(format!(
                    "vocabulary column {} is assigned twice",
                    column
                )));
            }
        }

        if let Some(bad) = artifact.idf.iter().find(|v| !v.is_finite()) {
            return Err(Error::artifact_load(format!(
                "vectorizer idf contains a non-finite value: {}",
                bad
            )));
        }

        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(Error::artifact_load(format!(
                "invalid ngram_range ({}, {})",
                min_n, max_n
            )));
        }

        let token_pattern = Regex::new(&artifact.token_pattern).map_err(|e| {
            Error::artifact_load(format!(
                "invalid token_pattern '{}': {}",
                artifact.token_pattern, e
            ))
        })?;

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            ngram_range: artifact.ngram_range,
            sublinear_tf: artifact.sublinear_tf,
            norm: artifact.norm,
            lowercase: artifact.lowercase,
            token_pattern,
            stop_words: artifact.stop_words.into_iter().collect(),
        })
    }

    /// Parse and validate a JSON artifact
    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: VectorizerArtifact = serde_json::from_str(json)
            .map_err(|e| Error::artifact_load(format!("malformed vectorizer artifact: {}", e)))?;
        Self::from_artifact(artifact)
    }

    /// Output dimension
    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    /// Column of a term, if it is in the vocabulary
    pub fn column(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Split text into unigram tokens, stop words removed
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            std::borrow::Cow::Owned(text.to_lowercase())
        } else {
            std::borrow::Cow::Borrowed(text)
        };

        self.token_pattern
            .find_iter(&text)
            .map(|m| m.as_str().to_string())
            .filter(|t| !self.stop_words.contains(t))
            .collect()
    }

    /// Map text to its TF-IDF vector.
    ///
    /// Out-of-vocabulary n-grams contribute nothing.
    pub fn transform(&self, text: &str) -> FeatureVector {
        let tokens = self.tokenize(text);
        let (min_n, max_n) = self.ngram_range;

        let mut counts: HashMap<usize, f64> = HashMap::new();
        for n in min_n..=max_n {
            for window in tokens.windows(n) {
                let gram = window.join(" ");
                if let Some(&column) = self.vocabulary.get(&gram) {
                    *counts.entry(column).or_insert(0.0) += 1.0;
                }
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(column, count)| {
                let tf = if self.sublinear_tf { 1.0 + count.ln() } else { count };
                (column, tf * self.idf[column])
            })
            .filter(|(_, w)| *w != 0.0)
            .collect();
        entries.sort_unstable_by_key(|(c, _)| *c);

        let scale = match self.norm {
            Norm::L2 => entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt(),
            Norm::L1 => entries.iter().map(|(_, w)| w.abs()).sum::<f64>(),
            Norm::None => 1.0,
        };
        if scale > 0.0 && scale != 1.0 {
            for (_, w) in entries.iter_mut() {
                *w /= scale;
            }
        }

        FeatureVector {
            dim: self.n_features(),
            entries,
        }
    }
}
