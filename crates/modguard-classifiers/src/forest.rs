//! Random forest over sparse TF-IDF features
//!
//! Trees use the flat parallel-array layout of a fitted decision tree:
//! node `i` is a leaf when `children_left[i] == -1`; otherwise samples with
//! `x[feature[i]] <= threshold[i]` go left. `value[i]` holds per-class
//! weights, normalized at load time.

use crate::classifier::ProbabilityClassifier;
use crate::vectorizer::FeatureVector;
use modguard_core::{Error, Result};
use serde::{Deserialize, Serialize};

const LEAF: i64 = -1;

/// One serialized decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeArtifact {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        positive: f64,
    },
}

/// A validated decision tree holding the positive-class probability at each leaf
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn from_artifact(
        tree: TreeArtifact,
        index: usize,
        n_features: usize,
        n_classes: usize,
        positive: usize,
    ) -> Result<Self> {
        let n_nodes = tree.children_left.len();
        let bad = |msg: String| Error::artifact_load(format!("tree {}: {}", index, msg));

        if n_nodes == 0 {
            return Err(bad("has no nodes".to_string()));
        }
        if tree.children_right.len() != n_nodes
            || tree.feature.len() != n_nodes
            || tree.threshold.len() != n_nodes
            || tree.value.len() != n_nodes
        {
            return Err(bad("node arrays have different lengths".to_string()));
        }

        let mut nodes = Vec::with_capacity(n_nodes);
        for i in 0..n_nodes {
            let left = tree.children_left[i];
            let right = tree.children_right[i];

            if left == LEAF {
                let weights = &tree.value[i];
                if weights.len() != n_classes {
                    return Err(bad(format!(
                        "leaf {} has {} class weights, expected {}",
                        i,
                        weights.len(),
                        n_classes
                    )));
                }
                if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(bad(format!("leaf {} has invalid class weights", i)));
                }
                let total: f64 = weights.iter().sum();
                let share = if total > 0.0 {
                    weights[positive] / total
                } else {
                    0.0
                };
                nodes.push(Node::Leaf { positive: share });
                continue;
            }

            // Children always follow their parent, so traversal terminates.
            let child = |c: i64| -> Result<usize> {
                if c <= i as i64 || c >= n_nodes as i64 {
                    return Err(bad(format!("node {} has invalid child {}", i, c)));
                }
                Ok(c as usize)
            };
            let (left, right) = (child(left)?, child(right)?);

            let feature = tree.feature[i];
            if feature < 0 || feature as usize >= n_features {
                return Err(bad(format!(
                    "node {} splits on feature {} (model has {})",
                    i, feature, n_features
                )));
            }

            nodes.push(Node::Split {
                feature: feature as usize,
                threshold: tree.threshold[i],
                left,
                right,
            });
        }

        Ok(Self { nodes })
    }

    /// Positive-class probability at the leaf the features reach
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        let mut i = 0;
        loop {
            match &self.nodes[i] {
                Node::Leaf { positive } => return *positive,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    i = if features.get(*feature) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Ensemble averaging the per-tree class distributions
#[derive(Debug, Clone)]
pub struct RandomForest {
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Validate trees against the declared classes and feature count
    pub fn new(
        n_features: usize,
        classes: Vec<i64>,
        positive_label: i64,
        trees: Vec<TreeArtifact>,
    ) -> Result<Self> {
        if trees.is_empty() {
            return Err(Error::artifact_load("random forest has no trees"));
        }

        let positive = classes
            .iter()
            .position(|c| *c == positive_label)
            .ok_or_else(|| {
                Error::artifact_load(format!(
                    "positive label {} not among model classes {:?}",
                    positive_label, classes
                ))
            })?;

        let trees = trees
            .into_iter()
            .enumerate()
            .map(|(i, t)| DecisionTree::from_artifact(t, i, n_features, classes.len(), positive))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { n_features, trees })
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl ProbabilityClassifier for RandomForest {
    fn predict_probability(&self, features: &FeatureVector) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict(features)).sum();
        sum / self.trees.len() as f64
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Split on `feature`: low values lean safe, high values lean violating
    fn stump(feature: i64, threshold: f64, low: [f64; 2], high: [f64; 2]) -> TreeArtifact {
        TreeArtifact {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![feature, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![vec![10.0, 10.0], low.to_vec(), high.to_vec()],
        }
    }

    #[test]
    fn test_forest_averages_trees() {
        let forest = RandomForest::new(
            3,
            vec![0, 1],
            1,
            vec![
                stump(0, 0.1, [9.0, 1.0], [1.0, 9.0]),
                stump(2, 0.5, [8.0, 2.0], [2.0, 8.0]),
            ],
        )
        .unwrap();

        let clean = FeatureVector::zeros(3);
        assert!((forest.predict_probability(&clean) - 0.15).abs() < 1e-12);

        let toxic = FeatureVector::from_pairs(3, vec![(0, 0.8), (2, 0.6)]).unwrap();
        assert!((forest.predict_probability(&toxic) - 0.85).abs() < 1e-12);

        let mixed = FeatureVector::from_pairs(3, vec![(0, 0.8)]).unwrap();
        assert!((forest.predict_probability(&mixed) - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_goes_left() {
        let forest =
            RandomForest::new(1, vec![0, 1], 1, vec![stump(0, 0.5, [1.0, 0.0], [0.0, 1.0])])
                .unwrap();
        let at = FeatureVector::from_pairs(1, vec![(0, 0.5)]).unwrap();
        assert_eq!(forest.predict_probability(&at), 0.0);
    }

    #[test]
    fn test_positive_label_selects_column() {
        let forest = RandomForest::new(
            1,
            vec![1, 0],
            1,
            vec![stump(0, 0.5, [3.0, 1.0], [1.0, 3.0])],
        )
        .unwrap();
        assert!((forest.predict_probability(&FeatureVector::zeros(1)) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_missing_positive_label() {
        let err = RandomForest::new(1, vec![0, 2], 1, vec![stump(0, 0.5, [1.0, 0.0], [0.0, 1.0])])
            .unwrap_err();
        assert!(matches!(err, Error::ArtifactLoad(_)));
    }

    #[test]
    fn test_rejects_feature_out_of_range() {
        let err = RandomForest::new(2, vec![0, 1], 1, vec![stump(5, 0.5, [1.0, 0.0], [0.0, 1.0])])
            .unwrap_err();
        assert!(err.to_string().contains("feature 5"));
    }

    #[test]
    fn test_rejects_backward_child() {
        let mut tree = stump(0, 0.5, [1.0, 0.0], [0.0, 1.0]);
        tree.children_right[0] = 0;
        assert!(RandomForest::new(1, vec![0, 1], 1, vec![tree]).is_err());
    }

    #[test]
    fn test_rejects_ragged_arrays() {
        let mut tree = stump(0, 0.5, [1.0, 0.0], [0.0, 1.0]);
        tree.threshold.pop();
        assert!(RandomForest::new(1, vec![0, 1], 1, vec![tree]).is_err());
    }

    #[test]
    fn test_rejects_empty_forest() {
        assert!(RandomForest::new(1, vec![0, 1], 1, Vec::new()).is_err());
    }
}
