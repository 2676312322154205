//! Evaluation of a pre-trained tree-ensemble regressor. The ensemble is
//! trained offline; this module only walks the serialized trees. Callers see
//! it through the `Regressor` trait so tests can substitute a stub.

use ndarray::ArrayView1;
use std::fmt;

/// The prediction capability the rest of the application depends on.
/// Deterministic given identical input vector and identical loaded artifact.
pub trait Regressor: Send + Sync {
    /// Number of input features the model was fitted on.
    fn n_features(&self) -> usize;

    /// Runs one inference call. Never panics on bad input; a feature-count
    /// mismatch comes back as `PredictError::ShapeMismatch`.
    fn predict(&self, features: ArrayView1<'_, f64>) -> Result<f64, PredictError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// One decision tree, nodes stored flat with index 0 as the root.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Validates node structure up front: non-empty and child indices in
    /// bounds.
    pub fn new(nodes: Vec<TreeNode>) -> Result<Self, ForestError> {
        if nodes.is_empty() {
            return Err(ForestError::EmptyTree);
        }
        for (index, node) in nodes.iter().enumerate() {
            if let TreeNode::Split { left, right, .. } = node {
                for child in [*left, *right] {
                    if child >= nodes.len() {
                        return Err(ForestError::ChildOutOfBounds {
                            node: index,
                            child,
                            len: nodes.len(),
                        });
                    }
                }
            }
        }
        Ok(Self { nodes })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn max_feature_index(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                TreeNode::Split { feature, .. } => Some(*feature),
                TreeNode::Leaf { .. } => None,
            })
            .max()
    }

    /// Walks from the root to a leaf. Split rule matches the training
    /// pipeline: go left when `features[feature] <= threshold`.
    fn evaluate(&self, features: ArrayView1<'_, f64>) -> Result<f64, PredictError> {
        let mut index = 0;
        // Bounds were checked at construction; the step counter guards
        // against a cyclic node graph, which bounds checks cannot rule out.
        for _ in 0..self.nodes.len() {
            match &self.nodes[index] {
                TreeNode::Leaf { value } => return Ok(*value),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let observed = features
                        .get(*feature)
                        .copied()
                        .ok_or(PredictError::FeatureIndexOutOfBounds {
                            feature: *feature,
                            len: features.len(),
                        })?;
                    index = if observed <= *threshold { *left } else { *right };
                }
            }
        }
        Err(PredictError::CyclicTree)
    }
}

/// A forest of decision trees; the prediction is the mean of the per-tree
/// outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(n_features: usize, trees: Vec<DecisionTree>) -> Result<Self, ForestError> {
        if trees.is_empty() {
            return Err(ForestError::NoTrees);
        }
        for tree in &trees {
            if let Some(max) = tree.max_feature_index() {
                if max >= n_features {
                    return Err(ForestError::FeatureOutOfBounds {
                        feature: max,
                        n_features,
                    });
                }
            }
        }
        Ok(Self { n_features, trees })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: ArrayView1<'_, f64>) -> Result<f64, PredictError> {
        if features.len() != self.n_features {
            return Err(PredictError::ShapeMismatch {
                expected: self.n_features,
                got: features.len(),
            });
        }
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.evaluate(features)?;
        }
        Ok(sum / self.trees.len() as f64)
    }
}

/// Structural problems detected when assembling a forest from an artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum ForestError {
    NoTrees,
    EmptyTree,
    ChildOutOfBounds { node: usize, child: usize, len: usize },
    FeatureOutOfBounds { feature: usize, n_features: usize },
}

impl fmt::Display for ForestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForestError::NoTrees => write!(f, "forest contains no trees"),
            ForestError::EmptyTree => write!(f, "tree contains no nodes"),
            ForestError::ChildOutOfBounds { node, child, len } => write!(
                f,
                "split node {} references child {} but the tree has only {} nodes",
                node, child, len
            ),
            ForestError::FeatureOutOfBounds { feature, n_features } => write!(
                f,
                "split references feature index {} but the schema declares {} columns",
                feature, n_features
            ),
        }
    }
}

impl std::error::Error for ForestError {}

/// Per-request prediction failures, surfaced to the caller and never fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictError {
    ShapeMismatch { expected: usize, got: usize },
    FeatureIndexOutOfBounds { feature: usize, len: usize },
    CyclicTree,
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictError::ShapeMismatch { expected, got } => write!(
                f,
                "feature vector has {} entries but the model expects {}",
                got, expected
            ),
            PredictError::FeatureIndexOutOfBounds { feature, len } => write!(
                f,
                "split references feature index {} but the input vector has {} entries",
                feature, len
            ),
            PredictError::CyclicTree => {
                write!(f, "tree evaluation did not reach a leaf; node graph is cyclic")
            }
        }
    }
}

impl std::error::Error for PredictError {}
