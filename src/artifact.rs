//! Loading and structural validation of the serialized model artifact.
//!
//! The artifact is produced by the offline training pipeline and treated as
//! opaque: a JSON document carrying a format version, the declared feature
//! column order the model was fitted on, and the flattened tree ensemble.
//! It is read once at process start; nothing in this crate ever writes it.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::encoder::{FeatureSchema, SchemaError};
use crate::forest::{DecisionTree, ForestError, RandomForest, TreeNode};

pub const SUPPORTED_FORMAT_VERSION: u32 = 1;
pub const SUPPORTED_MODEL_TYPE: &str = "random_forest_regressor";

#[derive(Deserialize, Debug)]
struct RawArtifact {
    format_version: u32,
    model_type: String,
    feature_columns: Vec<String>,
    trees: Vec<RawTree>,
}

#[derive(Deserialize, Debug)]
struct RawTree {
    nodes: Vec<RawNode>,
}

/// One serialized node. Split nodes carry feature/threshold/left/right,
/// leaves carry only value; anything else is rejected as corrupt.
#[derive(Deserialize, Debug)]
struct RawNode {
    #[serde(default)]
    feature: Option<usize>,
    #[serde(default)]
    threshold: Option<f64>,
    #[serde(default)]
    left: Option<usize>,
    #[serde(default)]
    right: Option<usize>,
    #[serde(default)]
    value: Option<f64>,
}

/// A fully validated artifact: the feature schema the model was fitted on and
/// the evaluable forest, bound together so an encoding/column-order mismatch
/// cannot arise after load.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    schema: FeatureSchema,
    forest: RandomForest,
    model_type: String,
    source: PathBuf,
}

impl ModelArtifact {
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    pub fn model_type(&self) -> &str {
        &self.model_type
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Reads and validates an artifact from disk.
pub fn load_artifact(path: &Path) -> Result<ModelArtifact, ArtifactError> {
    let contents = fs::read_to_string(path)?;
    let raw: RawArtifact = serde_json::from_str(&contents)?;

    if raw.format_version != SUPPORTED_FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedVersion(raw.format_version));
    }
    if raw.model_type != SUPPORTED_MODEL_TYPE {
        return Err(ArtifactError::UnsupportedModelType(raw.model_type));
    }

    let schema = FeatureSchema::from_columns(&raw.feature_columns)?;

    let mut trees = Vec::with_capacity(raw.trees.len());
    for (tree_index, raw_tree) in raw.trees.into_iter().enumerate() {
        let mut nodes = Vec::with_capacity(raw_tree.nodes.len());
        for (node_index, raw_node) in raw_tree.nodes.into_iter().enumerate() {
            nodes.push(convert_node(raw_node).ok_or(ArtifactError::MalformedNode {
                tree: tree_index,
                node: node_index,
            })?);
        }
        trees.push(DecisionTree::new(nodes)?);
    }

    let forest = RandomForest::new(schema.len(), trees)?;

    Ok(ModelArtifact {
        schema,
        forest,
        model_type: SUPPORTED_MODEL_TYPE.to_string(),
        source: path.to_path_buf(),
    })
}

fn convert_node(raw: RawNode) -> Option<TreeNode> {
    match raw {
        RawNode {
            feature: Some(feature),
            threshold: Some(threshold),
            left: Some(left),
            right: Some(right),
            value: None,
        } => Some(TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        }),
        RawNode {
            feature: None,
            threshold: None,
            left: None,
            right: None,
            value: Some(value),
        } => Some(TreeNode::Leaf { value }),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ArtifactError {
    Io(io::Error),
    Json(serde_json::Error),
    UnsupportedVersion(u32),
    UnsupportedModelType(String),
    Schema(SchemaError),
    MalformedNode { tree: usize, node: usize },
    Forest(ForestError),
}

impl From<io::Error> for ArtifactError {
    fn from(err: io::Error) -> ArtifactError {
        ArtifactError::Io(err)
    }
}

impl From<serde_json::Error> for ArtifactError {
    fn from(err: serde_json::Error) -> ArtifactError {
        ArtifactError::Json(err)
    }
}

impl From<SchemaError> for ArtifactError {
    fn from(err: SchemaError) -> ArtifactError {
        ArtifactError::Schema(err)
    }
}

impl From<ForestError> for ArtifactError {
    fn from(err: ForestError) -> ArtifactError {
        ArtifactError::Forest(err)
    }
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactError::Io(err) => write!(f, "failed to read model artifact: {}", err),
            ArtifactError::Json(err) => write!(f, "model artifact is not valid JSON: {}", err),
            ArtifactError::UnsupportedVersion(version) => write!(
                f,
                "model artifact format version {} is not supported (expected {})",
                version, SUPPORTED_FORMAT_VERSION
            ),
            ArtifactError::UnsupportedModelType(kind) => write!(
                f,
                "model type '{}' is not supported (expected '{}')",
                kind, SUPPORTED_MODEL_TYPE
            ),
            ArtifactError::Schema(err) => write!(f, "{}", err),
            ArtifactError::MalformedNode { tree, node } => write!(
                f,
                "tree {} node {} is neither a complete split nor a leaf",
                tree, node
            ),
            ArtifactError::Forest(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ArtifactError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArtifactError::Io(err) => Some(err),
            ArtifactError::Json(err) => Some(err),
            ArtifactError::Schema(err) => Some(err),
            ArtifactError::Forest(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::EncodingScheme;
    use crate::forest::Regressor;
    use ndarray::array;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_artifact(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    const ORDINAL_ARTIFACT: &str = r#"{
        "format_version": 1,
        "model_type": "random_forest_regressor",
        "feature_columns": ["age", "sex", "bmi", "children", "smoker", "region"],
        "trees": [
            {"nodes": [
                {"feature": 4, "threshold": 0.5, "left": 1, "right": 2},
                {"value": 8000.0},
                {"value": 32000.0}
            ]},
            {"nodes": [{"value": 10000.0}]}
        ]
    }"#;

    #[test]
    fn test_load_ordinal_artifact() {
        let file = write_temp_artifact(ORDINAL_ARTIFACT);
        let artifact = load_artifact(file.path()).unwrap();

        assert_eq!(artifact.schema().scheme(), EncodingScheme::Ordinal);
        assert_eq!(artifact.schema().len(), 6);
        assert_eq!(artifact.forest().n_trees(), 2);
        assert_eq!(artifact.model_type(), SUPPORTED_MODEL_TYPE);

        // Smoker (index 4) drives the first tree; mean with the constant tree.
        let smoker = artifact
            .forest()
            .predict(array![30.0, 1.0, 25.0, 0.0, 1.0, 0.0].view())
            .unwrap();
        assert_eq!(smoker, (32000.0 + 10000.0) / 2.0);
    }

    #[test]
    fn test_missing_file() {
        let result = load_artifact(Path::new("no_such_model.json"));
        assert!(matches!(result, Err(ArtifactError::Io(_))));
    }

    #[test]
    fn test_malformed_json() {
        let file = write_temp_artifact("{\"format_version\": 1,");
        let result = load_artifact(file.path());
        assert!(matches!(result, Err(ArtifactError::Json(_))));
    }

    #[test]
    fn test_unsupported_version() {
        let json = ORDINAL_ARTIFACT.replacen("\"format_version\": 1", "\"format_version\": 2", 1);
        let file = write_temp_artifact(&json);
        let result = load_artifact(file.path());
        assert!(matches!(result, Err(ArtifactError::UnsupportedVersion(2))));
    }

    #[test]
    fn test_unsupported_model_type() {
        let json = ORDINAL_ARTIFACT.replacen("random_forest_regressor", "linear_regressor", 1);
        let file = write_temp_artifact(&json);
        let result = load_artifact(file.path());
        assert!(matches!(result, Err(ArtifactError::UnsupportedModelType(t)) if t == "linear_regressor"));
    }

    #[test]
    fn test_unknown_feature_column() {
        let json = ORDINAL_ARTIFACT.replacen("\"bmi\"", "\"height\"", 1);
        let file = write_temp_artifact(&json);
        let result = load_artifact(file.path());
        assert!(
            matches!(result, Err(ArtifactError::Schema(SchemaError::UnknownColumn(c))) if c == "height")
        );
    }

    #[test]
    fn test_node_with_split_and_leaf_fields_rejected() {
        let json = r#"{
            "format_version": 1,
            "model_type": "random_forest_regressor",
            "feature_columns": ["age"],
            "trees": [
                {"nodes": [{"feature": 0, "threshold": 1.0, "left": 1, "right": 2, "value": 5.0}]}
            ]
        }"#;
        let file = write_temp_artifact(json);
        let result = load_artifact(file.path());
        assert!(matches!(
            result,
            Err(ArtifactError::MalformedNode { tree: 0, node: 0 })
        ));
    }

    #[test]
    fn test_child_index_out_of_bounds_rejected() {
        let json = r#"{
            "format_version": 1,
            "model_type": "random_forest_regressor",
            "feature_columns": ["age"],
            "trees": [
                {"nodes": [
                    {"feature": 0, "threshold": 1.0, "left": 1, "right": 9},
                    {"value": 5.0}
                ]}
            ]
        }"#;
        let file = write_temp_artifact(json);
        let result = load_artifact(file.path());
        assert!(matches!(result, Err(ArtifactError::Forest(_))));
    }

    #[test]
    fn test_feature_index_beyond_schema_rejected() {
        let json = r#"{
            "format_version": 1,
            "model_type": "random_forest_regressor",
            "feature_columns": ["age", "bmi"],
            "trees": [
                {"nodes": [
                    {"feature": 5, "threshold": 1.0, "left": 1, "right": 2},
                    {"value": 5.0},
                    {"value": 6.0}
                ]}
            ]
        }"#;
        let file = write_temp_artifact(json);
        let result = load_artifact(file.path());
        assert!(matches!(result, Err(ArtifactError::Forest(_))));
    }
}
