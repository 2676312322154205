//! End-to-end prediction flow: load an artifact from disk, validate a
//! profile, encode it against the artifact's schema, and evaluate the forest.

use approx::assert_abs_diff_eq;
use ndarray::ArrayView1;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use medinsure::artifact::{load_artifact, ArtifactError};
use medinsure::encoder::EncodingScheme;
use medinsure::forest::{PredictError, Regressor};
use medinsure::profile::{PatientProfile, Region, Sex, Smoker};

fn shipped_artifact_path() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("resources/model/insurance_forest.json")
}

#[test]
fn test_shipped_artifact_smoker_estimate() {
    let artifact = load_artifact(&shipped_artifact_path()).unwrap();
    assert_eq!(artifact.schema().scheme(), EncodingScheme::Ordinal);
    assert_eq!(artifact.forest().n_trees(), 3);

    let profile =
        PatientProfile::new(30, Sex::Male, 25.0, 0, Smoker::Yes, Region::Southeast).unwrap();
    let features = artifact.schema().encode(&profile);
    assert_eq!(features.to_vec(), vec![30.0, 1.0, 25.0, 0.0, 1.0, 0.0]);

    let estimate = artifact.forest().predict(features.view()).unwrap();
    // Leaves reached per tree: 21587.20, 24830.60, 19934.20.
    assert_abs_diff_eq!(estimate, 66352.0 / 3.0, epsilon = 1e-9);
}

#[test]
fn test_shipped_artifact_non_smoker_estimate() {
    let artifact = load_artifact(&shipped_artifact_path()).unwrap();

    let profile =
        PatientProfile::new(40, Sex::Female, 31.5, 2, Smoker::No, Region::Southwest).unwrap();
    let features = artifact.schema().encode(&profile);
    let estimate = artifact.forest().predict(features.view()).unwrap();
    // Leaves reached per tree: 6231.40, 11210.10, 12950.75.
    assert_abs_diff_eq!(estimate, 30392.25 / 3.0, epsilon = 1e-9);

    let smoker =
        PatientProfile::new(40, Sex::Female, 31.5, 2, Smoker::Yes, Region::Southwest).unwrap();
    let smoker_estimate = artifact
        .forest()
        .predict(artifact.schema().encode(&smoker).view())
        .unwrap();
    assert!(smoker_estimate > estimate);
}

#[test]
fn test_one_hot_artifact_end_to_end() {
    let json = r#"{
        "format_version": 1,
        "model_type": "random_forest_regressor",
        "feature_columns": [
            "age", "bmi", "children",
            "sex_male", "smoker_yes",
            "region_southeast", "region_southwest",
            "region_northeast", "region_northwest"
        ],
        "trees": [
            {"nodes": [
                {"feature": 5, "threshold": 0.5, "left": 1, "right": 2},
                {"value": 9000.0},
                {"value": 15000.0}
            ]}
        ]
    }"#;
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let artifact = load_artifact(file.path()).unwrap();
    assert_eq!(artifact.schema().scheme(), EncodingScheme::Indicator);

    let southeast =
        PatientProfile::new(30, Sex::Male, 25.0, 0, Smoker::Yes, Region::Southeast).unwrap();
    let features = artifact.schema().encode(&southeast);
    assert_eq!(
        features.to_vec(),
        vec![30.0, 25.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0]
    );
    let estimate = artifact.forest().predict(features.view()).unwrap();
    assert_abs_diff_eq!(estimate, 15000.0);

    let northwest =
        PatientProfile::new(30, Sex::Male, 25.0, 0, Smoker::Yes, Region::Northwest).unwrap();
    let estimate = artifact
        .forest()
        .predict(artifact.schema().encode(&northwest).view())
        .unwrap();
    assert_abs_diff_eq!(estimate, 9000.0);
}

#[test]
fn test_missing_artifact_reports_io_error() {
    let result = load_artifact(Path::new("resources/model/does_not_exist.json"));
    assert!(matches!(result, Err(ArtifactError::Io(_))));
}

/// The prediction capability is a trait seam: anything implementing
/// `Regressor` can stand in for the loaded forest.
struct StubRegressor {
    n_features: usize,
    value: f64,
}

impl Regressor for StubRegressor {
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
        Ok(self.value)
    }
}

#[test]
fn test_stub_regressor_substitutes_for_the_forest() {
    let artifact = load_artifact(&shipped_artifact_path()).unwrap();
    let stub = StubRegressor {
        n_features: artifact.schema().len(),
        value: 1234.5,
    };
    let regressor: &dyn Regressor = &stub;

    let profile =
        PatientProfile::new(52, Sex::Female, 28.0, 3, Smoker::No, Region::Northeast).unwrap();
    let features = artifact.schema().encode(&profile);
    assert_abs_diff_eq!(regressor.predict(features.view()).unwrap(), 1234.5);
}
