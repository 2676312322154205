//! Feature encoding: maps a validated `PatientProfile` onto the fixed-order
//! numeric vector a trained artifact was fitted on.
//!
//! Two incompatible strategies exist and are never mixed inside one schema:
//! ordinal codes (one column per raw field, categories mapped to integer
//! codes) and indicator expansion (one binary column per observed category,
//! re-projected onto the artifact's declared column set). The strategy is
//! derived from the column names the artifact declares, so a schema is bound
//! to exactly one artifact and an ordinal/indicator mismatch cannot be
//! constructed.

use ndarray::Array1;
use std::fmt;

use crate::profile::{PatientProfile, Region, Sex, Smoker};

/// A single column a model artifact may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeatureColumn {
    Age,
    Bmi,
    Children,
    // Ordinal categorical codes.
    SexCode,
    SmokerCode,
    RegionCode,
    // Indicator (one-hot) columns.
    SexMale,
    SexFemale,
    SmokerYes,
    SmokerNo,
    RegionIs(Region),
}

impl FeatureColumn {
    fn parse(name: &str) -> Option<FeatureColumn> {
        match name {
            "age" => Some(FeatureColumn::Age),
            "bmi" => Some(FeatureColumn::Bmi),
            "children" => Some(FeatureColumn::Children),
            "sex" => Some(FeatureColumn::SexCode),
            "smoker" => Some(FeatureColumn::SmokerCode),
            "region" => Some(FeatureColumn::RegionCode),
            "sex_male" => Some(FeatureColumn::SexMale),
            "sex_female" => Some(FeatureColumn::SexFemale),
            "smoker_yes" => Some(FeatureColumn::SmokerYes),
            "smoker_no" => Some(FeatureColumn::SmokerNo),
            "region_southeast" => Some(FeatureColumn::RegionIs(Region::Southeast)),
            "region_southwest" => Some(FeatureColumn::RegionIs(Region::Southwest)),
            "region_northeast" => Some(FeatureColumn::RegionIs(Region::Northeast)),
            "region_northwest" => Some(FeatureColumn::RegionIs(Region::Northwest)),
            _ => None,
        }
    }

    fn is_ordinal_categorical(&self) -> bool {
        matches!(
            self,
            FeatureColumn::SexCode | FeatureColumn::SmokerCode | FeatureColumn::RegionCode
        )
    }

    fn is_indicator(&self) -> bool {
        matches!(
            self,
            FeatureColumn::SexMale
                | FeatureColumn::SexFemale
                | FeatureColumn::SmokerYes
                | FeatureColumn::SmokerNo
                | FeatureColumn::RegionIs(_)
        )
    }

    fn value_for(&self, profile: &PatientProfile) -> f64 {
        fn indicator(set: bool) -> f64 {
            if set {
                1.0
            } else {
                0.0
            }
        }

        match self {
            FeatureColumn::Age => profile.age() as f64,
            FeatureColumn::Bmi => profile.bmi(),
            FeatureColumn::Children => profile.children() as f64,
            // Codes fixed at training time: male=1/female=0, yes=1/no=0,
            // region per Region::ordinal.
            FeatureColumn::SexCode => indicator(profile.sex() == Sex::Male),
            FeatureColumn::SmokerCode => indicator(profile.smoker() == Smoker::Yes),
            FeatureColumn::RegionCode => profile.region().ordinal() as f64,
            FeatureColumn::SexMale => indicator(profile.sex() == Sex::Male),
            FeatureColumn::SexFemale => indicator(profile.sex() == Sex::Female),
            FeatureColumn::SmokerYes => indicator(profile.smoker() == Smoker::Yes),
            FeatureColumn::SmokerNo => indicator(profile.smoker() == Smoker::No),
            FeatureColumn::RegionIs(region) => indicator(profile.region() == *region),
        }
    }
}

/// Which encoding strategy a schema uses. Informational (shown on the model
/// page); the column list itself drives the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingScheme {
    Ordinal,
    Indicator,
}

impl EncodingScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncodingScheme::Ordinal => "ordinal",
            EncodingScheme::Indicator => "indicator",
        }
    }
}

/// The column layout one artifact was fitted on, in the artifact's declared
/// order. Built once at artifact load; every request encodes against it.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    columns: Vec<FeatureColumn>,
    names: Vec<String>,
    scheme: EncodingScheme,
}

impl FeatureSchema {
    /// Derives a schema from the column names an artifact declares. Rejects
    /// unknown names, duplicates, empty lists, and lists mixing ordinal
    /// categorical codes with indicator columns.
    pub fn from_columns(names: &[String]) -> Result<Self, SchemaError> {
        if names.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut columns = Vec::with_capacity(names.len());
        let mut first_ordinal: Option<String> = None;
        let mut first_indicator: Option<String> = None;

        for name in names {
            let column = FeatureColumn::parse(name)
                .ok_or_else(|| SchemaError::UnknownColumn(name.clone()))?;
            if columns.contains(&column) {
                return Err(SchemaError::DuplicateColumn(name.clone()));
            }
            if column.is_ordinal_categorical() && first_ordinal.is_none() {
                first_ordinal = Some(name.clone());
            }
            if column.is_indicator() && first_indicator.is_none() {
                first_indicator = Some(name.clone());
            }
            columns.push(column);
        }

        if let (Some(ordinal), Some(indicator)) = (&first_ordinal, &first_indicator) {
            return Err(SchemaError::MixedSchemes {
                ordinal: ordinal.clone(),
                indicator: indicator.clone(),
            });
        }

        let scheme = if first_indicator.is_some() {
            EncodingScheme::Indicator
        } else {
            EncodingScheme::Ordinal
        };

        Ok(Self {
            columns,
            names: names.to_vec(),
            scheme,
        })
    }

    /// Encodes a profile into the schema's column order. Pure and total: the
    /// profile was validated at construction, every declared column has a
    /// defined value, so this cannot fail and performs no clamping.
    pub fn encode(&self, profile: &PatientProfile) -> Array1<f64> {
        Array1::from_iter(self.columns.iter().map(|c| c.value_for(profile)))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn scheme(&self) -> EncodingScheme {
        self.scheme
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    Empty,
    UnknownColumn(String),
    DuplicateColumn(String),
    MixedSchemes { ordinal: String, indicator: String },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::Empty => write!(f, "artifact declares no feature columns"),
            SchemaError::UnknownColumn(name) => {
                write!(f, "artifact declares unknown feature column '{}'", name)
            }
            SchemaError::DuplicateColumn(name) => {
                write!(f, "artifact declares feature column '{}' more than once", name)
            }
            SchemaError::MixedSchemes { ordinal, indicator } => write!(
                f,
                "artifact mixes ordinal column '{}' with indicator column '{}'; \
                 an artifact must use exactly one encoding strategy",
                ordinal, indicator
            ),
        }
    }
}

impl std::error::Error for SchemaError {}
