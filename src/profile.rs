use std::fmt;
use std::str::FromStr;

/// Inclusive age range accepted by the form layer.
pub const AGE_MIN: u32 = 18;
pub const AGE_MAX: u32 = 100;
/// Inclusive BMI range accepted by the form layer.
pub const BMI_MIN: f64 = 10.0;
pub const BMI_MAX: f64 = 60.0;
/// Maximum number of dependent children.
pub const CHILDREN_MAX: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl FromStr for Sex {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            _ => Err(ProfileError::UnknownCategory {
                field: "sex",
                value: s.to_string(),
                allowed: "male, female",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Smoker {
    Yes,
    No,
}

impl Smoker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Smoker::Yes => "yes",
            Smoker::No => "no",
        }
    }
}

impl FromStr for Smoker {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yes" => Ok(Smoker::Yes),
            "no" => Ok(Smoker::No),
            _ => Err(ProfileError::UnknownCategory {
                field: "smoker",
                value: s.to_string(),
                allowed: "yes, no",
            }),
        }
    }
}

/// Residential region. The ordinal codes follow the order the training
/// pipeline used when fitting the ordinal-encoded artifact: southeast=0,
/// southwest=1, northeast=2, northwest=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Southeast,
    Southwest,
    Northeast,
    Northwest,
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::Southeast,
        Region::Southwest,
        Region::Northeast,
        Region::Northwest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Southeast => "southeast",
            Region::Southwest => "southwest",
            Region::Northeast => "northeast",
            Region::Northwest => "northwest",
        }
    }

    pub fn ordinal(&self) -> u32 {
        match self {
            Region::Southeast => 0,
            Region::Southwest => 1,
            Region::Northeast => 2,
            Region::Northwest => 3,
        }
    }
}

impl FromStr for Region {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "southeast" => Ok(Region::Southeast),
            "southwest" => Ok(Region::Southwest),
            "northeast" => Ok(Region::Northeast),
            "northwest" => Ok(Region::Northwest),
            _ => Err(ProfileError::UnknownCategory {
                field: "region",
                value: s.to_string(),
                allowed: "southeast, southwest, northeast, northwest",
            }),
        }
    }
}

/// One patient record as entered in the form. Construction validates every
/// field, so any `PatientProfile` handed to the encoder is already inside the
/// supported domain and the encoder never has to re-check it.
///
/// A profile lives for the duration of one request and is never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientProfile {
    age: u32,
    sex: Sex,
    bmi: f64,
    children: u32,
    smoker: Smoker,
    region: Region,
}

impl PatientProfile {
    pub fn new(
        age: u32,
        sex: Sex,
        bmi: f64,
        children: u32,
        smoker: Smoker,
        region: Region,
    ) -> Result<Self, ProfileError> {
        if !(AGE_MIN..=AGE_MAX).contains(&age) {
            return Err(ProfileError::AgeOutOfRange(age));
        }
        if !bmi.is_finite() || !(BMI_MIN..=BMI_MAX).contains(&bmi) {
            return Err(ProfileError::BmiOutOfRange(bmi));
        }
        if children > CHILDREN_MAX {
            return Err(ProfileError::TooManyChildren(children));
        }
        Ok(Self {
            age,
            sex,
            bmi,
            children,
            smoker,
            region,
        })
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn bmi(&self) -> f64 {
        self.bmi
    }

    pub fn children(&self) -> u32 {
        self.children
    }

    pub fn smoker(&self) -> Smoker {
        self.smoker
    }

    pub fn region(&self) -> Region {
        self.region
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileError {
    AgeOutOfRange(u32),
    BmiOutOfRange(f64),
    TooManyChildren(u32),
    UnknownCategory {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::AgeOutOfRange(age) => {
                write!(f, "age {} is outside the supported range {}..={}", age, AGE_MIN, AGE_MAX)
            }
            ProfileError::BmiOutOfRange(bmi) => {
                write!(f, "BMI {} is outside the supported range {}..={}", bmi, BMI_MIN, BMI_MAX)
            }
            ProfileError::TooManyChildren(n) => {
                write!(f, "number of children {} exceeds the supported maximum of {}", n, CHILDREN_MAX)
            }
            ProfileError::UnknownCategory { field, value, allowed } => {
                write!(f, "unknown {} value '{}' (expected one of: {})", field, value, allowed)
            }
        }
    }
}

impl std::error::Error for ProfileError {}
