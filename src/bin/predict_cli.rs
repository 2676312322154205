//! One-shot prediction from the command line, against the same artifact the
//! web frontend serves.

use clap::Parser;
use log::debug;
use std::error::Error;
use std::path::PathBuf;

use medinsure::artifact::load_artifact;
use medinsure::common::format_currency;
use medinsure::forest::Regressor;
use medinsure::profile::{PatientProfile, Region, Sex, Smoker};

#[derive(Parser, Debug)]
#[command(version, about = "Predict medical insurance charges for one patient profile")]
struct Args {
    /// Path to the serialized model artifact.
    #[arg(long, default_value = "resources/model/insurance_forest.json")]
    artifact: PathBuf,

    /// Age in years (18..=100).
    #[arg(long)]
    age: u32,

    /// Sex: male or female.
    #[arg(long)]
    sex: String,

    /// Body mass index (10.0..=60.0).
    #[arg(long)]
    bmi: f64,

    /// Number of dependent children (0..=5).
    #[arg(long, default_value_t = 0)]
    children: u32,

    /// Smoker: yes or no.
    #[arg(long)]
    smoker: String,

    /// Region: southeast, southwest, northeast, or northwest.
    #[arg(long)]
    region: String,
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let artifact = load_artifact(&args.artifact)?;

    let sex: Sex = args.sex.parse()?;
    let smoker: Smoker = args.smoker.parse()?;
    let region: Region = args.region.parse()?;
    let profile = PatientProfile::new(args.age, sex, args.bmi, args.children, smoker, region)?;

    let features = artifact.schema().encode(&profile);
    debug!("encoded feature vector: {:?}", features);

    let estimate = artifact.forest().predict(features.view())?;
    println!("Estimated medical insurance cost: ${}", format_currency(estimate));
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Prediction failed: {}", e);
        let mut current_err: Option<&(dyn Error + 'static)> = e.source();
        while let Some(source) = current_err {
            eprintln!("Caused by: {}", source);
            current_err = source.source();
        }
        std::process::exit(1);
    }
}
