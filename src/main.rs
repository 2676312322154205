use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

use medinsure::artifact::load_artifact;
use medinsure::ui::routes::{run_server, AppState};

/// Web frontend for the medical insurance cost predictor.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the serialized model artifact.
    #[arg(long, default_value = "resources/model/insurance_forest.json")]
    artifact: PathBuf,

    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // A missing or corrupt artifact is not fatal: the server starts with
    // prediction disabled and reports the reason on every page.
    let state = match load_artifact(&args.artifact) {
        Ok(artifact) => {
            info!(
                "loaded model artifact {} ({} trees, {} columns, {} encoding)",
                args.artifact.display(),
                artifact.forest().n_trees(),
                artifact.schema().len(),
                artifact.schema().scheme().as_str()
            );
            AppState::with_artifact(artifact)
        }
        Err(err) => {
            warn!(
                "failed to load model artifact {}: {}; starting with prediction disabled",
                args.artifact.display(),
                err
            );
            AppState::without_artifact(err.to_string())
        }
    };

    run_server(state, &args.bind).await
}
