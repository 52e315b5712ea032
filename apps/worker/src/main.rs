// [apps/worker/src/main.rs]
use clap::Parser;
use podcache_core_coordination::CoordinationStore;
use podcache_worker_lib::config::Args;
use podcache_worker_lib::{download_logical_path, Outcome};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    podcache_shared_telemetry::init("worker");

    if let Err(error) = tokio::fs::create_dir_all(&args.dest).await {
        error!(%error, "could not create destination directory");
        return ExitCode::from(2);
    }

    let file_name = std::path::Path::new(&args.path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.path.clone());
    let dest_path = PathBuf::from(&args.dest).join(file_name);

    let mut store = match CoordinationStore::connect(&args.redis_url).await {
        Ok(store) => store,
        Err(error) => {
            error!(%error, "could not connect to coordination store");
            return ExitCode::from(2);
        }
    };

    let client = reqwest::Client::new();
    let outcome =
        download_logical_path(&mut store, &client, &args.path, &dest_path, &args.origin).await;

    match outcome {
        Ok(Outcome::Success) => {
            info!(path = %dest_path.display(), "done");
            ExitCode::SUCCESS
        }
        Ok(Outcome::NoSourceAvailable) => {
            error!(logical_path = %args.path, "no pod or origin could serve this path");
            ExitCode::from(2)
        }
        Ok(Outcome::DigestMismatch) => {
            error!(
                logical_path = %args.path,
                path = %dest_path.display(),
                "digest mismatch, file left in place for forensic inspection"
            );
            ExitCode::from(3)
        }
        Err(error) => {
            error!(logical_path = %args.path, %error, "aborting");
            ExitCode::from(2)
        }
    }
}
