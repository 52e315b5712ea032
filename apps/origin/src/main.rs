// [apps/origin/src/main.rs]
//! Plain static file server standing in for the origin described in
//! spec.md §2 as an external collaborator. Recovered as a real binary
//! from `original_source/pod_cache/origin_server.py`, which ships this
//! server as part of the same codebase rather than a genuinely separate
//! system.

use clap::Parser;
use tower_http::services::ServeDir;
use tracing::info;

/// Serves `--root` read-only over HTTP. No auth, no range requests
/// beyond what `tower-http` gives for free — this is a dev/test fixture,
/// not a production file store.
#[derive(Parser, Debug)]
#[command(name = "origin", version, about)]
struct Args {
    #[arg(long, default_value_t = 8000)]
    port: u16,

    #[arg(long, default_value = "./origin_data")]
    root: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    podcache_shared_telemetry::init("origin");

    tokio::fs::create_dir_all(&args.root).await?;
    let root = std::fs::canonicalize(&args.root)?;

    let app = axum::Router::new().fallback_service(ServeDir::new(&root));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;
    info!(root = %root.display(), port = args.port, "origin serving");
    axum::serve(listener, app).await?;
    Ok(())
}
