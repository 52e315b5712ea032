// [apps/pod/src/main.rs]
use clap::Parser;
use podcache_core_coordination::CoordinationStore;
use podcache_pod_lib::config::Args;
use podcache_pod_lib::state::{AppState, FillLocks};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs_f64()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    podcache_shared_telemetry::init("pod");

    tokio::fs::create_dir_all(&args.cache_dir).await?;

    let store = CoordinationStore::connect(&args.redis_url).await?;
    let state = AppState {
        cache_dir: args.cache_dir.clone().into(),
        origin: args.origin.clone(),
        store,
        pod_id: format!("{}:{}", args.host, args.port),
        http_client: reqwest::Client::new(),
        fill_locks: FillLocks::default(),
    };

    register(&args, &state).await?;
    let heartbeat_handle = spawn_heartbeat(args.clone(), state.clone());

    let router = podcache_pod_lib::router(state.clone());
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;
    info!(pod_id = %state.pod_id, port = args.port, "pod listening");

    let serve = axum::serve(listener, router);
    tokio::select! {
        result = serve => {
            if let Err(error) = result {
                error!(%error, "axum server exited with an error");
            }
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received");
        }
    }

    heartbeat_handle.abort();
    let mut store = state.store.clone();
    if let Err(error) = store.unregister(&state.pod_id).await {
        warn!(%error, "failed to unregister on shutdown");
    }
    info!(pod_id = %state.pod_id, "pod unregistered, exiting");
    Ok(())
}

async fn register(args: &Args, state: &AppState) -> anyhow::Result<()> {
    let descriptor = state.descriptor(&args.host, args.port, args.max_conns, now_secs());
    let mut store = state.store.clone();
    store.heartbeat(&descriptor, now_secs()).await?;
    Ok(())
}

fn spawn_heartbeat(args: Args, state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(
            podcache_core_coordination::prelude::HEARTBEAT_PERIOD_SECS,
        ));
        interval.tick().await; // first tick fires immediately; skip it, we just registered
        loop {
            interval.tick().await;
            let descriptor = state.descriptor(&args.host, args.port, args.max_conns, now_secs());
            let mut store = state.store.clone();
            if let Err(error) = store.heartbeat(&descriptor, now_secs()).await {
                warn!(%error, "heartbeat failed, will retry next tick");
            }
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
