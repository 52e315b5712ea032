// [libs/shared/telemetry/src/lib.rs]
//! Structured logging bootstrap shared by the pod, worker, and origin
//! binaries: a single [`init`] call wires up an [`EnvFilter`] and a
//! `tracing-subscriber` formatting layer, picking a human-readable layout
//! in debug builds and flattened JSON otherwise.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global `tracing` subscriber for `service_name`.
///
/// `RUST_LOG` overrides the default filter, which otherwise runs the
/// whole workspace at `debug` (debug builds) or `info` (release builds)
/// and quiets the HTTP and Redis transport crates to `warn`. The default
/// is a bare level directive rather than one scoped to `service_name`'s
/// own crate: a binary's tracing calls and its library crate's (e.g.
/// `pod` vs `podcache_pod_lib`) live under different targets, and a
/// directive naming only the former would silently drop everything the
/// latter emits.
///
/// # Panics
/// Panics if a global subscriber has already been installed.
pub fn init(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if cfg!(debug_assertions) { "debug" } else { "info" };
        format!("{level},tower_http=warn,hyper=warn,redis=warn").into()
    });

    if cfg!(debug_assertions) {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().flatten_event(true))
            .init();
    }

    tracing::info!(service_name, "telemetry initialized");
}
