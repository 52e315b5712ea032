// [apps/pod/src/lib.rs]
//! Library half of the `pod` binary: everything but the process
//! bootstrap lives here so it can be exercised from tests.

pub mod cache;
pub mod config;
pub mod handlers;
pub mod state;

use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::routing::get;
use axum::Router;
use state::AppState;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span};

/// Builds the pod's axum router: `/files/*rel` and `/healthz`. GET
/// handlers also answer HEAD (axum strips the response body). A
/// [`TraceLayer`] wraps every route so each request gets the one log
/// line per request spec §7 requires, independent of whatever the
/// handler itself logs on the way to a response. The `on_response`
/// callback logs through `tracing::info!` in this crate rather than
/// relying on `tower_http`'s own built-in event, since the default
/// filter quiets `tower_http` to `warn` to keep its connection-level
/// chatter out of the log.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/files/*rel", get(handlers::files_handler))
        .route("/healthz", get(handlers::healthz))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or_else(|| request.uri().path());
                    info_span!("pod_request", method = %request.method(), path)
                })
                .on_response(|response: &Response<_>, latency: Duration, _span: &tracing::Span| {
                    info!(status = %response.status(), latency_ms = latency.as_millis(), "request served");
                }),
        )
        .with_state(state)
}
