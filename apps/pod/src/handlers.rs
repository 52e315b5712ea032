// [apps/pod/src/handlers.rs]
//! HTTP surface: `/files/*rel` and `/healthz`. GET and HEAD share a
//! handler (axum strips the body for HEAD automatically), matching the
//! status contract in spec §4.5/§6.

use crate::cache::{self, CacheError, FillOutcome};
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use podcache_core_models::is_safe_logical_path;
use serde_json::json;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::warn;

pub async fn files_handler(State(state): State<AppState>, Path(rel): Path<String>) -> Response {
    if !is_safe_logical_path(&rel) {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "bad path"}))).into_response();
    }

    match cache::ensure_cached(&state, &rel).await {
        Ok(FillOutcome::PreheatRequired) => (
            StatusCode::TOO_EARLY,
            [(header::HeaderName::from_static("x-preheat-needed"), "1")],
            Json(json!({"error": "preheat required"})),
        )
            .into_response(),
        Ok(FillOutcome::Served) => serve_local_file(&state, &rel).await,
        Err(CacheError::OriginFetch(reason)) => {
            warn!(rel, reason, "origin fetch failed");
            (StatusCode::BAD_GATEWAY, Json(json!({"error": "origin fetch failed"}))).into_response()
        }
        Err(CacheError::Io(error)) => {
            warn!(rel, %error, "local cache io error");
            (StatusCode::BAD_GATEWAY, Json(json!({"error": "cache io error"}))).into_response()
        }
    }
}

async fn serve_local_file(state: &AppState, rel: &str) -> Response {
    let local_path = state.cache_dir.join(rel);
    let request = Request::builder()
        .method(Method::GET)
        .uri("/")
        .body(Body::empty())
        .expect("static request is well-formed");

    match ServeFile::new(local_path).oneshot(request).await {
        Ok(response) => response.map(Body::new).into_response(),
        Err(error) => {
            warn!(rel, %error, "serve_file failed after a successful cache fill");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn healthz() -> impl IntoResponse {
    Json(json!({"ok": true}))
}
