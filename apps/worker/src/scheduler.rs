// [apps/worker/src/scheduler.rs]
//! The worker's single entry point: download one logical path, per
//! spec §4.4 steps 1-8.
//!
//! Coordination-store errors always abort the run (spec §7: "store
//! unreachable (worker) — abort with non-zero exit, no silent
//! fallback"), propagated via `?` as [`SchedulerError`]. A failure to
//! compute the downloaded file's digest aborts the same way: spec §4.4
//! step 8 requires verification before declaring success, so a file that
//! cannot even be hashed is a hard failure, not a silent success.
//! Everything else the algorithm names — an unhealthy pod, a pod at
//! capacity, a 425, a failed fetch — is a normal branch of the loop, not
//! an error.

use crate::download::{self, DownloadError};
use podcache_core_coordination::prelude::*;
use podcache_core_coordination::selector::ring_order;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub enum Outcome {
    Success,
    NoSourceAvailable,
    DigestMismatch,
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("coordination store unreachable: {0}")]
    Store(#[from] CoordinationError),

    #[error("could not verify downloaded file: {0}")]
    DigestCompute(#[from] std::io::Error),
}

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const POD_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const ORIGIN_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs_f64()
}

/// Downloads `logical_path` to `dest_path`: tries the pod fleet first,
/// falls back to `origin`, then verifies the content digest.
pub async fn download_logical_path(
    store: &mut CoordinationStore,
    client: &reqwest::Client,
    logical_path: &str,
    dest_path: &Path,
    origin: &str,
) -> Result<Outcome, SchedulerError> {
    let served = try_via_pods(store, client, logical_path, dest_path).await?;

    if !served {
        let origin_url = format!("{}/{}", origin.trim_end_matches('/'), logical_path);
        info!(logical_path, origin_url, "falling back to origin");
        if let Err(error) = download::fetch(client, &origin_url, dest_path, ORIGIN_FETCH_TIMEOUT).await {
            warn!(logical_path, %error, "origin fallback failed");
            return Ok(Outcome::NoSourceAvailable);
        }
        info!(logical_path, "fetched from origin");
    }

    verify_digest(store, logical_path, dest_path).await
}

async fn try_via_pods(
    store: &mut CoordinationStore,
    client: &reqwest::Client,
    logical_path: &str,
    dest_path: &Path,
) -> Result<bool, SchedulerError> {
    let now = now_secs();
    let fresh = store.fresh_pods(now).await?;
    if fresh.is_empty() {
        info!(logical_path, "no fresh pods available");
        return Ok(false);
    }

    let ordered = ring_order(logical_path, fresh);
    store.ensure_preheat_set(logical_path, &ordered).await?;

    for pod_id in &ordered {
        if try_one_pod(store, client, logical_path, dest_path, pod_id).await? {
            info!(logical_path, pod_id, "served");
            return Ok(true);
        }
    }
    Ok(false)
}

async fn try_one_pod(
    store: &mut CoordinationStore,
    client: &reqwest::Client,
    logical_path: &str,
    dest_path: &Path,
    pod_id: &str,
) -> Result<bool, SchedulerError> {
    let descriptor = match store.descriptor(pod_id).await? {
        Some(descriptor) => descriptor,
        None => {
            info!(pod_id, "ghost descriptor, pruning");
            store.prune(pod_id).await?;
            return Ok(false);
        }
    };

    let health_url = format!("{}/healthz", descriptor.base_url());
    if !probe_health(client, &health_url).await {
        info!(pod_id, "unhealthy-pruned");
        store.prune(pod_id).await?;
        return Ok(false);
    }
    info!(pod_id, "healthy");

    let token = format!("worker:{}", Uuid::new_v4());
    let reserved = store
        .reserve(pod_id, descriptor.max_conns, &token, RESERVE_TTL_SECS)
        .await?;
    if !reserved {
        info!(pod_id, "at-capacity");
        return Ok(false);
    }

    let url = format!("{}/files/{}", descriptor.base_url(), logical_path);
    let result = download::fetch(client, &url, dest_path, POD_DOWNLOAD_TIMEOUT).await;
    store.release(pod_id, &token).await?;

    match result {
        Ok(()) => Ok(true),
        Err(DownloadError::PreheatRequired) => {
            info!(pod_id, "preheat-required");
            Ok(false)
        }
        Err(error) => {
            info!(pod_id, %error, "fetch-failed");
            Ok(false)
        }
    }
}

async fn probe_health(client: &reqwest::Client, url: &str) -> bool {
    match client.head(url).timeout(HEALTH_PROBE_TIMEOUT).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

/// Step 8: compute the local file's digest, and either record it (first
/// writer wins) or compare it against the recorded one. A failure to even
/// compute the digest (the "downloaded" file missing or unreadable) is a
/// hard failure, not a reported success: the integrity contract requires
/// verification before declaring success, so this propagates rather than
/// silently treating a broken download as one that succeeded.
async fn verify_digest(
    store: &mut CoordinationStore,
    logical_path: &str,
    dest_path: &Path,
) -> Result<Outcome, SchedulerError> {
    let computed = match podcache_core_coordination::integrity::compute_file_digest(dest_path) {
        Ok(digest) => digest,
        Err(error) => {
            warn!(logical_path, %error, "could not compute digest of downloaded file");
            return Err(SchedulerError::DigestCompute(error));
        }
    };

    match store.digest(logical_path).await? {
        None => {
            if store.set_digest_if_absent(logical_path, &computed).await? {
                info!(logical_path, digest = %computed, "digest set");
            } else {
                info!(logical_path, digest = %computed, "digest set concurrently by another worker");
            }
            Ok(Outcome::Success)
        }
        Some(known) if known == computed => {
            info!(logical_path, digest = %computed, "digest ok");
            Ok(Outcome::Success)
        }
        Some(known) => {
            warn!(logical_path, expected = %known, got = %computed, "digest mismatch");
            Ok(Outcome::DigestMismatch)
        }
    }
}
