// [apps/pod/src/cache.rs]
//! Local cache fill logic for the pod HTTP handler, per spec §4.5.

use crate::state::AppState;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("origin fetch failed: {0}")]
    OriginFetch(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub enum FillOutcome {
    /// The file is present locally (already cached, or just fetched).
    Served,
    /// This pod is not authorized to hold the file; the caller should
    /// answer 425 without touching the origin.
    PreheatRequired,
}

/// Ensures `cache_dir/<rel>` exists, fetching it from the origin if
/// necessary. Gated by this pod's preheat authorization unless the
/// coordination store is unreachable, in which case the pod degrades to
/// serving-and-fetching without the gate (availability over replica
/// bound, per spec §4.5 and §7).
pub async fn ensure_cached(state: &AppState, rel: &str) -> Result<FillOutcome, CacheError> {
    let local_path = state.cache_dir.join(rel);
    if local_path.exists() {
        return Ok(FillOutcome::Served);
    }

    let lock = state.fill_locks.lock_for(rel);
    let _guard = lock.lock().await;

    // Another request may have filled it while we waited for the lock.
    if local_path.exists() {
        return Ok(FillOutcome::Served);
    }

    if let Some(outcome) = check_preheat_authorization(state, rel).await {
        return Ok(outcome);
    }

    fetch_from_origin(state, rel, &local_path).await?;
    Ok(FillOutcome::Served)
}

/// Returns `Some(FillOutcome::PreheatRequired)` if this pod must refuse
/// the fetch, `None` if it may proceed (authorized, no preheat set yet,
/// or the store degraded).
async fn check_preheat_authorization(state: &AppState, rel: &str) -> Option<FillOutcome> {
    let mut store = state.store.clone();
    match store.preheat_set_exists(rel).await {
        Ok(false) => None,
        Ok(true) => match store.is_preheat_member(rel, &state.pod_id).await {
            Ok(true) => None,
            Ok(false) => {
                debug!(pod_id = %state.pod_id, rel, "not a preheat member, refusing fetch");
                Some(FillOutcome::PreheatRequired)
            }
            Err(error) => {
                warn!(%error, "preheat membership check failed, degrading to ungated fetch");
                None
            }
        },
        Err(error) => {
            warn!(%error, "preheat existence check failed, degrading to ungated fetch");
            None
        }
    }
}

async fn fetch_from_origin(state: &AppState, rel: &str, local_path: &Path) -> Result<(), CacheError> {
    if let Some(parent) = local_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let origin_url = format!("{}/{}", state.origin.trim_end_matches('/'), rel);
    let tmp_path = tmp_path_for(local_path);

    info!(rel, origin_url, "fetching from origin");
    let result = stream_to_file(&state.http_client, &origin_url, &tmp_path).await;

    match result {
        Ok(()) => {
            tokio::fs::rename(&tmp_path, local_path).await?;
            info!(rel, "cached from origin");
            Ok(())
        }
        Err(error) => {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            Err(error)
        }
    }
}

async fn stream_to_file(client: &reqwest::Client, url: &str, dest: &Path) -> Result<(), CacheError> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CacheError::OriginFetch(e.to_string()))?;

    if !response.status().is_success() {
        return Err(CacheError::OriginFetch(format!("origin responded {}", response.status())));
    }

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| CacheError::OriginFetch(e.to_string()))?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}

fn tmp_path_for(local_path: &Path) -> PathBuf {
    let mut tmp = local_path.as_os_str().to_owned();
    tmp.push(".part");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmp_path_appends_part_suffix() {
        let tmp = tmp_path_for(Path::new("/cache/big.pkg"));
        assert_eq!(tmp, PathBuf::from("/cache/big.pkg.part"));
    }
}
