// [apps/worker/src/download.rs]
//! Streaming HTTP download to a destination file, shared by the pod-trial
//! and origin-fallback paths in the scheduler.

use futures_util::StreamExt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("pod is not authorized to hold this path yet")]
    PreheatRequired,
    #[error("http error: {0}")]
    Http(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// GETs `url` into `dest_path`, deleting any partial file on failure.
/// A `425` response is reported as [`DownloadError::PreheatRequired`]
/// without writing anything, matching the pod handler's contract of
/// returning 425 before any body is streamed.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    dest_path: &Path,
    timeout: Duration,
) -> Result<(), DownloadError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| DownloadError::Http(e.to_string()))?;

    if response.status().as_u16() == 425 {
        return Err(DownloadError::PreheatRequired);
    }
    if !response.status().is_success() {
        return Err(DownloadError::Http(format!("status {}", response.status())));
    }

    let result = stream_body(response, dest_path).await;
    if result.is_err() {
        let _ = tokio::fs::remove_file(dest_path).await;
    }
    result
}

async fn stream_body(response: reqwest::Response, dest_path: &Path) -> Result<(), DownloadError> {
    if let Some(parent) = dest_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(dest_path).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::Http(e.to_string()))?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}
