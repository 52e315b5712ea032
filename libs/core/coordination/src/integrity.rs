// [libs/core/coordination/src/integrity.rs]
//! Integrity layer: one canonical content digest per logical path, per
//! spec §4.6. Writers set only if absent; readers compare. See
//! SPEC_FULL.md §3 for why this implementation stores SHA-256 under
//! `sha256:<logical_path>` rather than the reference source's MD5 under
//! `md5:<logical_path>`.

use crate::{CoordinationError, CoordinationStore};
use redis::AsyncCommands;
use sha2::{Digest, Sha256};
use std::path::Path;

fn digest_key(logical_path: &str) -> String {
    format!("sha256:{logical_path}")
}

/// Computes the SHA-256 digest of a file on disk, streaming it in
/// 1&nbsp;MiB chunks so a large artifact never needs to be fully
/// resident in memory.
pub fn compute_file_digest(path: &Path) -> std::io::Result<String> {
    use std::io::Read;
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 1024 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

impl CoordinationStore {
    /// The recorded digest for `logical_path`, if any writer has set one.
    pub async fn digest(&mut self, logical_path: &str) -> Result<Option<String>, CoordinationError> {
        Ok(self.conn.get(digest_key(logical_path)).await?)
    }

    /// Records `digest` for `logical_path` only if no digest is recorded
    /// yet. Returns `true` if this call is the one that set it, `false`
    /// if another writer had already recorded one (first writer wins,
    /// per spec's monotonicity invariant — this uses `SET ... NX` rather
    /// than the reference source's plain `SET` so the race is closed
    /// atomically instead of by convention).
    pub async fn set_digest_if_absent(&mut self, logical_path: &str, digest: &str) -> Result<bool, CoordinationError> {
        let set: Option<String> = redis::cmd("SET")
            .arg(digest_key(logical_path))
            .arg(digest)
            .arg("NX")
            .query_async(&mut self.conn)
            .await?;
        Ok(set.is_some())
    }
}
