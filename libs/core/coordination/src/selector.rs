// [libs/core/coordination/src/selector.rs]
//! Consistent-hash replica selection and bounded-K preheat election, per
//! spec §4.2.

use crate::constants::{PREHEAT_K, PREHEAT_LOCK_TTL_SECS, PREHEAT_TTL_SECS};
use crate::{CoordinationError, CoordinationStore};
use md5::{Digest, Md5};
use redis::AsyncCommands;

/// First 16 hex characters of `MD5(logical_path)`, used as the routing
/// key for a logical path's preheat set (`preheat:<hex16>`). This is a
/// routing hash, not a content digest — collisions only cost an extra
/// pod hop, never an integrity failure — so MD5 truncated to 64 bits is
/// fine here even though §3 moves the content digest to SHA-256.
pub fn path_key_hash16(logical_path: &str) -> String {
    let digest = Md5::digest(logical_path.as_bytes());
    hex::encode(digest)[..16].to_string()
}

fn preheat_set_key(logical_path: &str) -> String {
    format!("preheat:{}", path_key_hash16(logical_path))
}

fn preheat_lock_key(logical_path: &str) -> String {
    format!("preheat:{}:lock", path_key_hash16(logical_path))
}

/// Orders `pods` by `hex(MD5(logical_path | pod_id))`, ascending. This is
/// the total order used both for worker pod-trial order and for electing
/// the preheat set's head K — the same fixed hash run against the same
/// fleet snapshot always yields the same permutation.
pub fn ring_order(logical_path: &str, mut pods: Vec<String>) -> Vec<String> {
    pods.sort_by_cached_key(|pod_id| {
        let digest = Md5::digest(format!("{logical_path}|{pod_id}").as_bytes());
        hex::encode(digest)
    });
    pods
}

impl CoordinationStore {
    /// Current preheat set members for `logical_path`, without electing
    /// one if none exists.
    pub async fn preheat_members(&mut self, logical_path: &str) -> Result<Vec<String>, CoordinationError> {
        Ok(self.conn.smembers(preheat_set_key(logical_path)).await?)
    }

    /// Whether a preheat set has been established for `logical_path` at
    /// all (distinct from it existing-but-empty, which cannot happen
    /// once created since election always inserts at least one member).
    pub async fn preheat_set_exists(&mut self, logical_path: &str) -> Result<bool, CoordinationError> {
        Ok(self.conn.exists(preheat_set_key(logical_path)).await?)
    }

    pub async fn is_preheat_member(&mut self, logical_path: &str, pod_id: &str) -> Result<bool, CoordinationError> {
        Ok(self.conn.sismember(preheat_set_key(logical_path), pod_id).await?)
    }

    /// Elects the preheat set for `logical_path` if it does not already
    /// have `PREHEAT_K` members, serialized by `preheat:<hash>:lock`:
    ///
    /// 1. If the set already has ≥ K members, return it as-is.
    /// 2. Try to acquire the lock (`SET NX EX`). If another worker holds
    ///    it, return whatever the set currently contains.
    /// 3. Re-check under the lock; if still short, insert the head K of
    ///    `ordered_pods` and attach the sliding TTL.
    /// 4. Release the lock and return the (possibly still short) set.
    pub async fn ensure_preheat_set(
        &mut self,
        logical_path: &str,
        ordered_pods: &[String],
    ) -> Result<Vec<String>, CoordinationError> {
        let set_key = preheat_set_key(logical_path);

        let size: usize = self.conn.scard(&set_key).await?;
        if size >= PREHEAT_K {
            return Ok(self.conn.smembers(&set_key).await?);
        }

        let lock_key = preheat_lock_key(logical_path);
        let acquired: bool = redis::cmd("SET")
            .arg(&lock_key)
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(PREHEAT_LOCK_TTL_SECS)
            .query_async::<_, Option<String>>(&mut self.conn)
            .await?
            .is_some();

        if acquired {
            let size_under_lock: usize = self.conn.scard(&set_key).await?;
            if size_under_lock < PREHEAT_K && !ordered_pods.is_empty() {
                let targets: Vec<&String> = ordered_pods.iter().take(PREHEAT_K).collect();
                let _: () = self.conn.sadd(&set_key, &targets).await?;
                let _: () = self.conn.expire(&set_key, PREHEAT_TTL_SECS as i64).await?;
            }
            let _: () = self.conn.del(&lock_key).await?;
        }

        Ok(self.conn.smembers(&set_key).await?)
    }
}
