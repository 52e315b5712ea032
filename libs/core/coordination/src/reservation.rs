// [libs/core/coordination/src/reservation.rs]
//! Atomic per-pod concurrency reservation, per spec §4.3. Both scripts
//! run as a single Redis command each, so admission and release are
//! race-free regardless of how many workers race against the same pod.

use crate::registry::busy_set_key;
use crate::{CoordinationError, CoordinationStore};

impl CoordinationStore {
    /// Attempts to admit `token` into `pod_id`'s busy semaphore. Returns
    /// `true` if admitted, `false` if the pod is already at `limit`.
    /// On admission, (re)sets the whole-semaphore TTL to `ttl_secs` so a
    /// token leaked by a crashed worker expires in bounded time.
    pub async fn reserve(
        &mut self,
        pod_id: &str,
        limit: u32,
        token: &str,
        ttl_secs: u64,
    ) -> Result<bool, CoordinationError> {
        let admitted: i64 = self
            .reserve_script
            .key(busy_set_key(pod_id))
            .arg(limit)
            .arg(token)
            .arg(ttl_secs)
            .invoke_async(&mut self.conn)
            .await?;
        Ok(admitted == 1)
    }

    /// Releases `token` from `pod_id`'s busy semaphore. Returns the
    /// semaphore's size after removal.
    pub async fn release(&mut self, pod_id: &str, token: &str) -> Result<i64, CoordinationError> {
        let remaining: i64 = self
            .release_script
            .key(busy_set_key(pod_id))
            .arg(token)
            .invoke_async(&mut self.conn)
            .await?;
        Ok(remaining)
    }
}
