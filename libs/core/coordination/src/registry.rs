// [libs/core/coordination/src/registry.rs]
//! Pod registry and heartbeat: the sorted set of active pods and the
//! per-pod descriptor hash, per spec §4.1 and §6.

use crate::{CoordinationError, CoordinationStore};
use podcache_core_models::descriptor::PodDescriptor;
use redis::AsyncCommands;

const PODS_ACTIVE_ZSET: &str = "pods:active";

fn pod_hash_key(pod_id: &str) -> String {
    format!("pod:{pod_id}")
}

pub(crate) fn busy_set_key(pod_id: &str) -> String {
    format!("pod:{pod_id}:busy")
}

impl CoordinationStore {
    /// Writes the pod's descriptor and inserts it into `pods:active` with
    /// `score = now`. Called once at startup and again on every heartbeat
    /// tick — the two operations are identical, so there is no separate
    /// `register` vs `heartbeat` entry point.
    pub async fn heartbeat(&mut self, descriptor: &PodDescriptor, now: f64) -> Result<(), CoordinationError> {
        let pod_id = descriptor.pod_id();
        let fields = descriptor.to_fields();
        let mut pipe = redis::pipe();
        pipe.hset_multiple(pod_hash_key(&pod_id), &fields[..]).ignore();
        pipe.zadd(PODS_ACTIVE_ZSET, &pod_id, now).ignore();
        pipe.query_async::<_, ()>(&mut self.conn).await?;
        Ok(())
    }

    /// Removes the pod's active-set entry, descriptor, and busy semaphore.
    /// Called on graceful shutdown, and by workers that observe a dead
    /// descriptor or a failed health probe (spec §4.1, §4.4 step 5).
    pub async fn unregister(&mut self, pod_id: &str) -> Result<(), CoordinationError> {
        let mut pipe = redis::pipe();
        pipe.zrem(PODS_ACTIVE_ZSET, pod_id).ignore();
        pipe.del(pod_hash_key(pod_id)).ignore();
        pipe.del(busy_set_key(pod_id)).ignore();
        pipe.query_async::<_, ()>(&mut self.conn).await?;
        Ok(())
    }

    /// Like [`unregister`](Self::unregister) but for a worker pruning a
    /// ghost or unhealthy pod: the busy semaphore is left untouched since
    /// the worker has no authority to clear another pod's reservations.
    pub async fn prune(&mut self, pod_id: &str) -> Result<(), CoordinationError> {
        let mut pipe = redis::pipe();
        pipe.zrem(PODS_ACTIVE_ZSET, pod_id).ignore();
        pipe.del(pod_hash_key(pod_id)).ignore();
        pipe.query_async::<_, ()>(&mut self.conn).await?;
        Ok(())
    }

    /// All pods whose heartbeat score is within `FRESH_WINDOW_SECS` of
    /// `now`, in no particular order (the replica selector imposes the
    /// order that matters).
    pub async fn fresh_pods(&mut self, now: f64) -> Result<Vec<String>, CoordinationError> {
        let members: Vec<(String, f64)> = self
            .conn
            .zrange_withscores(PODS_ACTIVE_ZSET, 0, -1)
            .await?;
        Ok(members
            .into_iter()
            .filter(|(_, score)| *score >= now - crate::constants::FRESH_WINDOW_SECS)
            .map(|(member, _)| member)
            .collect())
    }

    /// Fetches a pod's descriptor, or `None` if it has none (a ghost
    /// entry left behind by an unclean shutdown).
    pub async fn descriptor(&mut self, pod_id: &str) -> Result<Option<PodDescriptor>, CoordinationError> {
        let fields: std::collections::HashMap<String, String> =
            self.conn.hgetall(pod_hash_key(pod_id)).await?;
        Ok(PodDescriptor::from_fields(&fields)?)
    }
}
