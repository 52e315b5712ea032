// [apps/pod/src/state.rs]
use podcache_core_coordination::CoordinationStore;
use podcache_core_models::descriptor::PodDescriptor;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

/// Per-path mutexes guarding local cache fills, so two concurrent
/// requests for the same logical path on this pod cannot race on the
/// same half-written file (spec §5, "concurrent fills of the same file
/// from one pod must be serialized").
#[derive(Default, Clone)]
pub struct FillLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl FillLocks {
    pub fn lock_for(&self, logical_path: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().expect("fill-lock map poisoned");
        locks
            .entry(logical_path.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

/// Shared, cloneable state handed to every axum handler.
#[derive(Clone)]
pub struct AppState {
    pub cache_dir: PathBuf,
    pub origin: String,
    pub store: CoordinationStore,
    pub pod_id: String,
    pub http_client: reqwest::Client,
    pub fill_locks: FillLocks,
}

impl AppState {
    pub fn descriptor(&self, host: &str, port: u16, max_conns: u32, now: f64) -> PodDescriptor {
        PodDescriptor {
            host: host.to_string(),
            port,
            cache_dir: self.cache_dir.to_string_lossy().to_string(),
            origin: self.origin.clone(),
            max_conns,
            last_seen: now,
        }
    }
}
