// [libs/core/coordination/src/lib.rs]
//! The coordination store: a thin, fully-atomic layer over Redis that the
//! pod and worker binaries share.
//!
//! [`CoordinationStore`] owns one `redis` `ConnectionManager` (which
//! reconnects transparently) plus the two Lua scripts used for
//! concurrency reservation. Its methods are grouped by concern across
//! `registry`, `selector`, `reservation`, and `integrity`, each an `impl
//! CoordinationStore` block in its own module — every method still goes
//! through the one connection, so there is exactly one notion of "the
//! store" for callers to hold.

pub mod constants;
pub mod errors;
pub mod integrity;
pub mod registry;
pub mod reservation;
pub mod selector;

pub use errors::CoordinationError;

use redis::aio::ConnectionManager;
use redis::Script;

const RESERVE_LUA: &str = r#"
local n = redis.call('SCARD', KEYS[1])
if n < tonumber(ARGV[1]) then
  redis.call('SADD', KEYS[1], ARGV[2])
  if tonumber(ARGV[3]) > 0 then
    redis.call('EXPIRE', KEYS[1], tonumber(ARGV[3]))
  end
  return 1
else
  return 0
end
"#;

const RELEASE_LUA: &str = r#"
redis.call('SREM', KEYS[1], ARGV[1])
return redis.call('SCARD', KEYS[1])
"#;

/// Handle to the shared Redis coordination store.
///
/// Cheap to clone: `ConnectionManager` is itself a handle around a
/// multiplexed connection that reconnects on failure, and `Script` only
/// holds the script body plus its cached SHA.
#[derive(Clone)]
pub struct CoordinationStore {
    pub(crate) conn: ConnectionManager,
    pub(crate) reserve_script: Script,
    pub(crate) release_script: Script,
}

impl CoordinationStore {
    /// Connects to the Redis instance at `redis_url`.
    pub async fn connect(redis_url: &str) -> Result<Self, CoordinationError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            reserve_script: Script::new(RESERVE_LUA),
            release_script: Script::new(RELEASE_LUA),
        })
    }
}

pub mod prelude {
    pub use crate::constants::*;
    pub use crate::errors::CoordinationError;
    pub use crate::CoordinationStore;
}
