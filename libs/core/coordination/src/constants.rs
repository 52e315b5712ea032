// [libs/core/coordination/src/constants.rs]

/// How long a pod's last heartbeat may age before a worker stops
/// considering it fresh.
pub const FRESH_WINDOW_SECS: f64 = 15.0;

/// How often a live pod rewrites its heartbeat score and descriptor.
pub const HEARTBEAT_PERIOD_SECS: u64 = 5;

/// Whole-key TTL on a pod's busy semaphore, reset on every admission.
/// Bounds how long a crashed worker's leaked token can survive.
pub const RESERVE_TTL_SECS: u64 = 60;

/// Number of pods authorized to hold a given logical path.
pub const PREHEAT_K: usize = 2;

/// Sliding TTL on a logical path's preheat set.
pub const PREHEAT_TTL_SECS: u64 = 300;

/// TTL on the short-lived exclusive lock guarding preheat election.
pub const PREHEAT_LOCK_TTL_SECS: u64 = 10;
