// [apps/worker/src/lib.rs]
pub mod config;
pub mod download;
pub mod scheduler;

pub use scheduler::{download_logical_path, Outcome, SchedulerError};
