// [apps/worker/src/config.rs]
use clap::Parser;

/// Downloads one logical path via the pod fleet, falling back to the
/// origin, verifying its content digest before exiting.
#[derive(Parser, Debug, Clone)]
#[command(name = "worker", version, about)]
pub struct Args {
    /// Logical path to fetch, e.g. `big.pkg` or `packages/a/b/c.whl`.
    #[arg(long)]
    pub path: String,

    /// Directory the file is saved into, under its base name.
    #[arg(long, default_value = "./downloads")]
    pub dest: String,

    /// Base URL of the origin file server, used as the fallback source.
    #[arg(long, env = "WORKER_ORIGIN")]
    pub origin: String,

    /// Coordination store URL.
    #[arg(long, env = "WORKER_REDIS_URL", default_value = "redis://127.0.0.1:6379/0")]
    pub redis_url: String,
}
