// [apps/pod/src/config.rs]
use clap::Parser;

/// Pod cache node: serves `/files/<rel>` from a local cache directory,
/// pulling misses from `origin` when its replica authorization allows.
#[derive(Parser, Debug, Clone)]
#[command(name = "pod", version, about)]
pub struct Args {
    /// Host this pod advertises itself under (its half of the `host:port`
    /// pod identity). Not necessarily the bind address.
    #[arg(long, env = "POD_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// TCP port to listen on.
    #[arg(long, env = "POD_PORT")]
    pub port: u16,

    /// Local directory this pod caches files into.
    #[arg(long, env = "POD_CACHE_DIR")]
    pub cache_dir: String,

    /// Base URL of the origin file server, e.g. `http://127.0.0.1:8000`.
    #[arg(long, env = "POD_ORIGIN")]
    pub origin: String,

    /// Coordination store URL.
    #[arg(long, env = "POD_REDIS_URL", default_value = "redis://127.0.0.1:6379/0")]
    pub redis_url: String,

    /// Maximum concurrent reservations workers may hold against this pod.
    #[arg(long, env = "POD_MAX_CONNS", default_value_t = 2)]
    pub max_conns: u32,
}
