use clap::Parser;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Serves the task dataset as JSON and protobuf and benchmarks both.
#[derive(Debug, Clone, Parser)]
#[command(name = "wire-bench", version, about)]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 5233)]
    pub port: u16,

    /// Base URL the benchmark fetches from [default: this server]
    #[arg(long, env = "BENCH_TARGET")]
    pub target: Option<String>,

    /// Iterations per run; each iteration fetches both encodings
    #[arg(long, env = "BENCH_RUNS", default_value_t = 10_000)]
    pub runs: u32,

    /// Per-request timeout
    #[arg(long, env = "BENCH_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Directory with the dashboard assets
    #[arg(long, env = "BENCH_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Start a run as soon as the server is up
    #[arg(long, env = "BENCH_AUTOSTART")]
    pub autostart: bool,
}

/// Upper bound accepted for `runs`, from the CLI or the start endpoint.
pub const MAX_RUNS: u32 = 100_000;

impl Config {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    pub fn target_url(&self) -> String {
        self.target
            .clone()
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", self.port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Rejects values the server would refuse at runtime anyway.
    pub fn validate(&self) -> Result<(), String> {
        validate_runs(self.runs)?;
        if self.request_timeout_secs == 0 {
            return Err("request timeout must be at least 1 second".into());
        }
        Ok(())
    }
}

pub fn validate_runs(runs: u32) -> Result<(), String> {
    if runs == 0 || runs > MAX_RUNS {
        return Err(format!("runs must be between 1 and {MAX_RUNS}"));
    }
    Ok(())
}
