use clap::Args;
use std::path::PathBuf;

/// Flags shared by the server and the one-shot binary.
#[derive(Debug, Clone, Default, Args)]
pub struct CliArgs {
    /// Path to an optional TOML configuration file
    #[arg(short, long, env = "FACESWAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Text-to-image space URL
    #[arg(long, env = "SDXL_SPACE_URL")]
    pub sdxl_endpoint: Option<String>,

    /// Face-swap space URL
    #[arg(long, env = "FACESWAP_SPACE_URL")]
    pub faceswap_endpoint: Option<String>,

    /// Access token forwarded to both spaces
    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    pub hf_token: Option<String>,

    /// Per-call timeout for remote requests, in seconds (no timeout when unset)
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Address the HTTP server binds to
    #[arg(long)]
    pub bind: Option<String>,

    /// Maximum number of requests waiting for a worker
    #[arg(long)]
    pub max_queue_size: Option<usize>,

    /// Number of orchestrations running at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}
