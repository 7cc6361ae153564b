pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_positive_number, validate_range, validate_socket_addr, validate_url, Validate,
};
use serde::Serialize;
use std::time::Duration;

pub use cli::CliArgs;
pub use toml_config::FileConfig;

pub const DEFAULT_SDXL_ENDPOINT: &str = "https://fffiloni-sdxl-dpo-2.hf.space/";
pub const DEFAULT_FACESWAP_ENDPOINT: &str = "https://fffiloni-deepfakeai.hf.space/";
pub const DEFAULT_BIND: &str = "127.0.0.1:7860";
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 18;
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Effective settings: command line / environment, then config file, then defaults.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub sdxl_endpoint: String,
    pub faceswap_endpoint: String,
    #[serde(skip_serializing)]
    pub hf_token: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub bind: String,
    pub max_queue_size: usize,
    pub concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self::merge(CliArgs::default(), FileConfig::default())
    }
}

impl Settings {
    pub fn load(args: &CliArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                FileConfig::from_file(path)?
            }
            None => FileConfig::default(),
        };
        Ok(Self::merge(args.clone(), file))
    }

    pub fn merge(args: CliArgs, file: FileConfig) -> Self {
        let FileConfig { remote, server } = file;

        Self {
            sdxl_endpoint: args
                .sdxl_endpoint
                .or(remote.sdxl_endpoint)
                .unwrap_or_else(|| DEFAULT_SDXL_ENDPOINT.to_string()),
            faceswap_endpoint: args
                .faceswap_endpoint
                .or(remote.faceswap_endpoint)
                .unwrap_or_else(|| DEFAULT_FACESWAP_ENDPOINT.to_string()),
            // 空字串視為沒有提供 token
            hf_token: args
                .hf_token
                .filter(|t| !t.is_empty())
                .or(remote.hf_token.filter(|t| !t.is_empty())),
            request_timeout_secs: args.request_timeout_secs.or(remote.request_timeout_secs),
            bind: args
                .bind
                .or(server.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            max_queue_size: args
                .max_queue_size
                .or(server.max_queue_size)
                .unwrap_or(DEFAULT_MAX_QUEUE_SIZE),
            concurrency: args
                .concurrency
                .or(server.concurrency)
                .unwrap_or(DEFAULT_CONCURRENCY),
        }
    }
}

impl ConfigProvider for Settings {
    fn sdxl_endpoint(&self) -> &str {
        &self.sdxl_endpoint
    }

    fn faceswap_endpoint(&self) -> &str {
        &self.faceswap_endpoint
    }

    fn access_token(&self) -> Option<&str> {
        self.hf_token.as_deref()
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("sdxl_endpoint", &self.sdxl_endpoint)?;
        validate_url("faceswap_endpoint", &self.faceswap_endpoint)?;
        validate_socket_addr("bind", &self.bind)?;
        validate_positive_number("concurrency", self.concurrency, 1)?;
        validate_range("max_queue_size", self.max_queue_size, 1, 1000)?;
        if let Some(timeout) = self.request_timeout_secs {
            validate_range("request_timeout_secs", timeout, 1, 3600)?;
        }

        if self.hf_token.is_none() {
            tracing::warn!("⚠️ HF_TOKEN not set, relying on public access to both spaces");
        }
        Ok(())
    }
}
