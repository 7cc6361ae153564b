pub mod examples;
pub mod reporter;
pub mod server;

use crate::adapters::{FaceSwapClient, GradioClient, SdxlClient};
use crate::core::orchestrator::Orchestrator;
use crate::core::ConfigProvider;
use crate::utils::error::Result;

pub type SpaceOrchestrator = Orchestrator<SdxlClient, FaceSwapClient>;

/// 建立兩個遠端客戶端並注入 Orchestrator
pub fn build_orchestrator<C: ConfigProvider>(config: &C) -> Result<SpaceOrchestrator> {
    let token = config.access_token().map(str::to_string);
    let timeout = config.request_timeout();

    let sdxl = GradioClient::new(config.sdxl_endpoint(), token.clone(), timeout)?;
    let faceswap = GradioClient::new(config.faceswap_endpoint(), token, timeout)?;

    tracing::debug!(
        "Remote spaces: sdxl={} faceswap={} (token: {})",
        sdxl.endpoint(),
        faceswap.endpoint(),
        if config.access_token().is_some() { "set" } else { "none" }
    );

    Ok(Orchestrator::new(
        SdxlClient::new(sdxl),
        FaceSwapClient::new(faceswap),
    ))
}
