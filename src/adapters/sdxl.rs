use crate::adapters::gradio::{GradioClient, Target};
use crate::domain::model::ImageRef;
use crate::domain::ports::ImageGenerator;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

pub const SDXL_API_NAME: &str = "/infer";

/// Text-to-image space (SDXL DPO).
#[derive(Debug, Clone)]
pub struct SdxlClient {
    remote: GradioClient,
    target: Target,
}

impl SdxlClient {
    pub fn new(remote: GradioClient) -> Self {
        Self {
            remote,
            target: Target::ApiName(SDXL_API_NAME.to_string()),
        }
    }
}

#[async_trait]
impl ImageGenerator for SdxlClient {
    async fn generate(&self, prompt: &str) -> Result<ImageRef> {
        let data = self
            .remote
            .predict(&self.target, vec![Value::String(prompt.to_string())])
            .await?;
        // 回傳的是 space 內部路徑，換成可下載的 URL 才能交給下一個服務
        let image = self.remote.decode_image(data)?;

        tracing::debug!("Generated image: {:?}", image.locator());
        Ok(image)
    }
}
