use crate::domain::model::{FaceSwapRequest, ImageRef};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use std::time::Duration;

pub trait ConfigProvider: Send + Sync {
    fn sdxl_endpoint(&self) -> &str;
    fn faceswap_endpoint(&self) -> &str;
    fn access_token(&self) -> Option<&str>;
    fn request_timeout(&self) -> Option<Duration>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<ImageRef>;
}

#[async_trait]
pub trait FaceSwapper: Send + Sync {
    async fn swap(&self, request: FaceSwapRequest) -> Result<ImageRef>;
}

pub trait ProgressReporter: Send + Sync {
    fn notify_progress(&self, message: &str);

    /// 回傳讓整個請求終止的錯誤
    fn fail_request(&self, message: String) -> AppError {
        AppError::UserFacing { message }
    }
}
