use crate::adapters::gradio::{GradioClient, Target};
use crate::domain::model::{FaceSwapRequest, FileData, ImageRef};
use crate::domain::ports::FaceSwapper;
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use serde_json::Value;

pub const FACESWAP_FN_INDEX: usize = 1;

/// Face-swap space (DeepFakeAI).
#[derive(Debug, Clone)]
pub struct FaceSwapClient {
    remote: GradioClient,
    target: Target,
}

impl FaceSwapClient {
    pub fn new(remote: GradioClient) -> Self {
        Self {
            remote,
            target: Target::FnIndex(FACESWAP_FN_INDEX),
        }
    }
}

/// 依遠端介面的參數順序排列，兩張圖都必須是已上傳到這個 space 的檔案物件
pub(crate) fn positional_args(
    portrait: &FileData,
    target: &FileData,
    request: &FaceSwapRequest,
) -> Result<Vec<Value>> {
    let options = &request.options;
    Ok(vec![
        serde_json::to_value(portrait)?,
        serde_json::to_value(target)?,
        Value::String(request.request_id.to_string()),
        serde_json::to_value(&options.frame_processors)?,
        serde_json::to_value(options.face_analyser_direction)?,
        serde_json::to_value(options.face_recognition)?,
        serde_json::to_value(options.face_analyser_gender)?,
    ])
}

#[async_trait]
impl FaceSwapper for FaceSwapClient {
    async fn swap(&self, request: FaceSwapRequest) -> Result<ImageRef> {
        let target_locator = request
            .target
            .locator()
            .ok_or_else(|| AppError::MalformedResponse {
                message: "generated image has neither url nor path".to_string(),
            })?;

        // 先上傳肖像，再上傳生成的圖片
        let portrait = self.remote.prepare_file(&request.portrait).await?;
        let target = self.remote.prepare_file(target_locator).await?;
        let args = positional_args(&portrait, &target, &request)?;

        tracing::debug!("Face swap request {}", request.request_id);
        let data = self.remote.predict(&self.target, args).await?;
        self.remote.decode_image(data)
    }
}
