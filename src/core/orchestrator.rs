use crate::core::{
    FaceSwapRequest, FaceSwapper, ImageGenerator, ImageRef, ProcessingOptions, ProgressReporter,
    RequestId, Stage,
};
use crate::utils::error::{AppError, Result};

pub const GENERATING_MESSAGE: &str = "Generating SDXL image first ...";
pub const SWAPPING_MESSAGE: &str = "Face swap your face on result ...";

/// Removes the backslashes the remote side adds when it re-quotes its message.
pub fn sanitize_remote_message(message: &str) -> String {
    message.replace('\\', "")
}

/// Chains text-to-image generation and face swapping for one user request.
pub struct Orchestrator<G: ImageGenerator, F: FaceSwapper> {
    generator: G,
    swapper: F,
}

impl<G: ImageGenerator, F: FaceSwapper> Orchestrator<G, F> {
    pub fn new(generator: G, swapper: F) -> Self {
        Self { generator, swapper }
    }

    pub async fn infer(
        &self,
        portrait: &str,
        prompt: &str,
        reporter: &dyn ProgressReporter,
    ) -> Result<ImageRef> {
        let mut stage = Stage::GeneratingImage;
        reporter.notify_progress(GENERATING_MESSAGE);

        tracing::info!("🆕 NEW USER REQUEST FOR: {}", prompt);
        tracing::debug!(%stage, %portrait, "Requesting generated image");

        let generated = match self.generator.generate(prompt).await {
            Ok(image) => image,
            Err(AppError::RemoteValidation { message }) => {
                stage = Stage::Failed;
                let cleaned = sanitize_remote_message(&message);
                tracing::warn!(%stage, "❌ An error occurred: {}", cleaned);
                return Err(reporter.fail_request(cleaned));
            }
            Err(e) => return Err(e),
        };

        let request_id = RequestId::new();
        stage = Stage::SwappingFace;
        tracing::debug!(%stage, %request_id, "Image generated, starting face swap");
        reporter.notify_progress(SWAPPING_MESSAGE);

        let result = self
            .swapper
            .swap(FaceSwapRequest {
                portrait: portrait.to_string(),
                target: generated,
                request_id,
                options: ProcessingOptions::fixed(),
            })
            .await?;

        stage = Stage::Done;
        tracing::debug!(%stage, %request_id, "Face swap finished");
        Ok(result)
    }
}
