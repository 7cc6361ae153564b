// Adapters layer: concrete implementations of the domain ports against the remote Gradio spaces.

pub mod faceswap;
pub mod gradio;
pub mod sdxl;

pub use faceswap::FaceSwapClient;
pub use gradio::{GradioClient, Target};
pub use sdxl::SdxlClient;
