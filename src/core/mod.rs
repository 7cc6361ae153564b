pub mod orchestrator;
pub mod queue;

pub use crate::domain::model::{
    FaceSwapRequest, ImageRef, ProcessingOptions, RequestId, Stage,
};
pub use crate::domain::ports::{ConfigProvider, FaceSwapper, ImageGenerator, ProgressReporter};
pub use crate::utils::error::Result;
