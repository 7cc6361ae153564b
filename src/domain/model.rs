use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 遠端服務回傳的圖片：純字串 (路徑或 URL) 或 Gradio 的檔案物件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Reference(String),
    File(FileData),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ImageRef {
    /// Prefers the URL over the server-side path for file objects.
    pub fn locator(&self) -> Option<&str> {
        match self {
            ImageRef::Reference(s) => Some(s.as_str()),
            ImageRef::File(file) => file.url.as_deref().or(file.path.as_deref()),
        }
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        ImageRef::Reference(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameProcessor {
    FaceSwapper,
    FaceEnhancer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaceAnalyserDirection {
    LeftRight,
    RightLeft,
    TopBottom,
    BottomTop,
    SmallLarge,
    LargeSmall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceRecognition {
    None,
    Reference,
    Many,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceAnalyserGender {
    None,
    Male,
    Female,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingOptions {
    pub frame_processors: Vec<FrameProcessor>,
    pub face_analyser_direction: FaceAnalyserDirection,
    pub face_recognition: FaceRecognition,
    pub face_analyser_gender: FaceAnalyserGender,
}

impl ProcessingOptions {
    /// 每次換臉都送出相同的設定
    pub fn fixed() -> Self {
        Self {
            frame_processors: vec![FrameProcessor::FaceSwapper, FrameProcessor::FaceEnhancer],
            face_analyser_direction: FaceAnalyserDirection::LeftRight,
            face_recognition: FaceRecognition::None,
            face_analyser_gender: FaceAnalyserGender::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaceSwapRequest {
    pub portrait: String,
    pub target: ImageRef,
    pub request_id: RequestId,
    pub options: ProcessingOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    GeneratingImage,
    SwappingFace,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::GeneratingImage => "generating_image",
            Stage::SwappingFace => "swapping_face",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}
