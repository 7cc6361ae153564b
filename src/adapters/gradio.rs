use crate::domain::model::{FileData, ImageRef};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::validate_url;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Which function of a space to call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    ApiName(String),
    FnIndex(usize),
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    data: &'a [Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    fn_index: Option<usize>,
}

pub(crate) fn is_remote_url(reference: &str) -> bool {
    Url::parse(reference)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn file_name_of(reference: &str) -> String {
    let name = if is_remote_url(reference) {
        Url::parse(reference)
            .ok()
            .and_then(|u| u.path_segments()?.last().map(str::to_string))
    } else {
        Path::new(reference)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    };
    name.filter(|n| !n.is_empty())
        .unwrap_or_else(|| "image.png".to_string())
}

/// Untyped client for a Gradio space's HTTP predict API.
///
/// Only holds immutable configuration, so one instance can be shared by
/// every in-flight request.
#[derive(Debug, Clone)]
pub struct GradioClient {
    endpoint: String,
    host: Option<String>,
    access_token: Option<String>,
    timeout: Option<Duration>,
    client: Client,
}

impl GradioClient {
    pub fn new(
        endpoint: &str,
        access_token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        validate_url("endpoint", endpoint)?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            host: Url::parse(endpoint)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string)),
            access_token: access_token.filter(|t| !t.is_empty()),
            timeout,
            client: Client::new(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url_for(&self, target: &Target) -> String {
        match target {
            Target::ApiName(name) => format!("{}/run/{}", self.endpoint, name.trim_start_matches('/')),
            Target::FnIndex(_) => format!("{}/run/predict", self.endpoint),
        }
    }

    /// URL under which the space serves one of its own files.
    pub fn file_url(&self, remote_path: &str) -> String {
        format!("{}/file={}", self.endpoint, remote_path)
    }

    /// 只把 token 送給自己的 space 或其他 Hugging Face space
    fn sends_token_to(&self, url: &str) -> bool {
        match Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) {
            Some(host) => self.host.as_deref() == Some(host.as_str()) || host.ends_with(".hf.space"),
            None => false,
        }
    }

    fn with_auth(&self, mut request: RequestBuilder, url: &str) -> RequestBuilder {
        if let Some(token) = &self.access_token {
            if self.sends_token_to(url) {
                request = request.bearer_auth(token);
            }
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        request
    }

    fn unavailable(&self, source: reqwest::Error) -> AppError {
        AppError::RemoteUnavailable {
            endpoint: self.endpoint.clone(),
            source,
        }
    }

    pub async fn predict(&self, target: &Target, data: Vec<Value>) -> Result<Vec<Value>> {
        let url = self.url_for(target);
        let body = PredictRequest {
            data: &data,
            fn_index: match target {
                Target::FnIndex(index) => Some(*index),
                Target::ApiName(_) => None,
            },
        };

        tracing::debug!("Calling remote function {:?} at {}", target, url);

        let response = self
            .with_auth(self.client.post(&url).json(&body), &url)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.unavailable(e))?;

        tracing::debug!("Remote response status: {}", status);

        let payload: Option<Value> = serde_json::from_str(&text).ok();

        // Gradio 以 {"error": "..."} 表示參數被拒絕，不論 HTTP 狀態碼
        if let Some(message) = payload
            .as_ref()
            .and_then(|p| p.get("error"))
            .and_then(Value::as_str)
        {
            return Err(AppError::RemoteValidation {
                message: message.to_string(),
            });
        }

        if !status.is_success() {
            return Err(AppError::RemoteStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        match payload {
            Some(Value::Object(mut map)) => match map.remove("data") {
                Some(Value::Array(items)) => Ok(items),
                _ => Err(AppError::MalformedResponse {
                    message: format!("missing 'data' array in response from {}", url),
                }),
            },
            _ => Err(AppError::MalformedResponse {
                message: format!("response from {} is not a JSON object", url),
            }),
        }
    }

    /// Decodes the first output value as an image and makes it fetchable from outside the space.
    pub fn decode_image(&self, data: Vec<Value>) -> Result<ImageRef> {
        let first = data
            .into_iter()
            .next()
            .ok_or_else(|| AppError::MalformedResponse {
                message: format!("empty 'data' array from {}", self.endpoint),
            })?;

        let image = serde_json::from_value(first).map_err(|e| AppError::MalformedResponse {
            message: format!("unexpected image value from {}: {}", self.endpoint, e),
        })?;
        Ok(self.resolve_output(image))
    }

    /// 遠端回傳的是 space 內部路徑，轉成 `{endpoint}/file=...` 才能被其他服務讀取
    pub fn resolve_output(&self, image: ImageRef) -> ImageRef {
        match image {
            ImageRef::Reference(url) if is_remote_url(&url) => ImageRef::Reference(url),
            ImageRef::Reference(path) => ImageRef::File(FileData {
                url: Some(self.file_url(&path)),
                path: Some(path),
                extra: serde_json::Map::new(),
            }),
            ImageRef::File(mut file) => {
                if file.url.is_none() {
                    file.url = file.path.as_deref().map(|p| self.file_url(p));
                }
                ImageRef::File(file)
            }
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("Downloading {}", url);

        let response = self
            .with_auth(self.client.get(url), url)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::RemoteStatus {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.unavailable(e))?;
        Ok(bytes.to_vec())
    }

    /// Uploads raw bytes to the space and returns the file object its functions accept.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<FileData> {
        let url = format!("{}/upload", self.endpoint);
        tracing::debug!("Uploading {} ({} bytes) to {}", file_name, bytes.len(), url);

        let form = Form::new().part("files", Part::bytes(bytes).file_name(file_name.to_string()));
        let response = self
            .with_auth(self.client.post(&url).multipart(form), &url)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.unavailable(e))?;
        if !status.is_success() {
            return Err(AppError::RemoteStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let paths: Vec<String> =
            serde_json::from_str(&text).map_err(|e| AppError::MalformedResponse {
                message: format!("unexpected upload response from {}: {}", url, e),
            })?;
        let path = paths
            .into_iter()
            .next()
            .ok_or_else(|| AppError::MalformedResponse {
                message: format!("upload to {} returned no paths", url),
            })?;

        let mut extra = serde_json::Map::new();
        extra.insert("orig_name".to_string(), Value::String(file_name.to_string()));

        Ok(FileData {
            url: Some(self.file_url(&path)),
            path: Some(path),
            extra,
        })
    }

    /// Makes a local file or a remote URL readable by this space.
    pub async fn prepare_file(&self, reference: &str) -> Result<FileData> {
        let bytes = if is_remote_url(reference) {
            self.download(reference).await?
        } else {
            tokio::fs::read(reference).await?
        };
        self.upload(&file_name_of(reference), bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_predict_by_api_name() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/run/infer")
                .json_body(json!({"data": ["a red fox in snow"]}));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"data": ["/tmp/fox.png"], "is_generating": false}));
        });

        let client = GradioClient::new(&server.url("/"), None, None).unwrap();
        let result = client
            .predict(&Target::ApiName("/infer".to_string()), vec![json!("a red fox in snow")])
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(result, vec![json!("/tmp/fox.png")]);
    }

    #[tokio::test]
    async fn test_predict_by_fn_index() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/run/predict")
                .json_body(json!({"data": ["x"], "fn_index": 1}));
            then.status(200).json_body(json!({"data": ["out.png"]}));
        });

        let client = GradioClient::new(&server.base_url(), None, None).unwrap();
        let result = client
            .predict(&Target::FnIndex(1), vec![json!("x")])
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(result, vec![json!("out.png")]);
    }

    #[tokio::test]
    async fn test_bearer_token_is_forwarded() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/run/infer")
                .header("authorization", "Bearer hf_secret");
            then.status(200).json_body(json!({"data": ["ok.png"]}));
        });

        let client =
            GradioClient::new(&server.base_url(), Some("hf_secret".to_string()), None).unwrap();
        client
            .predict(&Target::ApiName("infer".to_string()), vec![json!("p")])
            .await
            .unwrap();

        api_mock.assert();
    }

    #[tokio::test]
    async fn test_empty_token_is_treated_as_absent() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/run/infer")
                .header_exists("authorization");
            then.status(200).json_body(json!({"data": ["ok.png"]}));
        });
        let fallback = server.mock(|when, then| {
            when.method(POST).path("/run/infer");
            then.status(200).json_body(json!({"data": ["ok.png"]}));
        });

        let client = GradioClient::new(&server.base_url(), Some(String::new()), None).unwrap();
        client
            .predict(&Target::ApiName("infer".to_string()), vec![json!("p")])
            .await
            .unwrap();

        api_mock.assert_hits(0);
        fallback.assert();
    }

    #[tokio::test]
    async fn test_error_payload_maps_to_validation_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/run/infer");
            then.status(500)
                .json_body(json!({"error": "Invalid \\'prompt\\' parameter"}));
        });

        let client = GradioClient::new(&server.base_url(), None, None).unwrap();
        let err = client
            .predict(&Target::ApiName("infer".to_string()), vec![json!("")])
            .await
            .unwrap_err();

        match err {
            AppError::RemoteValidation { message } => {
                assert_eq!(message, "Invalid \\'prompt\\' parameter")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_success_without_error_payload() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/run/predict");
            then.status(503).body("space is sleeping");
        });

        let client = GradioClient::new(&server.base_url(), None, None).unwrap();
        let err = client
            .predict(&Target::FnIndex(1), vec![])
            .await
            .unwrap_err();

        match err {
            AppError::RemoteStatus { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "space is sleeping");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_data_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/run/infer");
            then.status(200).json_body(json!({"duration": 1.5}));
        });

        let client = GradioClient::new(&server.base_url(), None, None).unwrap();
        let err = client
            .predict(&Target::ApiName("infer".to_string()), vec![json!("p")])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_maps_to_unavailable() {
        // 綁定後立即釋放，確保這個埠沒有人在聽
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = GradioClient::new(&format!("http://{}", addr), None, None).unwrap();
        let err = client
            .predict(&Target::ApiName("infer".to_string()), vec![json!("p")])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::RemoteUnavailable { .. }));
    }

    #[test]
    fn test_rejects_invalid_endpoint() {
        assert!(GradioClient::new("not a url", None, None).is_err());
    }

    #[test]
    fn test_trailing_slash_is_normalised() {
        let client = GradioClient::new("https://fffiloni-sdxl-dpo-2.hf.space/", None, None).unwrap();
        assert_eq!(client.endpoint(), "https://fffiloni-sdxl-dpo-2.hf.space");
        assert_eq!(
            client.url_for(&Target::ApiName("/infer".to_string())),
            "https://fffiloni-sdxl-dpo-2.hf.space/run/infer"
        );
    }

    #[test]
    fn test_file_url_and_remote_url_detection() {
        let client = GradioClient::new("https://space.hf.space/", None, None).unwrap();
        assert_eq!(
            client.file_url("/tmp/gradio/a.png"),
            "https://space.hf.space/file=/tmp/gradio/a.png"
        );
        assert!(is_remote_url("https://x.hf.space/file=/tmp/a.png"));
        assert!(!is_remote_url("/tmp/a.png"));
        assert!(!is_remote_url("./demos/monalisa.png"));
        assert_eq!(file_name_of("https://x/y/portrait.jpg"), "portrait.jpg");
        assert_eq!(file_name_of("/home/me/fox.png"), "fox.png");
    }

    #[test]
    fn test_resolve_output_builds_file_url_for_paths() {
        let client = GradioClient::new("https://space.hf.space", None, None).unwrap();

        let resolved = client.resolve_output(ImageRef::from("/tmp/gradio/fox.png"));
        assert_eq!(
            resolved.locator(),
            Some("https://space.hf.space/file=/tmp/gradio/fox.png")
        );

        // 已經是 URL 的不動
        let url = ImageRef::from("https://cdn.example.com/fox.png");
        assert_eq!(client.resolve_output(url.clone()), url);

        // 檔案物件優先保留原本的 url
        let file: ImageRef = serde_json::from_value(
            json!({"path": "/tmp/x.png", "url": "https://other/file=/tmp/x.png"}),
        )
        .unwrap();
        assert_eq!(client.resolve_output(file.clone()), file);

        let path_only: ImageRef = serde_json::from_value(json!({"path": "/tmp/y.png"})).unwrap();
        assert_eq!(
            client.resolve_output(path_only).locator(),
            Some("https://space.hf.space/file=/tmp/y.png")
        );
    }

    #[test]
    fn test_token_only_sent_to_trusted_hosts() {
        let client = GradioClient::new(
            "https://fffiloni-deepfakeai.hf.space",
            Some("hf_secret".to_string()),
            None,
        )
        .unwrap();

        assert!(client.sends_token_to("https://fffiloni-deepfakeai.hf.space/file=/tmp/a.png"));
        assert!(client.sends_token_to("https://fffiloni-sdxl-dpo-2.hf.space/file=/tmp/b.png"));
        assert!(!client.sends_token_to("https://evil.example.com/a.png"));
        assert!(!client.sends_token_to("not a url"));
    }

    #[tokio::test]
    async fn test_upload_returns_file_object() {
        let server = MockServer::start();
        let upload_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/upload")
                .header("authorization", "Bearer hf_secret")
                .body_contains(r#"name="files""#)
                .body_contains(r#"filename="fox.png""#)
                .body_contains("PNGDATA");
            then.status(200).json_body(json!(["/tmp/gradio/up/fox.png"]));
        });

        let client =
            GradioClient::new(&server.base_url(), Some("hf_secret".to_string()), None).unwrap();
        let file = client.upload("fox.png", b"PNGDATA".to_vec()).await.unwrap();

        upload_mock.assert();
        assert_eq!(file.path.as_deref(), Some("/tmp/gradio/up/fox.png"));
        assert_eq!(
            file.url,
            Some(format!("{}/file=/tmp/gradio/up/fox.png", server.base_url()))
        );
        assert_eq!(file.extra.get("orig_name"), Some(&json!("fox.png")));
    }

    #[tokio::test]
    async fn test_upload_failure_maps_to_remote_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/upload");
            then.status(413).body("too large");
        });

        let client = GradioClient::new(&server.base_url(), None, None).unwrap();
        let err = client.upload("big.png", vec![0; 16]).await.unwrap_err();

        assert!(matches!(err, AppError::RemoteStatus { status: 413, .. }));
    }

    #[tokio::test]
    async fn test_prepare_file_uploads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let portrait = dir.path().join("me.png");
        std::fs::write(&portrait, b"LOCALBYTES").unwrap();

        let server = MockServer::start();
        let upload_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/upload")
                .body_contains(r#"filename="me.png""#)
                .body_contains("LOCALBYTES");
            then.status(200).json_body(json!(["/tmp/gradio/up/me.png"]));
        });

        let client = GradioClient::new(&server.base_url(), None, None).unwrap();
        let file = client
            .prepare_file(portrait.to_str().unwrap())
            .await
            .unwrap();

        upload_mock.assert();
        assert_eq!(file.path.as_deref(), Some("/tmp/gradio/up/me.png"));
    }

    #[tokio::test]
    async fn test_prepare_file_downloads_remote_url_first() {
        let origin = MockServer::start();
        let download_mock = origin.mock(|when, then| {
            when.method(GET).path("/file=/tmp/gradio/gen.png");
            then.status(200).body("REMOTEBYTES");
        });

        let server = MockServer::start();
        let upload_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/upload")
                .body_contains(r#"filename="gen.png""#)
                .body_contains("REMOTEBYTES");
            then.status(200).json_body(json!(["/tmp/gradio/up/gen.png"]));
        });

        let client = GradioClient::new(&server.base_url(), None, None).unwrap();
        let file = client
            .prepare_file(&origin.url("/file=/tmp/gradio/gen.png"))
            .await
            .unwrap();

        download_mock.assert();
        upload_mock.assert();
        assert_eq!(file.path.as_deref(), Some("/tmp/gradio/up/gen.png"));
    }

    #[tokio::test]
    async fn test_prepare_file_missing_local_file_is_io_error() {
        let server = MockServer::start();
        let upload_mock = server.mock(|when, then| {
            when.method(POST).path("/upload");
            then.status(200).json_body(json!(["/never"]));
        });

        let client = GradioClient::new(&server.base_url(), None, None).unwrap();
        let err = client
            .prepare_file("/definitely/not/here/portrait.png")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::IoError(_)));
        upload_mock.assert_hits(0);
    }

    #[test]
    fn test_decode_image_rejects_empty_and_non_image_data() {
        let client = GradioClient::new("http://space", None, None).unwrap();
        assert!(matches!(
            client.decode_image(vec![]).unwrap_err(),
            AppError::MalformedResponse { .. }
        ));
        assert!(matches!(
            client.decode_image(vec![json!(42)]).unwrap_err(),
            AppError::MalformedResponse { .. }
        ));
    }
}
