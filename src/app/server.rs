use crate::adapters::gradio::is_remote_url;
use crate::app::examples::{self, Example, EXAMPLES};
use crate::app::reporter::RequestReporter;
use crate::core::orchestrator::Orchestrator;
use crate::core::queue::AdmissionQueue;
use crate::core::{FaceSwapper, ImageGenerator, ImageRef};
use crate::utils::error::{AppError, ErrorCategory, Result};
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::net::TcpListener;

/// Shared server state.
pub struct AppState<G: ImageGenerator, F: FaceSwapper> {
    pub orchestrator: Orchestrator<G, F>,
    pub queue: AdmissionQueue,
}

impl<G: ImageGenerator, F: FaceSwapper> AppState<G, F> {
    pub fn new(orchestrator: Orchestrator<G, F>, queue: AdmissionQueue) -> Self {
        Self {
            orchestrator,
            queue,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InferRequest {
    pub portrait: String,
    #[serde(default)]
    pub prompt: String,
}

/// Where the portrait of one request comes from.
#[derive(Debug)]
enum Portrait {
    Reference(String),
    // 暫存檔在請求結束時才刪除
    Upload(NamedTempFile),
}

impl Portrait {
    /// Accepts an http(s) URL or the name of a bundled example, never an arbitrary server path.
    fn reference(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(AppError::UserFacing {
                message: "Please provide a source portrait".to_string(),
            });
        }
        if is_remote_url(value) {
            return Ok(Portrait::Reference(value.to_string()));
        }
        match examples::find(value) {
            Some(example) => Ok(Portrait::Reference(example.path().to_string_lossy().into_owned())),
            None => Err(AppError::UserFacing {
                message: format!(
                    "Unknown portrait '{}': upload an image, give an http(s) URL or pick an example",
                    value
                ),
            }),
        }
    }

    async fn upload(file_name: &str, bytes: &[u8]) -> Result<Self> {
        let suffix = std::path::Path::new(file_name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let file = tempfile::Builder::new()
            .prefix("portrait-")
            .suffix(&suffix)
            .tempfile()?;
        tokio::fs::write(file.path(), bytes).await?;

        tracing::debug!("Stored uploaded portrait {} ({} bytes)", file_name, bytes.len());
        Ok(Portrait::Upload(file))
    }

    fn locator(&self) -> String {
        match self {
            Portrait::Reference(reference) => reference.clone(),
            Portrait::Upload(file) => file.path().to_string_lossy().into_owned(),
        }
    }
}

fn bad_form(message: String) -> AppError {
    AppError::UserFacing { message }
}

async fn read_multipart(request: Request) -> Result<(Portrait, String)> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| bad_form(e.body_text()))?;

    let mut portrait = None;
    let mut prompt = String::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_form(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        match (name.as_deref(), file_name) {
            (Some("portrait"), Some(file_name)) => {
                let bytes = field.bytes().await.map_err(|e| bad_form(e.body_text()))?;
                if !bytes.is_empty() {
                    portrait = Some(Portrait::upload(&file_name, &bytes).await?);
                }
            }
            (Some("portrait"), None) => {
                let text = field.text().await.map_err(|e| bad_form(e.body_text()))?;
                portrait = Some(Portrait::reference(&text)?);
            }
            (Some("prompt"), _) => {
                prompt = field.text().await.map_err(|e| bad_form(e.body_text()))?;
            }
            _ => {}
        }
    }

    let portrait = portrait.ok_or_else(|| bad_form("Please provide a source portrait".to_string()))?;
    Ok((portrait, prompt))
}

/// `/api/infer` 同時接受 JSON 與 multipart 表單
async fn read_infer_request(request: Request) -> Result<(Portrait, String)> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if is_multipart {
        return read_multipart(request).await;
    }

    let Json(req) = Json::<InferRequest>::from_request(request, &())
        .await
        .map_err(|e| bad_form(e.body_text()))?;
    Ok((Portrait::reference(&req.portrait)?, req.prompt))
}

#[derive(Debug, Serialize)]
pub struct InferResponse {
    pub result: ImageRef,
    pub messages: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub messages: Vec<String>,
}

type ApiResult<T> = std::result::Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn status_for(err: &AppError) -> StatusCode {
    match err.category() {
        ErrorCategory::User => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCategory::Capacity => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: AppError, messages: Vec<String>) -> (StatusCode, Json<ApiError>) {
    let status = status_for(&err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(
            "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
            err,
            err.category(),
            err.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", err.recovery_suggestion());
    }

    (
        status,
        Json(ApiError {
            error: err.user_friendly_message(),
            messages,
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_check<G, F>(State(state): State<Arc<AppState<G, F>>>) -> Json<Value>
where
    G: ImageGenerator + 'static,
    F: FaceSwapper + 'static,
{
    Json(json!({
        "status": "ok",
        "pending": state.queue.pending(),
        "available_workers": state.queue.available_workers(),
    }))
}

async fn examples() -> Json<&'static [Example]> {
    Json(EXAMPLES)
}

async fn demo_image(Path(name): Path<String>) -> Response {
    let Some(example) = examples::find(&name) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(example.path()).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, example.content_type)], bytes).into_response(),
        Err(e) => {
            tracing::error!("❌ Cannot read example {}: {}", example.name, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn infer<G, F>(
    State(state): State<Arc<AppState<G, F>>>,
    request: Request,
) -> ApiResult<InferResponse>
where
    G: ImageGenerator + 'static,
    F: FaceSwapper + 'static,
{
    let (portrait, prompt) = read_infer_request(request)
        .await
        .map_err(|e| error_response(e, Vec::new()))?;

    let _admission = state
        .queue
        .admit()
        .await
        .map_err(|e| error_response(e, Vec::new()))?;

    let reporter = RequestReporter::new();
    match state
        .orchestrator
        .infer(&portrait.locator(), &prompt, &reporter)
        .await
    {
        Ok(result) => Ok(Json(InferResponse {
            result,
            messages: reporter.messages(),
            completed_at: Utc::now(),
        })),
        Err(e) => Err(error_response(e, reporter.messages())),
    }
}

pub fn router<G, F>(state: Arc<AppState<G, F>>) -> Router
where
    G: ImageGenerator + 'static,
    F: FaceSwapper + 'static,
{
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check::<G, F>))
        .route("/api/examples", get(examples))
        .route("/demos/:name", get(demo_image))
        .route("/api/infer", post(infer::<G, F>))
        .with_state(state)
}

pub async fn serve<G, F>(listener: TcpListener, state: Arc<AppState<G, F>>) -> Result<()>
where
    G: ImageGenerator + 'static,
    F: FaceSwapper + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("👋 Shutting down");
    }
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>SDXL Auto FaceSwap</title>
<style>
#col-container { margin: 0 auto; max-width: 840px; font-family: sans-serif; }
#result { max-width: 100%; }
#examples img { width: 96px; cursor: pointer; margin-right: 8px; }
</style>
</head>
<body>
<div id="col-container">
  <h2 style="text-align: center;">SDXL Auto FaceSwap</h2>
  <p style="text-align: center;">
    A text-to-image space and a face-swap space chained together through their HTTP APIs.
  </p>
  <label>Your source portrait <input id="portrait" type="file" accept="image/*"></label>
  <span id="example-name"></span><br>
  <label>Prompt target <textarea id="prompt" rows="3" cols="60"></textarea></label><br>
  <button id="submit">Submit</button>
  <p id="status"></p>
  <img id="result" alt="Swapped SDXL Result">
  <h3>Examples</h3>
  <div id="examples"></div>
</div>
<script>
const $ = (id) => document.getElementById(id);
let example = null;
fetch('/api/examples').then(r => r.json()).then(list => list.forEach(ex => {
  const img = document.createElement('img');
  img.src = ex.image;
  img.title = ex.prompt;
  img.onclick = () => {
    example = ex.name;
    $('portrait').value = '';
    $('example-name').textContent = ex.name;
    $('prompt').value = ex.prompt;
  };
  $('examples').appendChild(img);
}));
$('portrait').onchange = () => { example = null; $('example-name').textContent = ''; };
$('submit').onclick = async () => {
  const form = new FormData();
  const file = $('portrait').files[0];
  if (file) { form.append('portrait', file); } else if (example) { form.append('portrait', example); }
  form.append('prompt', $('prompt').value);
  $('status').textContent = 'Working ...';
  const resp = await fetch('/api/infer', { method: 'POST', body: form });
  const body = await resp.json();
  if (!resp.ok) { $('status').textContent = body.error; return; }
  const r = body.result;
  $('result').src = typeof r === 'string' ? r : (r.url || r.path);
  $('status').textContent = body.messages.join(' / ');
};
</script>
</body>
</html>
"#;
