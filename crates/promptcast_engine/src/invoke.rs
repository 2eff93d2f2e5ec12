use std::path::PathBuf;

use engine_logging::engine_debug;
use promptcast_core::ImageHandle;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::backend::SpaceLocator;
use crate::http::{
    build_client, ensure_success, excerpt, map_reqwest_error, read_body_limited, HttpSettings,
};
use crate::params::{GenerationParams, GenerationRequest};
use crate::types::{FailureKind, GenerationError};

/// Endpoint name of the text-to-image function on the spaces we call.
const API_NAME: &str = "infer";

#[async_trait::async_trait]
pub trait GenerationInvoker: Send + Sync {
    async fn invoke(
        &self,
        backend: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ImageHandle, GenerationError>;
}

/// Invokes a Gradio-style space through its queued `/call/<api>` REST API.
#[derive(Debug, Clone)]
pub struct GradioInvoker {
    settings: HttpSettings,
    locator: SpaceLocator,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallAccepted {
    event_id: String,
}

impl GradioInvoker {
    pub fn new(settings: HttpSettings, locator: SpaceLocator, token: Option<String>) -> Self {
        Self {
            settings,
            locator,
            token,
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, GenerationError> {
        let client = build_client(self.settings.connect_timeout, self.settings.request_timeout)?;
        let response = self
            .authorize(client.get(url))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        Ok(read_body_limited(response, self.settings.max_image_bytes).await?)
    }
}

#[async_trait::async_trait]
impl GenerationInvoker for GradioInvoker {
    async fn invoke(
        &self,
        backend: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ImageHandle, GenerationError> {
        let base = self.locator.base_url(backend)?;
        let request = GenerationRequest::for_backend(backend, prompt, params);
        engine_debug!(
            "Calling {}/call/{} with {} argument(s)",
            base,
            API_NAME,
            request.data().len()
        );

        let client = build_client(
            self.settings.connect_timeout,
            self.settings.generation_timeout,
        )?;
        let call_url = format!("{base}/call/{API_NAME}");

        let response = self
            .authorize(client.post(&call_url))
            .json(&json!({ "data": request.data() }))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let accepted: CallAccepted = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|err| {
                GenerationError::new(FailureKind::MalformedResponse, err.to_string())
            })?;

        let response = self
            .authorize(client.get(format!("{call_url}/{}", accepted.event_id)))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let stream = ensure_success(response)
            .await?
            .text()
            .await
            .map_err(map_reqwest_error)?;

        let outputs = parse_event_stream(&stream)?;
        let reference = first_image_reference(&outputs)?;
        let location = resolve_reference(&base, &reference);
        engine_debug!("Fetching generated image from {}", location);

        match location {
            ImageLocation::Remote(url) => Ok(ImageHandle::Bytes(self.download(&url).await?)),
            ImageLocation::Local(path) => Ok(ImageHandle::File(path)),
        }
    }
}

/// Extracts the output array from a server-sent-event body.
///
/// Only the `data:` line that follows `event: complete` counts; `event: error`
/// aborts with the backend's message.
pub fn parse_event_stream(body: &str) -> Result<Value, GenerationError> {
    let mut event = "";
    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim();
            continue;
        }
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        match event {
            "complete" => {
                return serde_json::from_str(data).map_err(|err| {
                    GenerationError::new(
                        FailureKind::MalformedResponse,
                        format!("invalid completion payload: {err}"),
                    )
                });
            }
            "error" => {
                let message = if data.is_empty() || data == "null" {
                    "backend reported an error".to_string()
                } else {
                    excerpt(data, 200)
                };
                return Err(GenerationError::new(FailureKind::Backend, message));
            }
            _ => {}
        }
    }
    Err(GenerationError::new(
        FailureKind::MalformedResponse,
        "event stream ended without a result",
    ))
}

/// The first output element: a file object (`url` or `path`) or a plain string.
pub fn first_image_reference(outputs: &Value) -> Result<String, GenerationError> {
    let first = outputs
        .as_array()
        .and_then(|items| items.first())
        .ok_or_else(|| {
            GenerationError::new(FailureKind::MalformedResponse, "empty output list")
        })?;

    let reference = match first {
        Value::String(reference) => Some(reference.clone()),
        Value::Object(file) => ["url", "path"]
            .iter()
            .find_map(|key| file.get(*key).and_then(Value::as_str))
            .map(ToOwned::to_owned),
        _ => None,
    };

    reference
        .filter(|reference| !reference.trim().is_empty())
        .ok_or_else(|| {
            GenerationError::new(
                FailureKind::MalformedResponse,
                format!("first output is not an image reference: {first}"),
            )
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ImageLocation {
    Remote(String),
    Local(PathBuf),
}

impl std::fmt::Display for ImageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageLocation::Remote(url) => f.write_str(url),
            ImageLocation::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Absolute URLs are used as-is; an existing local path stays local;
/// anything else is a file served by the backend itself.
fn resolve_reference(base: &str, reference: &str) -> ImageLocation {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        return ImageLocation::Remote(reference.to_string());
    }
    let local = PathBuf::from(reference);
    if local.is_absolute() && local.is_file() {
        return ImageLocation::Local(local);
    }
    ImageLocation::Remote(format!("{base}/file={reference}"))
}
