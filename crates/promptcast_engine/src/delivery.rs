use std::path::Path;

use engine_logging::engine_debug;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::http::{build_client, ensure_success, map_reqwest_error, HttpSettings};
use crate::types::{DeliveryError, FailureKind};

/// Longest caption the Bot API accepts for a photo.
pub const MAX_CAPTION_CHARS: usize = 1024;

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[async_trait::async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn deliver(&self, path: &Path, caption: Option<&str>) -> Result<(), DeliveryError>;
}

/// How captions are derived from prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionStyle {
    pub enabled: bool,
    pub prefix: String,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: "🖼️ ".to_string(),
        }
    }
}

impl CaptionStyle {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            prefix: String::new(),
        }
    }

    pub fn caption_for(&self, prompt: &str) -> Option<String> {
        self.enabled
            .then(|| truncate_caption(&format!("{}{prompt}", self.prefix), MAX_CAPTION_CHARS))
    }
}

/// Cuts `caption` to at most `max_chars` characters.
pub fn truncate_caption(caption: &str, max_chars: usize) -> String {
    match caption.char_indices().nth(max_chars) {
        Some((end, _)) => caption[..end].to_string(),
        None => caption.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub api_url: String,
    pub bot_token: String,
    pub chat_id: String,
}

/// Uploads artifacts with the Bot API `sendPhoto` method.
#[derive(Debug, Clone)]
pub struct TelegramChannel {
    http: HttpSettings,
    settings: TelegramSettings,
}

#[derive(Debug, Deserialize)]
struct BotResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramChannel {
    pub fn new(http: HttpSettings, settings: TelegramSettings) -> Self {
        Self { http, settings }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendPhoto",
            self.settings.api_url.trim_end_matches('/'),
            self.settings.bot_token
        )
    }
}

#[async_trait::async_trait]
impl DeliveryChannel for TelegramChannel {
    async fn deliver(&self, path: &Path, caption: Option<&str>) -> Result<(), DeliveryError> {
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            DeliveryError::new(FailureKind::Io, format!("cannot read {path:?}: {err}"))
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.png".to_string());

        let photo = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/png")
            .map_err(|err| DeliveryError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let mut form = Form::new()
            .text("chat_id", self.settings.chat_id.clone())
            .part("photo", photo);
        if let Some(caption) = caption {
            form = form.text("caption", truncate_caption(caption, MAX_CAPTION_CHARS));
        }

        let client = build_client(self.http.connect_timeout, self.http.request_timeout)?;
        let response = client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;

        // A 2xx body with `ok: false` is still a rejection.
        let body = response.text().await.map_err(map_reqwest_error)?;
        if let Ok(reply) = serde_json::from_str::<BotResponse>(&body) {
            if !reply.ok {
                return Err(DeliveryError::new(
                    FailureKind::Backend,
                    reply
                        .description
                        .unwrap_or_else(|| "request rejected".to_string()),
                ));
            }
        }
        engine_debug!("Delivered {:?} to chat {}", path, self.settings.chat_id);
        Ok(())
    }
}
