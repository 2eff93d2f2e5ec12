use std::time::Duration;

use futures_util::StreamExt;

use crate::types::{FailureKind, HttpFailure};

/// Timeouts and size caps for every outbound HTTP call.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    /// Applies to probes, uploads and downloads.
    pub request_timeout: Duration,
    /// Applies to the generation call itself, which can take minutes.
    pub generation_timeout: Duration,
    pub max_image_bytes: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            generation_timeout: Duration::from_secs(300),
            max_image_bytes: 50 * 1024 * 1024,
        }
    }
}

pub(crate) fn build_client(
    connect_timeout: Duration,
    timeout: Duration,
) -> Result<reqwest::Client, HttpFailure> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(timeout)
        .build()
        .map_err(|err| HttpFailure::new(FailureKind::Network, err.to_string()))
}

/// Request URLs can carry credentials (`/bot<token>/...`), so they never
/// reach the message.
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> HttpFailure {
    let err = err.without_url();
    if err.is_timeout() {
        return HttpFailure::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return HttpFailure::new(FailureKind::MalformedResponse, err.to_string());
    }
    if err.is_builder() {
        return HttpFailure::new(FailureKind::InvalidUrl, err.to_string());
    }
    HttpFailure::new(FailureKind::Network, err.to_string())
}

/// Fails with `HttpStatus` unless the response is 2xx, keeping a body excerpt.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, HttpFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let excerpt = excerpt(&body, 200);
    let message = if excerpt.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {excerpt}")
    };
    Err(HttpFailure::new(
        FailureKind::HttpStatus(status.as_u16()),
        message,
    ))
}

/// Streams the body into memory, refusing anything above `max_bytes`.
pub(crate) async fn read_body_limited(
    response: reqwest::Response,
    max_bytes: u64,
) -> Result<Vec<u8>, HttpFailure> {
    if let Some(content_len) = response.content_length() {
        if content_len > max_bytes {
            return Err(HttpFailure::new(
                FailureKind::TooLarge {
                    max_bytes,
                    actual: Some(content_len),
                },
                "response too large",
            ));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        let next_len = bytes.len() as u64 + chunk.len() as u64;
        if next_len > max_bytes {
            return Err(HttpFailure::new(
                FailureKind::TooLarge {
                    max_bytes,
                    actual: Some(next_len),
                },
                "response too large",
            ));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// First `max_chars` characters of `text`, trimmed.
pub(crate) fn excerpt(text: &str, max_chars: usize) -> String {
    text.trim().chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::excerpt;

    #[test]
    fn excerpt_counts_characters_not_bytes() {
        assert_eq!(excerpt("  ошибка сервера ", 6), "ошибка");
        assert_eq!(excerpt("", 10), "");
    }
}
