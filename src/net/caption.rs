//! Core `Captioner` trait and the `HttpCaptioner` implementation.
//!
//! `HttpCaptioner` talks to the self-hosted captioning backend configured in
//! the settings record: `POST http://{host}:{port}/caption-base64` with a
//! multipart form whose single `file` field carries the base64 image data.
//! The response is JSON with the caption in a `data` field; any other shape
//! is an error.

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CaptionError
// ---------------------------------------------------------------------------

/// Errors that can occur while requesting a caption.
///
/// Every variant is a hard failure for the capture attempt that produced it:
/// the pipeline logs it, surfaces no caption, and does not attempt
/// translation.
#[derive(Debug, Error)]
pub enum CaptionError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the client timeout.
    #[error("captioning request timed out")]
    Timeout,

    /// The backend answered with a non-success status.
    #[error("captioning backend returned HTTP {0}")]
    Status(u16),

    /// The response body was not the expected JSON shape.
    #[error("failed to parse captioning response: {0}")]
    Parse(String),

    /// The response parsed but carried no caption text.
    #[error("captioning response had no caption")]
    MissingCaption,
}

impl From<reqwest::Error> for CaptionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CaptionError::Timeout
        } else {
            CaptionError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Captioner trait
// ---------------------------------------------------------------------------

/// Async interface to an image-captioning service.
///
/// Implementors must be `Send + Sync` so they can be shared with the
/// orchestrator behind an `Arc<dyn Captioner>`.
#[async_trait]
pub trait Captioner: Send + Sync {
    /// Caption a single image, supplied as base64-encoded bytes.
    async fn caption(&self, image_b64: &str) -> Result<String, CaptionError>;

    /// Point the client at a different backend after a settings change.
    ///
    /// Default is a no-op for fixed-endpoint implementations.
    fn retarget(&self, host: &str, port: &str) {
        let _ = (host, port);
    }
}

// ---------------------------------------------------------------------------
// HttpCaptioner
// ---------------------------------------------------------------------------

/// Per-request client timeout.  Uploads are larger than the connectivity
/// probe, so this is deliberately more generous than [`super::PROBE_TIMEOUT`].
const UPLOAD_TIMEOUT_SECS: u64 = 30;

/// Captioning client for the configured backend.
///
/// All connection details come from the settings record via
/// [`HttpCaptioner::for_backend`]; nothing is hardcoded.
pub struct HttpCaptioner {
    client: reqwest::Client,
    // Mutex rather than a rebuild: the backend can change whenever the user
    // re-saves settings, while the orchestrator holds this behind an Arc.
    base_url: std::sync::Mutex<String>,
}

impl HttpCaptioner {
    /// Build a captioner for `http://{host}:{port}`.
    ///
    /// The HTTP client is pre-configured with the upload timeout.  A default
    /// client is used as a last-resort fallback if the builder fails (should
    /// never happen in practice).
    pub fn for_backend(host: &str, port: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: std::sync::Mutex::new(format!("http://{host}:{port}")),
        }
    }

    /// Build against an explicit base URL (useful for tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: std::sync::Mutex::new(base_url.into()),
        }
    }

    /// The upload endpoint this client posts to.
    pub fn endpoint(&self) -> String {
        format!("{}/caption-base64", self.base_url.lock().unwrap())
    }
}

/// Extract the caption string from a captioning response body.
///
/// Kept as a free function so the wire-format contract is testable without a
/// live backend.
pub fn parse_caption(body: &str) -> Result<String, CaptionError> {
    let json: serde_json::Value =
        serde_json::from_str(body).map_err(|e| CaptionError::Parse(e.to_string()))?;

    let caption = json["data"]
        .as_str()
        .ok_or(CaptionError::MissingCaption)?
        .trim()
        .to_string();

    if caption.is_empty() {
        return Err(CaptionError::MissingCaption);
    }

    Ok(caption)
}

#[async_trait]
impl Captioner for HttpCaptioner {
    /// Upload `image_b64` as the multipart `file` field and extract the
    /// caption from the JSON `data` field.
    ///
    /// A non-success status is surfaced as [`CaptionError::Status`] before
    /// the body is looked at.
    async fn caption(&self, image_b64: &str) -> Result<String, CaptionError> {
        let url = self.endpoint();
        log::debug!("caption: uploading photo to {url}");

        let form = reqwest::multipart::Form::new().text("file", image_b64.to_string());

        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CaptionError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_caption(&body)
    }

    fn retarget(&self, host: &str, port: &str) {
        let mut base_url = self.base_url.lock().unwrap();
        *base_url = format!("http://{host}:{port}");
        log::debug!("caption: backend retargeted to {}", *base_url);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
