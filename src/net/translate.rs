//! Core `Translator` trait and the `MyMemoryTranslator` implementation.
//!
//! Captions are translated through the public MyMemory endpoint:
//! `GET https://api.mymemory.translated.net/get?q={text}&langpair={src}|{dst}`
//! with the text URL-encoded.  The translation lives in the nested
//! `responseData.translatedText` field.
//!
//! Translation is the one soft dependency in the pipeline: when it fails the
//! orchestrator logs the error and speaks the original caption instead.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::LanguageCode;

// ---------------------------------------------------------------------------
// TranslateError
// ---------------------------------------------------------------------------

/// Errors that can occur during translation.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the client timeout.
    #[error("translation request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status.
    #[error("translation endpoint returned HTTP {0}")]
    Status(u16),

    /// The response body was not the expected JSON shape.
    #[error("failed to parse translation response: {0}")]
    Parse(String),

    /// The response parsed but carried no translated text.
    #[error("translation response was empty")]
    EmptyTranslation,
}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranslateError::Timeout
        } else {
            TranslateError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Translator trait
// ---------------------------------------------------------------------------

/// Async interface to a text-translation service.
///
/// # Arguments
/// * `text` – source text (the caption).
/// * `src`  – language the text is in (the model language).
/// * `dst`  – language to translate into (the voice language).
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        src: LanguageCode,
        dst: LanguageCode,
    ) -> Result<String, TranslateError>;
}

// ---------------------------------------------------------------------------
// MyMemoryTranslator
// ---------------------------------------------------------------------------

/// The fixed public endpoint.
pub const MYMEMORY_BASE_URL: &str = "https://api.mymemory.translated.net";

const TRANSLATE_TIMEOUT_SECS: u64 = 10;

/// Translation client for the MyMemory REST API.
pub struct MyMemoryTranslator {
    client: reqwest::Client,
    base_url: String,
}

impl MyMemoryTranslator {
    /// Build a translator against the public MyMemory endpoint.
    pub fn new() -> Self {
        Self::with_base_url(MYMEMORY_BASE_URL)
    }

    /// Build against an explicit base URL (useful for tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(TRANSLATE_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl Default for MyMemoryTranslator {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the full request URL for a translation query.
///
/// The text is URL-encoded; the language pair is sent as `SRC|DST` wire
/// codes.  Free function so the wire format is testable offline.
pub fn build_query_url(
    base_url: &str,
    text: &str,
    src: LanguageCode,
    dst: LanguageCode,
) -> String {
    format!(
        "{base_url}/get?q={}&langpair={}|{}",
        urlencoding::encode(text),
        src.code(),
        dst.code()
    )
}

/// Extract `responseData.translatedText` from a MyMemory response body.
pub fn parse_translation(body: &str) -> Result<String, TranslateError> {
    let json: serde_json::Value =
        serde_json::from_str(body).map_err(|e| TranslateError::Parse(e.to_string()))?;

    let translated = json["responseData"]["translatedText"]
        .as_str()
        .ok_or(TranslateError::EmptyTranslation)?
        .trim()
        .to_string();

    if translated.is_empty() {
        return Err(TranslateError::EmptyTranslation);
    }

    Ok(translated)
}

#[async_trait]
impl Translator for MyMemoryTranslator {
    async fn translate(
        &self,
        text: &str,
        src: LanguageCode,
        dst: LanguageCode,
    ) -> Result<String, TranslateError> {
        let url = build_query_url(&self.base_url, text, src, dst);
        log::debug!("translate: {src} → {dst}, {} chars", text.len());

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_translation(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
