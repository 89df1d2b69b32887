//! Gemini API client.
//!
//! Implements the [`DescriptionModel`] capability against the Gemini
//! `generateContent` endpoint. Images travel either inline (base64
//! `inlineData` part) or by handle after staging through the Files API
//! (`fileData` part); both paths produce an equivalent logical request.

use async_trait::async_trait;
use base64::Engine;
use deckhand_core::{ConfigError, DescribeError, DescriptionModel, ImagePayload};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable holding the API credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Client for the Gemini generative API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client with an explicit API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create a client from the `GEMINI_API_KEY` environment variable.
    ///
    /// A missing or empty credential is a configuration error, surfaced here
    /// before any request is attempted.
    pub fn from_env() -> Result<Self, ConfigError> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .map(Self::new)
            .ok_or(ConfigError::MissingCredential(API_KEY_ENV))
    }

    /// Point the client at a different API host (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl DescriptionModel for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn stage(&self, data: Vec<u8>, mime_type: &str) -> Result<String, DescribeError> {
        let url = format!(
            "{}/upload/v1beta/files?key={}",
            self.base_url, self.api_key
        );

        let metadata = serde_json::json!({ "file": { "display_name": "slide" } });
        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(metadata.to_string())
                    .mime_str("application/json")
                    .map_err(|e| DescribeError::Upload(e.to_string()))?,
            )
            .part(
                "file",
                reqwest::multipart::Part::bytes(data)
                    .mime_str(mime_type)
                    .map_err(|e| DescribeError::Upload(e.to_string()))?,
            );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DescribeError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DescribeError::Upload(format!("{status}: {body}")));
        }

        let upload: UploadResponse = response
            .json()
            .await
            .map_err(|e| DescribeError::Upload(e.to_string()))?;
        debug!("Staged image as {}", upload.file.uri);
        Ok(upload.file.uri)
    }

    async fn generate(
        &self,
        payload: &ImagePayload,
        prompt: &str,
        model: &str,
    ) -> Result<String, DescribeError> {
        let image_part = match payload {
            ImagePayload::Inline { data, mime_type } => Part::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(data),
                },
            },
            ImagePayload::Handle { uri, mime_type } => Part::FileData {
                file_data: FileData {
                    mime_type: mime_type.clone(),
                    file_uri: uri.clone(),
                },
            },
        };

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    image_part,
                    Part::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DescribeError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DescribeError::Request(format!("{status}: {body}")));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| DescribeError::Request(e.to_string()))?;
        response_text(parsed).ok_or(DescribeError::EmptyResponse)
    }
}

/// Concatenated text of the first candidate, if any.
fn response_text(response: GenerateResponse) -> Option<String> {
    let candidate = response.candidates.into_iter().next()?;
    let text: String = candidate
        .content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");
    (!text.is_empty()).then_some(text)
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct FileData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    #[serde(rename = "fileUri")]
    file_uri: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    uri: String,
}
