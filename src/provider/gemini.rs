//! Google Gemini REST client.
//!
//! Calls `POST {api_base}/models/{model}:generateContent` with the key in the
//! `x-goog-api-key` header. No retries: the first failure is returned as-is.

use super::{ContentRequest, ContentResponse, GenAiProvider};
use crate::error::IllustratorError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Public Gemini API endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Marker the API returns when the key's project cannot be resolved.
const ENTITY_NOT_FOUND: &str = "Requested entity was not found";

/// [`GenAiProvider`] backed by the Gemini REST API.
#[derive(Clone)]
pub struct GeminiProvider {
    api_base: String,
    api_key: String,
    timeout_secs: u64,
    http: reqwest::Client,
}

impl fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GeminiProvider {
    /// Build a client for `api_base` (trailing slashes are ignored).
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, IllustratorError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(IllustratorError::CredentialUnavailable {
                hint: "The Gemini API key is empty.".into(),
            });
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| IllustratorError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            api_base: api_base.into().trim().trim_end_matches('/').to_string(),
            api_key,
            timeout_secs,
            http,
        })
    }

    /// Full `generateContent` URL for `model`; accepts `models/…` prefixed ids.
    pub fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }
}

#[async_trait]
impl GenAiProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &ContentRequest,
    ) -> Result<ContentResponse, IllustratorError> {
        let url = self.endpoint_for_model(model);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!("{} answered HTTP {} ({} bytes)", model, status, body.len());

        if !status.is_success() {
            return Err(classify_http_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| IllustratorError::Transport {
            message: format!("invalid response body from {model}: {e}"),
        })
    }
}

impl GeminiProvider {
    fn transport_error(&self, e: reqwest::Error) -> IllustratorError {
        let message = if e.is_timeout() {
            format!("request timed out after {}s", self.timeout_secs)
        } else {
            e.to_string()
        };
        IllustratorError::Transport { message }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Map a non-2xx response to an [`IllustratorError`].
///
/// 401/403 and the "entity not found" / invalid-key messages mean the key or
/// its project is unusable, so they become [`IllustratorError::Auth`].
/// Everything else is a [`IllustratorError::Transport`] carrying the
/// provider's own message.
pub fn classify_http_error(status: StatusCode, body: &str) -> IllustratorError {
    let (message, api_status) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) if !env.error.message.is_empty() => (env.error.message, env.error.status),
        _ => (body.trim().to_string(), String::new()),
    };

    let rejected_key = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || message.contains(ENTITY_NOT_FOUND)
        || message.contains("API key not valid")
        || api_status == "UNAUTHENTICATED"
        || api_status == "PERMISSION_DENIED";

    if rejected_key {
        IllustratorError::Auth { detail: message }
    } else {
        IllustratorError::Transport {
            message: format!("HTTP {}: {}", status.as_u16(), message),
        }
    }
}
