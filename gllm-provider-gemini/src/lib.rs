//! Google Gemini provider for `gllm-provider`.
//!
//! Only the streaming `generateContent` endpoint (`alt=sse`) is implemented;
//! Gemini has no separate non-streaming code path worth maintaining
//! alongside it.

mod error;
mod mapping;
mod streaming;
mod types;

use gllm_provider::{EventStream, Provider};
use gllm_types::{CompletionRequest, ProviderError};

use crate::error::{map_http_status, map_reqwest_error};
use crate::mapping::to_api_request;
use crate::streaming::stream_completion;

/// Default model used when a request doesn't specify one.
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default Gemini API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Client for the Gemini `generateContent` API.
///
/// Implements [`Provider`] for use anywhere a provider is accepted.
///
/// # Example
///
/// ```no_run
/// use gllm_provider_gemini::Gemini;
///
/// let client = Gemini::new("api-key").base_url("https://generativelanguage.googleapis.com");
/// ```
pub struct Gemini {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl Gemini {
    /// Create a new client authenticating with `api_key`.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), base_url: DEFAULT_BASE_URL.into(), client: reqwest::Client::new() }
    }

    /// Override the API base URL, e.g. to point at a proxy.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Build the `streamGenerateContent` endpoint URL for `model`.
    fn stream_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:streamGenerateContent?alt=sse", self.base_url)
    }
}

impl Provider for Gemini {
    async fn stream(&self, request: CompletionRequest) -> Result<EventStream, ProviderError> {
        let model = if request.model.is_empty() { DEFAULT_MODEL } else { &request.model };
        let url = self.stream_url(model);
        let body = to_api_request(&request);

        tracing::debug!(url = %url, model, "sending streaming completion request to Gemini");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.map_err(map_reqwest_error)?;
            return Err(map_http_status(status, &body_text));
        }

        Ok(stream_completion(response))
    }

    fn model_name<'a>(&self, request: &'a CompletionRequest) -> &'a str {
        if request.model.is_empty() { DEFAULT_MODEL } else { &request.model }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url_is_set() {
        let client = Gemini::new("key");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn builder_overrides_base_url() {
        let client = Gemini::new("key").base_url("https://proxy.internal");
        assert_eq!(client.base_url, "https://proxy.internal");
    }

    #[test]
    fn stream_url_includes_model_and_sse_flag() {
        let client = Gemini::new("key");
        assert_eq!(client.stream_url("gemini-2.0-flash"), "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:streamGenerateContent?alt=sse");
    }

    #[test]
    fn model_name_falls_back_to_default_when_request_model_is_empty() {
        let client = Gemini::new("key");
        let request = CompletionRequest { model: String::new(), ..Default::default() };
        assert_eq!(client.model_name(&request), DEFAULT_MODEL);
    }

    #[test]
    fn model_name_uses_request_model_when_set() {
        let client = Gemini::new("key");
        let request = CompletionRequest { model: "gemini-1.5-pro".into(), ..Default::default() };
        assert_eq!(client.model_name(&request), "gemini-1.5-pro");
    }
}
