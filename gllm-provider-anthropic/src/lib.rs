#![deny(missing_docs)]
//! Anthropic Messages API provider.
//!
//! Implements [`gllm_provider::Provider`] against Anthropic's streaming
//! Messages endpoint.

mod error;
mod mapping;
mod streaming;
mod types;

use gllm_provider::{EventStream, Provider, ProviderRequest};
use gllm_types::ProviderError;

use error::{map_http_status, map_reqwest_error};
use mapping::to_api_request;
use streaming::stream_completion;

/// Default model used when a request leaves `model` empty.
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default Anthropic API base URL.
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for the Anthropic Messages API.
///
/// Implements [`Provider`] for use anywhere a provider is accepted.
///
/// # Example
///
/// ```no_run
/// use gllm_provider_anthropic::Anthropic;
///
/// let client = Anthropic::new("sk-ant-...").base_url("https://api.anthropic.com");
/// ```
pub struct Anthropic {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl Anthropic {
    /// Create a new client with the given API key and sensible defaults.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), base_url: DEFAULT_BASE_URL.into(), client: reqwest::Client::new() }
    }

    /// Override the API base URL (for testing or an API proxy).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

impl Provider for Anthropic {
    fn stream(&self, request: ProviderRequest) -> impl std::future::Future<Output = Result<EventStream, ProviderError>> + Send {
        let url = self.messages_url();
        let api_key = self.api_key.clone();
        let http_client = self.client.clone();
        let mut body = to_api_request(&request);
        if body.model.is_empty() {
            body.model = DEFAULT_MODEL.to_string();
        }

        async move {
            tracing::debug!(url = %url, model = %body.model, "sending streaming completion request");

            let response = http_client
                .post(&url)
                .header("x-api-key", &api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
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
    }

    fn model_name<'a>(&self, request: &'a ProviderRequest) -> &'a str {
        if request.model.is_empty() { DEFAULT_MODEL } else { &request.model }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url_is_set() {
        let client = Anthropic::new("test-key");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn builder_overrides_base_url() {
        let client = Anthropic::new("test-key").base_url("http://localhost:9999");
        assert_eq!(client.base_url, "http://localhost:9999");
    }

    #[test]
    fn messages_url_includes_path() {
        let client = Anthropic::new("test-key").base_url("http://localhost:9999");
        assert_eq!(client.messages_url(), "http://localhost:9999/v1/messages");
    }

    #[test]
    fn model_name_falls_back_to_default_when_request_is_empty() {
        let client = Anthropic::new("test-key");
        let request = ProviderRequest::default();
        assert_eq!(client.model_name(&request), DEFAULT_MODEL);
    }

    #[test]
    fn model_name_uses_the_request_model_when_set() {
        let client = Anthropic::new("test-key");
        let request = ProviderRequest { model: "claude-opus-4-5".into(), ..Default::default() };
        assert_eq!(client.model_name(&request), "claude-opus-4-5");
    }
}
