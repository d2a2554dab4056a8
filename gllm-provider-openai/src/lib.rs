#![deny(missing_docs)]
//! OpenAI Chat Completions API provider.
//!
//! Implements [`gllm_provider::Provider`] against OpenAI's streaming chat
//! completions endpoint, and [`gllm_provider::EmbeddingProvider`] against its
//! embeddings endpoint. Because OpenAI-compatible providers (Volcengine among
//! them) reuse this exact wire shape, any OpenAI-compatible endpoint can be
//! reached by pointing [`OpenAi::base_url`] elsewhere.

mod embeddings;
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
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default OpenAI API base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Client for the OpenAI Chat Completions and Embeddings APIs.
///
/// Implements [`Provider`] and [`gllm_provider::EmbeddingProvider`].
///
/// # Example
///
/// ```no_run
/// use gllm_provider_openai::OpenAi;
///
/// let client = OpenAi::new("sk-...").base_url("https://api.openai.com");
/// ```
pub struct OpenAi {
    api_key: String,
    base_url: String,
    organization: Option<String>,
    client: reqwest::Client,
}

impl OpenAi {
    /// Create a new client with the given API key and sensible defaults.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), base_url: DEFAULT_BASE_URL.into(), organization: None, client: reqwest::Client::new() }
    }

    /// Override the API base URL, for an OpenAI-compatible endpoint or a proxy.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the `OpenAI-Organization` header for multi-org accounts.
    #[must_use]
    pub fn organization(mut self, org_id: impl Into<String>) -> Self {
        self.organization = Some(org_id.into());
        self
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

impl Provider for OpenAi {
    fn stream(&self, request: ProviderRequest) -> impl std::future::Future<Output = Result<EventStream, ProviderError>> + Send {
        let url = self.chat_completions_url();
        let api_key = self.api_key.clone();
        let organization = self.organization.clone();
        let http_client = self.client.clone();
        let mut body = to_api_request(&request);
        if body.model.is_empty() {
            body.model = DEFAULT_MODEL.to_string();
        }

        async move {
            tracing::debug!(url = %url, model = %body.model, "sending streaming completion request");

            let mut req = http_client
                .post(&url)
                .header("authorization", format!("Bearer {api_key}"))
                .header("content-type", "application/json")
                .json(&body);
            if let Some(org) = &organization {
                req = req.header("openai-organization", org);
            }

            let response = req.send().await.map_err(map_reqwest_error)?;

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
        let client = OpenAi::new("test-key");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn builder_overrides_base_url_for_compatible_endpoints() {
        let client = OpenAi::new("test-key").base_url("https://ark.cn-beijing.volces.com/api/v3");
        assert_eq!(client.base_url, "https://ark.cn-beijing.volces.com/api/v3");
    }

    #[test]
    fn chat_completions_url_includes_path() {
        let client = OpenAi::new("test-key").base_url("http://localhost:9999");
        assert_eq!(client.chat_completions_url(), "http://localhost:9999/v1/chat/completions");
    }

    #[test]
    fn model_name_falls_back_to_default_when_request_is_empty() {
        let client = OpenAi::new("test-key");
        let request = ProviderRequest::default();
        assert_eq!(client.model_name(&request), DEFAULT_MODEL);
    }

    #[test]
    fn model_name_uses_the_request_model_when_set() {
        let client = OpenAi::new("test-key");
        let request = ProviderRequest { model: "gpt-4.1".into(), ..Default::default() };
        assert_eq!(client.model_name(&request), "gpt-4.1");
    }
}
