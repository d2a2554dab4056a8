//! A single [`Provider`] that can speak to any configured provider family.
//!
//! [`Driver`](gllm_provider::Driver) is generic over `P: Provider`, and
//! `Provider` is deliberately not object-safe (see its doc comment in
//! `gllm-provider`). A session that lets agents pick their own provider at
//! runtime still needs one concrete type to hand to `Driver`, so `AnyProvider`
//! wraps each provider family and matches on it from inside `stream`'s async
//! body, where the match doesn't leak into the return type.

use gllm_provider::{EventStream, Provider};
use gllm_provider_anthropic::Anthropic;
use gllm_provider_gemini::Gemini;
use gllm_provider_openai::OpenAi;
use gllm_types::{CompletionRequest, ProviderError};

use crate::config::ProviderKind;

/// Credentials for each provider family, read once at session start.
#[derive(Debug, Clone, Default)]
pub struct ProviderSecrets {
    /// `OPENAI_API_KEY`.
    pub openai_api_key: Option<String>,
    /// `ANTHROPIC_API_KEY`.
    pub anthropic_api_key: Option<String>,
    /// `GEMINI_API_KEY`.
    pub gemini_api_key: Option<String>,
}

impl ProviderSecrets {
    /// Read credentials from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
        }
    }

    fn key_for(&self, kind: ProviderKind) -> Result<&str, ProviderError> {
        let key = match kind {
            ProviderKind::OpenAi => &self.openai_api_key,
            ProviderKind::Anthropic => &self.anthropic_api_key,
            ProviderKind::Gemini => &self.gemini_api_key,
        };
        key.as_deref().ok_or_else(|| ProviderError::Authentication(format!("no API key configured for {kind:?}")))
    }
}

/// A provider backed by one of the three supported provider families.
pub enum AnyProvider {
    /// OpenAI Chat Completions.
    OpenAi(OpenAi),
    /// Anthropic Messages.
    Anthropic(Anthropic),
    /// Google Gemini `generateContent`.
    Gemini(Gemini),
}

impl AnyProvider {
    /// Build the provider named by `kind`, authenticating from `secrets`.
    pub fn new(kind: ProviderKind, secrets: &ProviderSecrets) -> Result<Self, ProviderError> {
        let key = secrets.key_for(kind)?;
        Ok(match kind {
            ProviderKind::OpenAi => AnyProvider::OpenAi(OpenAi::new(key)),
            ProviderKind::Anthropic => AnyProvider::Anthropic(Anthropic::new(key)),
            ProviderKind::Gemini => AnyProvider::Gemini(Gemini::new(key)),
        })
    }
}

impl Provider for AnyProvider {
    async fn stream(&self, request: CompletionRequest) -> Result<EventStream, ProviderError> {
        match self {
            AnyProvider::OpenAi(provider) => provider.stream(request).await,
            AnyProvider::Anthropic(provider) => provider.stream(request).await,
            AnyProvider::Gemini(provider) => provider.stream(request).await,
        }
    }

    fn model_name<'a>(&self, request: &'a CompletionRequest) -> &'a str {
        match self {
            AnyProvider::OpenAi(provider) => provider.model_name(request),
            AnyProvider::Anthropic(provider) => provider.model_name(request),
            AnyProvider::Gemini(provider) => provider.model_name(request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_reported_as_authentication_error() {
        let secrets = ProviderSecrets::default();
        let err = AnyProvider::new(ProviderKind::OpenAi, &secrets).unwrap_err();
        assert!(matches!(err, ProviderError::Authentication(_)));
    }

    #[test]
    fn configured_key_builds_the_matching_variant() {
        let secrets = ProviderSecrets { anthropic_api_key: Some("sk-ant-test".into()), ..Default::default() };
        let provider = AnyProvider::new(ProviderKind::Anthropic, &secrets).unwrap();
        assert!(matches!(provider, AnyProvider::Anthropic(_)));
    }
}
