//! Internal error helpers for mapping HTTP/reqwest errors to [`ProviderError`].

use std::time::Duration;

use gllm_types::ProviderError;

/// Map an HTTP status code (from the Anthropic API) to a [`ProviderError`].
///
/// Reference: <https://docs.anthropic.com/en/api/errors>
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> ProviderError {
    match status.as_u16() {
        401 => ProviderError::Authentication(body.to_string()),
        400 => ProviderError::InvalidRequest(body.to_string()),
        404 => ProviderError::ModelNotFound(body.to_string()),
        429 => ProviderError::RateLimit { retry_after: None },
        // 529 is Anthropic's own overloaded status, distinct from the 5xx range.
        529 => ProviderError::ServiceUnavailable(body.to_string()),
        500..=528 | 530..=599 => ProviderError::ServiceUnavailable(body.to_string()),
        _ => ProviderError::InvalidRequest(format!("HTTP {status}: {body}")),
    }
}

/// Map a [`reqwest::Error`] to a [`ProviderError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(Duration::from_secs(30))
    } else {
        ProviderError::Network(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overloaded_status_maps_to_service_unavailable() {
        let status = reqwest::StatusCode::from_u16(529).unwrap();
        assert!(matches!(map_http_status(status, "overloaded"), ProviderError::ServiceUnavailable(_)));
    }

    #[test]
    fn auth_failure_maps_to_authentication() {
        let status = reqwest::StatusCode::from_u16(401).unwrap();
        assert!(matches!(map_http_status(status, "bad key"), ProviderError::Authentication(_)));
    }

    #[test]
    fn rate_limit_status_has_no_retry_hint_without_headers() {
        let status = reqwest::StatusCode::from_u16(429).unwrap();
        assert!(matches!(map_http_status(status, "slow down"), ProviderError::RateLimit { retry_after: None }));
    }
}
