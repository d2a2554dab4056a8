//! Internal error helpers for mapping HTTP/reqwest errors to [`ProviderError`].

use std::time::Duration;

use gllm_types::ProviderError;

/// Map an HTTP status code (from the Gemini API) to a [`ProviderError`].
///
/// Reference: <https://ai.google.dev/gemini-api/docs/troubleshooting>
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::Authentication(extract_message(body)),
        400 => ProviderError::InvalidRequest(extract_message(body)),
        404 => ProviderError::ModelNotFound(extract_message(body)),
        429 => ProviderError::RateLimit { retry_after: None },
        500 | 503 => ProviderError::ServiceUnavailable(extract_message(body)),
        _ => ProviderError::InvalidRequest(format!("HTTP {status}: {body}")),
    }
}

/// Gemini wraps error details in `{"error": {"message": ..., "status": ...}}`;
/// fall back to the raw body if that shape isn't there.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
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
    fn status_401_maps_to_authentication() {
        let body = r#"{"error":{"code":401,"message":"API key not valid","status":"UNAUTHENTICATED"}}"#;
        let err = map_http_status(reqwest::StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, ProviderError::Authentication(msg) if msg == "API key not valid"));
    }

    #[test]
    fn status_404_maps_to_model_not_found() {
        let body = r#"{"error":{"code":404,"message":"model not found","status":"NOT_FOUND"}}"#;
        assert!(matches!(map_http_status(reqwest::StatusCode::NOT_FOUND, body), ProviderError::ModelNotFound(_)));
    }

    #[test]
    fn status_429_maps_to_rate_limit() {
        assert!(matches!(map_http_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "quota exceeded"), ProviderError::RateLimit { retry_after: None }));
    }

    #[test]
    fn status_503_maps_to_service_unavailable_and_is_retryable() {
        let err = map_http_status(reqwest::StatusCode::SERVICE_UNAVAILABLE, "overloaded");
        assert!(matches!(err, ProviderError::ServiceUnavailable(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn non_json_body_is_passed_through_verbatim() {
        let err = map_http_status(reqwest::StatusCode::BAD_REQUEST, "not json");
        assert!(matches!(err, ProviderError::InvalidRequest(msg) if msg == "not json"));
    }
}
