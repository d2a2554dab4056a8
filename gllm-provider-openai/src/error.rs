//! Internal error helpers for mapping HTTP/reqwest errors to [`ProviderError`].

use std::time::Duration;

use gllm_types::ProviderError;

/// Map an HTTP status code (from the OpenAI API) to a [`ProviderError`].
///
/// Reference: <https://platform.openai.com/docs/guides/error-codes>
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::Authentication(body.to_string()),
        400 => ProviderError::InvalidRequest(body.to_string()),
        404 => ProviderError::ModelNotFound(body.to_string()),
        429 => ProviderError::RateLimit { retry_after: parse_retry_after(body) },
        500 | 502 | 503 => ProviderError::ServiceUnavailable(body.to_string()),
        _ => ProviderError::InvalidRequest(format!("HTTP {status}: {body}")),
    }
}

/// Attempt to parse a retry delay from an OpenAI error body.
///
/// OpenAI sometimes includes "Please retry after X seconds" in the error
/// message. Best-effort; returns `None` if no delay can be extracted.
fn parse_retry_after(body: &str) -> Option<Duration> {
    let lower = body.to_lowercase();
    let idx = lower.find("retry after ")?;
    let after = &lower[idx + 12..];
    let num_str: String = after.chars().take_while(|c| c.is_ascii_digit()).collect();
    num_str.parse::<u64>().ok().map(Duration::from_secs)
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
    fn map_401_to_authentication() {
        assert!(matches!(map_http_status(reqwest::StatusCode::UNAUTHORIZED, "bad key"), ProviderError::Authentication(_)));
    }

    #[test]
    fn map_404_to_model_not_found() {
        assert!(matches!(map_http_status(reqwest::StatusCode::NOT_FOUND, "no such model"), ProviderError::ModelNotFound(_)));
    }

    #[test]
    fn map_429_extracts_retry_after_from_body() {
        let err = map_http_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "Please retry after 60 seconds");
        match err {
            ProviderError::RateLimit { retry_after } => assert_eq!(retry_after, Some(Duration::from_secs(60))),
            other => panic!("expected RateLimit, got {other:?}"),
        }
    }

    #[test]
    fn map_500_to_service_unavailable_and_marks_retryable() {
        let err = map_http_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "server error");
        assert!(matches!(err, ProviderError::ServiceUnavailable(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn parse_retry_after_returns_none_without_a_hint() {
        assert_eq!(parse_retry_after("generic error"), None);
    }
}
