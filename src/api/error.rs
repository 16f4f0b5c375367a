//! Errors returned by the backend API wrappers.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Error body shape used by the backend (`{"detail": "..."}`).
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The bearer token was rejected (HTTP 401/403).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-2xx response.
    #[error("HTTP error with status {status}: {message}")]
    Http { status: u16, message: String },

    /// Transport or decoding failure.
    #[error("request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// Local file access failed (uploads).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejected before any request was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    /// Build an error from a non-2xx response, preferring the `detail` field.
    pub async fn from_response(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read response text".to_string());
        Self::from_parts(status, &text)
    }

    /// Classify a status code and raw body.
    pub fn from_parts(status: StatusCode, body: &str) -> ApiError {
        let message = detail_message(body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });
        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
            _ => ApiError::Http {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// True for HTTP 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Short text for toasts.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::NotFound(m) | ApiError::Unauthorized(m) | ApiError::InvalidInput(m) => {
                m.clone()
            }
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Reqwest(_) => "Service unavailable".into(),
            ApiError::Io(e) => e.to_string(),
        }
    }
}

/// Extract `detail` as text. Validation errors carry a list; its first `msg` is used.
fn detail_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Array(items) => items
            .first()
            .and_then(|v| v.get("msg"))
            .and_then(|m| m.as_str())
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_uses_detail() {
        let e = ApiError::from_parts(StatusCode::NOT_FOUND, r#"{"detail":"Job not found"}"#);
        assert!(e.is_not_found());
        assert_eq!(e.user_message(), "Job not found");
    }

    #[test]
    fn test_validation_detail_list() {
        let body = r#"{"detail":[{"loc":["body","credits"],"msg":"field required","type":"missing"}]}"#;
        let e = ApiError::from_parts(StatusCode::UNPROCESSABLE_ENTITY, body);
        match e {
            ApiError::Http { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "field required");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_forbidden_is_unauthorized() {
        let e = ApiError::from_parts(StatusCode::FORBIDDEN, r#"{"detail":"Admin access required"}"#);
        assert!(matches!(e, ApiError::Unauthorized(ref m) if m == "Admin access required"));
    }

    #[test]
    fn test_plain_body_and_empty_body() {
        let e = ApiError::from_parts(StatusCode::BAD_GATEWAY, "upstream down\n");
        assert_eq!(e.user_message(), "upstream down");
        let e = ApiError::from_parts(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(e.user_message(), "Service Unavailable");
    }
}
