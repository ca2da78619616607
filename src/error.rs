//! Error types for gemini-relay.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gemini-relay.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Client sent no usable message. Rendered verbatim as the reply.
    #[error("{0}")]
    BadRequest(String),

    /// Gemini answered with a non-2xx status.
    #[error("{status} {message}")]
    UpstreamStatus { status: u16, message: String },

    /// Transport failure or undecodable upstream body.
    #[error("{}", source_chain(.0))]
    Upstream(#[from] reqwest::Error),

    /// Request body could not be read (e.g. over the configured size limit).
    #[error("{message}")]
    Body { status: StatusCode, message: String },

    /// Failure reported by a content generator, message kept as-is.
    #[error("{0}")]
    Generation(String),
}

impl Error {
    /// Status used when an upstream failure is surfaced as a distinct status.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Body { status, .. } => *status,
            Error::UpstreamStatus { .. } | Error::Upstream(_) | Error::Generation(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    /// The `"Error: <message>"` text placed in the reply field.
    pub fn reply_text(&self) -> String {
        format!("Error: {}", self)
    }
}

/// Render an error and its `source()` chain as `outer: inner: ...`.
///
/// A source whose text the previous level already includes is skipped.
fn source_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut current = err.source();
    while let Some(source) = current {
        let text = source.to_string();
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        current = source.source();
    }
    rendered
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Clients only read `reply`; the error object is extra detail.
        let body = match &self {
            Error::BadRequest(message) => serde_json::json!({ "reply": message }),
            _ => serde_json::json!({
                "reply": self.reply_text(),
                "error": {
                    "message": self.to_string(),
                    "code": status.as_u16()
                }
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_keeps_message() {
        let err = Error::Generation("boom".to_string());
        assert_eq!(err.reply_text(), "Error: boom");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_upstream_status_display() {
        let err = Error::UpstreamStatus {
            status: 400,
            message: "API key not valid. Please pass a valid API key.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "400 API key not valid. Please pass a valid API key."
        );
    }

    #[test]
    fn test_source_chain_includes_causes() {
        let inner = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Connection refused");
        assert_eq!(
            source_chain(&WrappedError(inner)),
            "wrapped: Connection refused"
        );
    }

    #[test]
    fn test_source_chain_skips_repeated_text() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "timed out");
        let err = RepeatingError(inner);
        assert_eq!(source_chain(&err), "request failed: timed out");
    }

    #[derive(Debug)]
    struct WrappedError<E>(E);

    impl<E: std::error::Error + 'static> std::fmt::Display for WrappedError<E> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "wrapped")
        }
    }

    impl<E: std::error::Error + 'static> std::error::Error for WrappedError<E> {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[derive(Debug)]
    struct RepeatingError(std::io::Error);

    impl std::fmt::Display for RepeatingError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "request failed: {}", self.0)
        }
    }

    impl std::error::Error for RepeatingError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_body_error_keeps_status() {
        let err = Error::Body {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "length limit exceeded".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.reply_text(), "Error: length limit exceeded");
    }

    #[test]
    fn test_bad_request_is_400() {
        let response = Error::BadRequest("Please send a message.".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
