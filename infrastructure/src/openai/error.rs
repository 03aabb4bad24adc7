//! Error types for the OpenAI-compatible HTTP adapter

use combiner_application::GatewayError;
use thiserror::Error;

/// Result type alias for HTTP adapter operations
pub type Result<T> = std::result::Result<T, HttpClientError>;

/// Errors that can occur when talking to the completions endpoint
#[derive(Error, Debug)]
pub enum HttpClientError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model not found upstream: {0}")]
    UnknownModel(String),

    #[error("Response missing expected field: {0}")]
    MissingField(&'static str),

    #[error("Stream error: {0}")]
    Stream(String),
}

impl From<HttpClientError> for GatewayError {
    fn from(e: HttpClientError) -> Self {
        match e {
            HttpClientError::Transport(e) if e.is_timeout() => GatewayError::Timeout,
            HttpClientError::Transport(e) => GatewayError::ConnectionError(e.to_string()),
            HttpClientError::Serialization(e) => GatewayError::MalformedResponse(e.to_string()),
            HttpClientError::Status { status, body } => GatewayError::HttpStatus { status, body },
            HttpClientError::UnknownModel(model) => GatewayError::ModelNotAvailable(model),
            HttpClientError::MissingField(field) => {
                GatewayError::MalformedResponse(format!("missing {}", field))
            }
            HttpClientError::Stream(msg) => GatewayError::RequestFailed(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_maps_to_http_status() {
        let e: GatewayError = HttpClientError::Status {
            status: 503,
            body: "busy".into(),
        }
        .into();
        assert_eq!(
            e,
            GatewayError::HttpStatus {
                status: 503,
                body: "busy".into()
            }
        );
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let e: GatewayError = HttpClientError::MissingField("choices[0].message.content").into();
        assert!(matches!(e, GatewayError::MalformedResponse(_)));
    }

    #[test]
    fn test_bad_json_is_malformed() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let e: GatewayError = HttpClientError::from(err).into();
        assert!(matches!(e, GatewayError::MalformedResponse(_)));
    }
}
