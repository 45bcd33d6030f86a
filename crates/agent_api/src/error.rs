use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentApiError {
    #[error("no candidate endpoints configured")]
    NoEndpoints,

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {0} {1}")]
    Status(StatusCode, String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("all {attempts} endpoints failed (last_error: {last_error:?})")]
    AllEndpointsFailed {
        attempts: usize,
        last_error: Option<String>,
    },

    #[error("request was cancelled")]
    Cancelled,
}

impl AgentApiError {
    /// Returns true for failures that endpoint rotation may recover from.
    #[must_use]
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status(..))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Option<ErrorPayloadValue>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorPayloadValue {
    Text(String),
    Object { message: Option<String> },
}

/// Extract a human-readable message from a non-success response body.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    let fallback = || {
        if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            body.trim().to_string()
        }
    };

    let Ok(parsed) = serde_json::from_str::<ErrorPayload>(body) else {
        return fallback();
    };

    let explicit = match parsed.error {
        Some(ErrorPayloadValue::Text(text)) => Some(text),
        Some(ErrorPayloadValue::Object { message }) => message,
        None => None,
    }
    .or(parsed.detail)
    .or(parsed.message)
    .filter(|message| !message.trim().is_empty());

    explicit.unwrap_or_else(fallback)
}
