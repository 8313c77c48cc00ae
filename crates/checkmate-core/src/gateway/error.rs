//! Error types for model gateway calls

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to the model endpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No API key available
    #[error("OPENAI_API_KEY is not set")]
    MissingCredential,

    /// Offline evaluator asked to reach the model
    #[error("no model gateway is configured")]
    NotConfigured,

    /// Attempt exceeded its deadline
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    /// Connection, TLS or body read failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response had no usable message content
    #[error("model returned an empty completion")]
    EmptyCompletion,

    /// Response body did not match the chat-completions shape
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// Whether another attempt might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Timeout(_) | GatewayError::Transport(_) => true,
            GatewayError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Short stable tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::MissingCredential => "missing_credential",
            GatewayError::NotConfigured => "not_configured",
            GatewayError::Timeout(_) => "timeout",
            GatewayError::Transport(_) => "transport",
            GatewayError::Status { .. } => "status",
            GatewayError::EmptyCompletion => "empty_completion",
            GatewayError::MalformedResponse(_) => "malformed_response",
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let status = |status| GatewayError::Status {
            status,
            body: String::new(),
        };
        assert!(status(429).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!status(400).is_retryable());
    }

    #[test]
    fn test_timeout_and_transport_retry() {
        assert!(GatewayError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(GatewayError::Transport("reset".into()).is_retryable());
        assert!(!GatewayError::MissingCredential.is_retryable());
        assert!(!GatewayError::EmptyCompletion.is_retryable());
    }
}
