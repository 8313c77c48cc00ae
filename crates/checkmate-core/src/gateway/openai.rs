//! OpenAI-compatible chat-completions client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{with_timeout, CompletionRequest, GatewayConfig, GatewayError, ModelGateway};
use crate::metrics::METRICS;

/// Pause before retry `n` is `n * RETRY_BACKOFF`.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Extract the first choice's message text from a response body.
pub fn completion_text(body: &str) -> Result<String, GatewayError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(GatewayError::EmptyCompletion)
}

/// Gateway for any endpoint that speaks `/chat/completions`
pub struct OpenAiGateway {
    config: GatewayConfig,
    http_client: reqwest::Client,
}

impl OpenAiGateway {
    /// Create a new client
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("checkmate/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(OpenAiGateway {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::new(GatewayConfig::from_env()?)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn attempt(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_output_tokens,
        };

        let response = self
            .http_client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        completion_text(&text)
    }
}

#[async_trait]
impl ModelGateway for OpenAiGateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let mut attempt = 0u32;
        loop {
            METRICS.inc_gateway_calls();
            debug!(model = %self.config.model, attempt, "sending completion request");

            match with_timeout(self.config.timeout, self.attempt(request)).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable() && attempt < self.config.retries => {
                    attempt += 1;
                    warn!(error = %err, attempt, "retrying completion request");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_text_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"score\": 90}"}},{"message":{"content":"second"}}]}"#;
        assert_eq!(completion_text(body).unwrap(), "{\"score\": 90}");
    }

    #[test]
    fn test_completion_text_empty() {
        assert_eq!(
            completion_text(r#"{"choices":[]}"#).unwrap_err(),
            GatewayError::EmptyCompletion
        );
        assert_eq!(
            completion_text(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap_err(),
            GatewayError::EmptyCompletion
        );
    }

    #[test]
    fn test_completion_text_malformed() {
        assert!(matches!(
            completion_text("<html>bad gateway</html>"),
            Err(GatewayError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "prompt",
                },
            ],
            temperature: 0.3,
            max_tokens: 1400,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["max_tokens"], 1400);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let config = GatewayConfig::new("sk-test")
            .with_base_url("http://127.0.0.1:9")
            .with_retries(0)
            .with_timeout(Duration::from_secs(5));
        let gateway = OpenAiGateway::new(config).unwrap();
        let err = gateway
            .complete(&CompletionRequest::new("hi"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, GatewayError::Transport(_) | GatewayError::Timeout(_)),
            "{err:?}"
        );
    }
}
