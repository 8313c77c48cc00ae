//! Model gateway: the single suspending collaborator of a run.
//!
//! [`ModelGateway`] is the seam. [`OpenAiGateway`] speaks the
//! chat-completions protocol and [`CachedGateway`] memoises identical
//! prompts in front of any gateway.

pub mod cache;
pub mod config;
pub mod error;
pub mod openai;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::prompt::SYSTEM_INSTRUCTION;

pub use cache::{CachedGateway, PromptDigest, ResponseCache};
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use openai::OpenAiGateway;

/// One system + user message pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
}

impl CompletionRequest {
    /// Request with the fixed grading system instruction.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: SYSTEM_INSTRUCTION.to_string(),
            prompt: prompt.into(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }
}

/// Anything that can turn a prompt into model text.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError>;
}

/// Bound `fut` by `limit`; expiry becomes [`GatewayError::Timeout`].
pub async fn with_timeout<F, T>(limit: Duration, fut: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_system_instruction() {
        let req = CompletionRequest::new("hello");
        assert_eq!(req.system, SYSTEM_INSTRUCTION);
        assert_eq!(req.prompt, "hello");
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_expires() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(120)).await;
            Ok::<_, GatewayError>("late".to_string())
        };
        let err = with_timeout(Duration::from_secs(60), slow).await.unwrap_err();
        assert_eq!(err, GatewayError::Timeout(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let fast = async { Ok::<_, GatewayError>(7) };
        assert_eq!(with_timeout(Duration::from_secs(1), fast).await.unwrap(), 7);
    }
}
