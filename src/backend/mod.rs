//! Chat-completion backend trait and normalized request/response types.
//!
//! The [`ChatBackend`] trait abstracts over hosted chat-completion
//! providers, translating between the normalized [`ChatRequest`] /
//! [`ChatResponse`] types and the provider's HTTP API. Built-in
//! implementations: [`MistralBackend`] and the test-oriented
//! [`MockBackend`].

pub mod mistral;
pub mod mock;

pub use mistral::MistralBackend;
pub use mock::MockBackend;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;

/// A normalized chat-completion request.
///
/// The caller-supplied API key travels with the request, not the
/// backend: every run may carry a different credential.
#[derive(Clone)]
pub struct ChatRequest {
    /// Model identifier (e.g. `"mistral-small-latest"`).
    pub model: String,

    /// System instruction, sent as the first message when present.
    pub system_prompt: Option<String>,

    /// The user prompt text.
    pub prompt: String,

    /// Sampling temperature. Kept low for consistent probability
    /// estimates.
    pub temperature: f64,

    /// Output length bound.
    pub max_tokens: u32,

    /// Bearer credential supplied by the caller.
    pub api_key: String,
}

impl std::fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRequest")
            .field("model", &self.model)
            .field("has_system", &self.system_prompt.is_some())
            .field("prompt_len", &self.prompt.len())
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

/// Keep a short identifying prefix, hide the rest.
fn redact(key: &str) -> String {
    if key.len() > 6 {
        format!("{}***", &key[..6])
    } else {
        "***".to_string()
    }
}

/// A normalized chat-completion response.
#[derive(Debug)]
pub struct ChatResponse {
    /// Text content of the first completion choice.
    pub text: String,

    /// HTTP status code (for diagnostics/logging).
    pub status: u16,

    /// Provider-specific metadata (token usage, model, request id).
    pub metadata: Option<serde_json::Value>,
}

/// Abstraction over chat-completion providers.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as
/// `Arc<dyn ChatBackend>`.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Execute a non-streaming chat-completion call.
    async fn complete(&self, client: &Client, request: &ChatRequest) -> Result<ChatResponse>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let request = ChatRequest {
            model: "mistral-small-latest".into(),
            system_prompt: None,
            prompt: "forecast".into(),
            temperature: 0.2,
            max_tokens: 1024,
            api_key: "sk-1234567890abcdef".into(),
        };
        let rendered = format!("{:?}", request);
        assert!(
            !rendered.contains("1234567890abcdef"),
            "API key must not appear in Debug output"
        );
        assert!(rendered.contains("sk-123"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_short_key_fully_redacted() {
        assert_eq!(redact("abc"), "***");
    }
}
