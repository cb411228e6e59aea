//! Backend for the Mistral chat-completion API.
//!
//! Endpoint: `/v1/chat/completions`. Authentication: the run's API key
//! as `Authorization: Bearer {key}`. Unauthorized and rate-limited
//! statuses map to their own error variants so the error view can show
//! the right remediation copy.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{ChatBackend, ChatRequest, ChatResponse};
use crate::error::{PipelineError, Result};

const MISTRAL_BASE_URL: &str = "https://api.mistral.ai";

/// Backend for the hosted Mistral chat-completion service.
#[derive(Debug, Clone)]
pub struct MistralBackend {
    base_url: String,
}

impl MistralBackend {
    pub fn new() -> Self {
        Self {
            base_url: MISTRAL_BASE_URL.to_string(),
        }
    }

    /// Point the backend at a different endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the messages array for the chat request.
    fn build_messages(request: &ChatRequest) -> Vec<Value> {
        let mut messages = Vec::new();
        if let Some(ref sys) = request.system_prompt {
            if !sys.is_empty() {
                messages.push(json!({"role": "system", "content": sys}));
            }
        }
        messages.push(json!({"role": "user", "content": request.prompt}));
        messages
    }

    /// Build the request body for `/v1/chat/completions`.
    fn build_body(request: &ChatRequest) -> Value {
        json!({
            "model": request.model,
            "messages": Self::build_messages(request),
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }

    /// Extract metadata from a completion response.
    fn extract_metadata(json_resp: &Value) -> Option<Value> {
        let mut meta = serde_json::Map::new();
        for key in ["usage", "model", "id"] {
            if let Some(v) = json_resp.get(key) {
                meta.insert(key.into(), v.clone());
            }
        }
        if meta.is_empty() {
            None
        } else {
            Some(Value::Object(meta))
        }
    }
}

impl Default for MistralBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for MistralBackend {
    async fn complete(&self, client: &Client, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let body = Self::build_body(request);

        let resp = client
            .post(&url)
            .header("Authorization", format!("Bearer {}", request.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                PipelineError::Other(format!(
                    "Failed to connect to narrative service at {}: {}",
                    url, e
                ))
            })?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!("Narrative service returned HTTP {}", status);
            return Err(match status {
                401 => PipelineError::Auth,
                429 => PipelineError::RateLimit,
                _ => PipelineError::Transport { status, body: text },
            });
        }

        let json_resp: Value = resp.json().await?;
        let text = json_resp
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                PipelineError::MalformedResponse(
                    "response contained no completion choices".into(),
                )
            })?
            .to_string();

        Ok(ChatResponse {
            text,
            status,
            metadata: Self::extract_metadata(&json_resp),
        })
    }

    fn name(&self) -> &'static str {
        "mistral"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_request() -> ChatRequest {
        ChatRequest {
            model: "mistral-small-latest".into(),
            system_prompt: Some("You are a meteorologist.".into()),
            prompt: "Will it snow?".into(),
            temperature: 0.2,
            max_tokens: 1024,
            api_key: "sk-test".into(),
        }
    }

    #[test]
    fn test_build_body_shape() {
        let body = MistralBackend::build_body(&test_request());
        assert_eq!(body["model"], "mistral-small-latest");
        assert_eq!(body["temperature"], 0.2);
        assert_eq!(body["max_tokens"], 1024);

        let messages = body["messages"].as_array().expect("messages");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "Will it snow?");
    }

    #[test]
    fn test_build_body_without_system() {
        let mut request = test_request();
        request.system_prompt = None;
        let body = MistralBackend::build_body(&request);
        let messages = body["messages"].as_array().expect("messages");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }

    #[tokio::test]
    async fn test_complete_reads_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "mistral-small-latest"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cmpl-1",
                "model": "mistral-small-latest",
                "choices": [
                    {"message": {"role": "assistant", "content": "Day 1: no closures expected."}}
                ],
                "usage": {"total_tokens": 42}
            })))
            .mount(&server)
            .await;

        let backend = MistralBackend::new().with_base_url(server.uri());
        let response = backend
            .complete(&Client::new(), &test_request())
            .await
            .unwrap();
        assert_eq!(response.text, "Day 1: no closures expected.");
        assert_eq!(response.status, 200);
        let meta = response.metadata.expect("metadata");
        assert_eq!(meta["usage"]["total_tokens"], 42);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let backend = MistralBackend::new().with_base_url(server.uri());
        let err = backend
            .complete(&Client::new(), &test_request())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Auth));
    }

    #[tokio::test]
    async fn test_too_many_requests_maps_to_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let backend = MistralBackend::new().with_base_url(server.uri());
        let err = backend
            .complete(&Client::new(), &test_request())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::RateLimit));
    }

    #[tokio::test]
    async fn test_other_failures_map_to_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let backend = MistralBackend::new().with_base_url(server.uri());
        let err = backend
            .complete(&Client::new(), &test_request())
            .await
            .unwrap_err();
        assert!(
            matches!(err, PipelineError::Transport { status: 503, ref body } if body == "maintenance")
        );
    }

    #[tokio::test]
    async fn test_missing_choices_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let backend = MistralBackend::new().with_base_url(server.uri());
        let err = backend
            .complete(&Client::new(), &test_request())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MalformedResponse(_)));
    }
}
