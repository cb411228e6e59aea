//! Narrative generation via a hosted chat-completion service.
//!
//! [`NarrativeGenerator`] builds the snow day prompt from the forecast,
//! submits it through a [`ChatBackend`], and returns the text of the
//! first completion choice. Temperature is deliberately low to bias
//! toward consistent, non-creative probability estimates, and the output
//! length is bounded so the narrative stays renderable and inside the
//! run deadline.

use std::sync::Arc;

use reqwest::Client;

use crate::backend::{ChatBackend, ChatRequest};
use crate::error::{PipelineError, Result};
use crate::prompt;
use crate::types::DayRecord;

const DEFAULT_MODEL: &str = "mistral-small-latest";
const DEFAULT_TEMPERATURE: f64 = 0.2;
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Chat-completion client for the snow day narrative.
pub struct NarrativeGenerator {
    backend: Arc<dyn ChatBackend>,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl NarrativeGenerator {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the output length bound.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Request the day-by-day narrative for the forecast.
    ///
    /// The caller-supplied key is sent as the bearer credential. An
    /// empty completion is reported as a malformed response.
    pub async fn generate(
        &self,
        client: &Client,
        city: &str,
        state: &str,
        days: &[DayRecord],
        api_key: &str,
    ) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            system_prompt: Some(prompt::SYSTEM_PROMPT.to_string()),
            prompt: prompt::build_user_prompt(city, state, days),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            api_key: api_key.to_string(),
        };

        tracing::debug!(
            "Requesting narrative from {} for {} day(s)",
            self.backend.name(),
            days.len()
        );
        let response = self.backend.complete(client, &request).await?;
        if response.text.trim().is_empty() {
            return Err(PipelineError::MalformedResponse(
                "narrative service returned empty content".into(),
            ));
        }
        Ok(response.text)
    }
}

impl std::fmt::Debug for NarrativeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrativeGenerator")
            .field("backend", &self.backend.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ChatResponse, MockBackend};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn sample_days() -> Vec<DayRecord> {
        vec![DayRecord {
            date: "2026-01-17".into(),
            max_temp_f: 18.0,
            min_temp_f: 3.0,
            precipitation_in: 0.4,
            snowfall_in: 5.1,
            max_wind_mph: 22.0,
        }]
    }

    /// Captures the request it receives so tests can inspect it.
    struct CapturingBackend {
        seen: Mutex<Option<ChatRequest>>,
    }

    #[async_trait]
    impl ChatBackend for CapturingBackend {
        async fn complete(&self, _client: &Client, request: &ChatRequest) -> Result<ChatResponse> {
            *self.seen.lock().unwrap() = Some(request.clone());
            Ok(ChatResponse {
                text: "Day 1 (2026-01-17): snow day likely.".into(),
                status: 200,
                metadata: None,
            })
        }

        fn name(&self) -> &'static str {
            "capturing"
        }
    }

    #[tokio::test]
    async fn test_generate_builds_the_chat_request() {
        let backend = Arc::new(CapturingBackend {
            seen: Mutex::new(None),
        });
        let generator = NarrativeGenerator::new(backend.clone());

        let text = generator
            .generate(&Client::new(), "Duluth", "Minnesota", &sample_days(), "sk-test")
            .await
            .unwrap();
        assert!(text.contains("snow day likely"));

        let seen = backend.seen.lock().unwrap().clone().expect("request sent");
        assert_eq!(seen.model, DEFAULT_MODEL);
        assert_eq!(seen.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(seen.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(seen.api_key, "sk-test");
        assert!(seen.system_prompt.as_deref().unwrap().contains("Day N"));
        assert!(seen.prompt.contains("Duluth, Minnesota"));
        assert!(seen.prompt.contains("\"snowfall_in\": 5.1"));
    }

    #[tokio::test]
    async fn test_builder_overrides() {
        let backend = Arc::new(CapturingBackend {
            seen: Mutex::new(None),
        });
        let generator = NarrativeGenerator::new(backend.clone())
            .with_model("mistral-tiny")
            .with_temperature(0.0)
            .with_max_tokens(256);

        generator
            .generate(&Client::new(), "Duluth", "Minnesota", &sample_days(), "sk-test")
            .await
            .unwrap();

        let seen = backend.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.model, "mistral-tiny");
        assert_eq!(seen.temperature, 0.0);
        assert_eq!(seen.max_tokens, 256);
    }

    #[tokio::test]
    async fn test_empty_completion_is_malformed() {
        let generator = NarrativeGenerator::new(Arc::new(MockBackend::fixed("   ")));
        let err = generator
            .generate(&Client::new(), "Duluth", "Minnesota", &sample_days(), "sk-test")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MalformedResponse(_)));
    }
}
