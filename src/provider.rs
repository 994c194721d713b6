//! Generation back-ends and their resolution.
//!
//! Two [`GenerationCapability`] implementations ship with the crate:
//!
//! * [`OpenAiChat`] talks to an OpenAI-compatible `/chat/completions`
//!   endpoint over `reqwest`, authenticated with the run's own credential.
//! * [`ProviderGenerator`] wraps any edgequake-llm [`LLMProvider`], which
//!   opens up Anthropic, Gemini, Ollama and the rest of that crate's list.
//!
//! Both classify the raw reply into a [`GenerationResponse`] before
//! returning, so the orchestrator only ever sees `Content` or
//! `Unrecognized`. Blank text is `Unrecognized` for both.

use crate::config::{Credential, GenerationConfig};
use crate::error::{GenerationError, QuizGenError};
use crate::pipeline::llm::{GenerationCapability, GenerationRequest, GenerationResponse};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Pick the back-end for a run, from most to least specific.
///
/// 1. **Pre-built capability** (`config.generator`), used as-is.
/// 2. **Pre-built provider** (`config.provider`), wrapped in a
///    [`ProviderGenerator`].
/// 3. **Named provider** (`config.provider_name`), created through
///    [`ProviderFactory::create_llm_provider`] with `config.model`. The
///    provider reads its API key from its usual environment variable.
/// 4. **Default**: [`OpenAiChat`] with `config.credential`. Without a
///    credential this fails with [`QuizGenError::MissingCredential`].
///
/// Called before the document is read, so a missing credential stops the
/// run before any stage starts.
pub fn resolve_generator(
    config: &GenerationConfig,
) -> Result<Arc<dyn GenerationCapability>, QuizGenError> {
    if let Some(ref generator) = config.generator {
        return Ok(Arc::clone(generator));
    }

    if let Some(ref provider) = config.provider {
        return Ok(Arc::new(ProviderGenerator::new(
            Arc::clone(provider),
            "edgequake-llm",
            config,
        )));
    }

    if let Some(ref name) = config.provider_name {
        let provider =
            ProviderFactory::create_llm_provider(name, &config.model).map_err(|e| {
                QuizGenError::ProviderNotConfigured {
                    provider: name.clone(),
                    hint: format!("{e}"),
                }
            })?;
        info!("Using {} provider with model {}", name, config.model);
        return Ok(Arc::new(ProviderGenerator::new(provider, name, config)));
    }

    let credential = config
        .credential
        .clone()
        .ok_or(QuizGenError::MissingCredential)?;
    info!("Using OpenAI chat completions with model {}", config.model);
    Ok(Arc::new(OpenAiChat::from_config(credential, config)?))
}

// ── OpenAI-compatible HTTP client ────────────────────────────────────────

/// Chat-completions client for OpenAI and compatible servers.
pub struct OpenAiChat {
    client: reqwest::Client,
    endpoint: String,
    credential: Credential,
    model: String,
    temperature: f32,
    max_tokens: Option<usize>,
    timeout_secs: u64,
}

impl OpenAiChat {
    /// Build a client from the run configuration and a credential.
    pub fn from_config(
        credential: Credential,
        config: &GenerationConfig,
    ) -> Result<Self, QuizGenError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| QuizGenError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base_url),
            credential,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.api_timeout_secs,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        let mut body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "user", "content": prompt }
            ]
        });
        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }
}

#[async_trait]
impl GenerationCapability for OpenAiChat {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.credential.expose())
            .json(&self.request_body(&request.prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    GenerationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message: api_error_message(&message),
            });
        }

        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(e) if e.is_timeout() => {
                return Err(GenerationError::Timeout {
                    secs: self.timeout_secs,
                })
            }
            Err(e) => return Ok(GenerationResponse::Unrecognized(format!("body is not JSON: {e}"))),
        };

        Ok(interpret_completion(&body))
    }
}

/// Classify a chat-completions body by `choices[0].message.content`.
pub fn interpret_completion(body: &Value) -> GenerationResponse {
    let Some(choice) = body.get("choices").and_then(|c| c.get(0)) else {
        return GenerationResponse::Unrecognized("response has no choices".into());
    };
    match choice.get("message").and_then(|m| m.get("content")) {
        Some(Value::String(text)) => GenerationResponse::from_text(text.clone()),
        Some(Value::Null) | None => {
            let reason = choice
                .get("finish_reason")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            GenerationResponse::Unrecognized(format!(
                "message has no content (finish_reason: {reason})"
            ))
        }
        Some(other) => GenerationResponse::Unrecognized(format!(
            "message content is {}, not text",
            json_kind(other)
        )),
    }
}

/// Pull `error.message` out of an OpenAI error body, else return it whole.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── edgequake-llm adapter ────────────────────────────────────────────────

/// Adapter from an edgequake-llm provider to [`GenerationCapability`].
pub struct ProviderGenerator {
    provider: Arc<dyn LLMProvider>,
    label: String,
    options: CompletionOptions,
}

impl ProviderGenerator {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        label: impl Into<String>,
        config: &GenerationConfig,
    ) -> Self {
        Self {
            provider,
            label: label.into(),
            options: build_options(config),
        }
    }
}

#[async_trait]
impl GenerationCapability for ProviderGenerator {
    fn name(&self) -> &str {
        &self.label
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let messages = vec![ChatMessage::user(request.prompt.as_str())];
        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| GenerationError::Provider(e.to_string()))?;

        debug!(
            "Segment {}: {} input tokens, {} output tokens",
            request.segment_index + 1,
            response.prompt_tokens,
            response.completion_tokens
        );

        Ok(GenerationResponse::from_text(response.content))
    }
}

/// Build `CompletionOptions` from the run config.
fn build_options(config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_string_is_recognised() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "Domanda"}}]});
        assert_eq!(
            interpret_completion(&body),
            GenerationResponse::Content("Domanda".into())
        );
    }

    #[test]
    fn null_content_is_unrecognised() {
        let body = json!({"choices": [{"message": {"content": null}, "finish_reason": "content_filter"}]});
        match interpret_completion(&body) {
            GenerationResponse::Unrecognized(d) => assert!(d.contains("content_filter"), "{d}"),
            other => panic!("expected Unrecognized, got {other:?}"),
        }
    }

    #[test]
    fn blank_content_is_unrecognised() {
        for content in ["", "  \n\t"] {
            let body = json!({"choices": [{"message": {"content": content}}]});
            assert!(
                matches!(interpret_completion(&body), GenerationResponse::Unrecognized(_)),
                "{content:?}"
            );
        }
    }

    #[test]
    fn missing_choices_is_unrecognised() {
        assert!(matches!(
            interpret_completion(&json!({"object": "error"})),
            GenerationResponse::Unrecognized(_)
        ));
        assert!(matches!(
            interpret_completion(&json!({"choices": []})),
            GenerationResponse::Unrecognized(_)
        ));
    }

    #[test]
    fn non_text_content_is_unrecognised() {
        let body = json!({"choices": [{"message": {"content": [{"type": "image"}]}}]});
        match interpret_completion(&body) {
            GenerationResponse::Unrecognized(d) => assert!(d.contains("an array")),
            other => panic!("expected Unrecognized, got {other:?}"),
        }
    }

    #[test]
    fn api_error_message_extracted() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(api_error_message(body), "Incorrect API key provided");
        assert_eq!(api_error_message("  Bad Gateway "), "Bad Gateway");
    }

    #[test]
    fn request_body_shape() {
        let config = GenerationConfig::builder()
            .api_key("k")
            .model("gpt-4o")
            .temperature(0.5)
            .max_tokens(256)
            .build()
            .unwrap();
        let client = OpenAiChat::from_config(config.credential.clone().unwrap(), &config).unwrap();
        let body = client.request_body("ciao");
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "ciao");
        assert_eq!(client.endpoint, "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn missing_credential_is_fatal() {
        let config = GenerationConfig::default();
        assert!(matches!(
            resolve_generator(&config),
            Err(QuizGenError::MissingCredential)
        ));
    }

    #[test]
    fn build_options_from_config() {
        let config = GenerationConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.7));
        assert_eq!(opts.max_tokens, None);
    }
}
