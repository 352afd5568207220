//! Gateway for OpenAI-compatible chat completion APIs.
//!
//! Capabilities are advertised as function tools. A reply carrying a tool call
//! becomes a [`Completion::CapabilityIntent`]; anything else is a text answer.

use crate::error::LlmError;
use crate::gateway::{CapabilityManifestEntry, ChatMessage, ChatRole, Completion, LlmGateway};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

/// Configuration for an OpenAI-compatible backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Base URL for the API, without the `/chat/completions` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key.
    pub api_key: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    60
}

impl OpenAiConfig {
    /// Creates a configuration with default endpoint, model and temperature.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: api_key.into(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Gateway backed by an OpenAI-compatible HTTP API.
#[derive(Debug, Clone)]
pub struct OpenAiGateway {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiGateway {
    /// Creates a gateway from its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or the HTTP client cannot be
    /// built.
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::InvalidConfig {
                reason: "API key is not set".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self { client, config })
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn request_body(
        &self,
        messages: &[ChatMessage],
        manifest: Option<&[CapabilityManifestEntry]>,
    ) -> JsonValue {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": messages.iter().map(wire_message).collect::<Vec<_>>(),
        });

        if let Some(entries) = manifest.filter(|entries| !entries.is_empty()) {
            body["tools"] = entries
                .iter()
                .map(|entry| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": entry.name,
                            "description": entry.description,
                            "parameters": entry.parameter_schema,
                        }
                    })
                })
                .collect();
        }

        body
    }
}

fn wire_message(message: &ChatMessage) -> JsonValue {
    match message.role {
        ChatRole::System => serde_json::json!({ "role": "system", "content": message.content }),
        ChatRole::User => serde_json::json!({ "role": "user", "content": message.content }),
        ChatRole::Assistant => {
            serde_json::json!({ "role": "assistant", "content": message.content })
        }
        // Results are sent without a matching tool call, so they travel as
        // tagged system messages.
        ChatRole::Capability => {
            let name = message.name.as_deref().unwrap_or("capability");
            serde_json::json!({
                "role": "system",
                "content": format!("Result from `{name}`:\n{}", message.content),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    function: ResponseFunction,
}

#[derive(Debug, Deserialize)]
struct ResponseFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn parse_completion(body: JsonValue) -> Result<Completion, LlmError> {
    let response: ChatCompletionResponse =
        serde_json::from_value(body).map_err(|e| LlmError::ResponseParseFailed {
            reason: e.to_string(),
        })?;

    let message = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| LlmError::ResponseParseFailed {
            reason: "response contained no choices".to_string(),
        })?;

    if let Some(call) = message.tool_calls.and_then(|calls| calls.into_iter().next()) {
        return Ok(Completion::CapabilityIntent {
            name: call.function.name,
            arguments_json: call.function.arguments,
        });
    }

    Ok(Completion::TextAnswer(message.content.unwrap_or_default()))
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        manifest: Option<&[CapabilityManifestEntry]>,
    ) -> Result<Completion, LlmError> {
        let body = self.request_body(messages, manifest);

        debug!(
            model = %self.config.model,
            messages = messages.len(),
            with_manifest = manifest.is_some(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else if e.is_connect() {
                    LlmError::ProviderUnavailable {
                        provider: self.config.base_url.clone(),
                        reason: e.to_string(),
                    }
                } else {
                    LlmError::RequestFailed {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok());
            return Err(LlmError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                reason: format!("{status}: {text}"),
            });
        }

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| LlmError::ResponseParseFailed {
                reason: e.to_string(),
            })?;

        parse_completion(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> OpenAiGateway {
        OpenAiGateway::new(OpenAiConfig::new("sk-test")).expect("gateway")
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let err = OpenAiGateway::new(OpenAiConfig::new("  ")).unwrap_err();
        assert!(matches!(err, LlmError::InvalidConfig { .. }));
    }

    #[test]
    fn config_defaults() {
        let config: OpenAiConfig =
            serde_json::from_value(serde_json::json!({ "api_key": "k" })).expect("deserialize");
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let gateway = OpenAiGateway::new(
            OpenAiConfig::new("k").with_base_url("http://localhost:8080/v1/"),
        )
        .expect("gateway");
        assert_eq!(
            gateway.endpoint(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn request_body_includes_tools_only_with_manifest() {
        let gateway = gateway();
        let messages = [ChatMessage::system("policy"), ChatMessage::user("hi")];
        let manifest = [CapabilityManifestEntry::new("get_weather_info", "Weather")];

        let with_tools = gateway.request_body(&messages, Some(&manifest));
        assert_eq!(with_tools["tools"][0]["type"], "function");
        assert_eq!(with_tools["tools"][0]["function"]["name"], "get_weather_info");
        assert_eq!(with_tools["messages"][1]["role"], "user");

        let without_tools = gateway.request_body(&messages, None);
        assert!(without_tools.get("tools").is_none());
    }

    #[test]
    fn capability_results_travel_as_tagged_system_messages() {
        let wire = wire_message(&ChatMessage::capability_result("get_hotels_info", "Hotel X"));
        assert_eq!(wire["role"], "system");
        assert_eq!(wire["content"], "Result from `get_hotels_info`:\nHotel X");
    }

    #[test]
    fn parses_text_answer() {
        let body = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "Bonjour" } }]
        });
        assert_eq!(
            parse_completion(body).expect("parse"),
            Completion::TextAnswer("Bonjour".to_string())
        );
    }

    #[test]
    fn parses_tool_call_as_capability_intent() {
        let body = serde_json::json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "get_hotels_info",
                            "arguments": "{\"city\":\"Lisbon\",\"stars\":4}"
                        }
                    }]
                }
            }]
        });

        match parse_completion(body).expect("parse") {
            Completion::CapabilityIntent {
                name,
                arguments_json,
            } => {
                assert_eq!(name, "get_hotels_info");
                assert_eq!(arguments_json, "{\"city\":\"Lisbon\",\"stars\":4}");
            }
            other => panic!("expected capability intent, got {other:?}"),
        }
    }

    #[test]
    fn missing_choices_is_a_parse_failure() {
        let err = parse_completion(serde_json::json!({ "choices": [] })).unwrap_err();
        assert!(matches!(err, LlmError::ResponseParseFailed { .. }));
    }
}
