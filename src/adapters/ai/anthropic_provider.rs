//! Anthropic Provider - Implementation of AIProvider for Anthropic's Messages API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = AnthropicConfig::new(api_key)
//!     .with_model("claude-sonnet-4-20250514")
//!     .with_base_url("https://api.anthropic.com");
//!
//! let provider = AnthropicProvider::new(config)?;
//! ```
//!
//! # Structured output
//!
//! When the request carries a response schema, the schema is offered as a
//! single tool and `tool_choice` forces the model to call it. The tool
//! input is returned as the JSON text of the completion.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, TokenUsage,
};

/// Configuration for the Anthropic provider.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "claude-sonnet-4-20250514").
    pub model: String,
    /// Base URL for the API (default: https://api.anthropic.com).
    pub base_url: String,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Token cap applied when the request sets none.
    pub default_max_tokens: u32,
}

impl AnthropicConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(60),
            default_max_tokens: 1024,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the default token cap.
    pub fn with_default_max_tokens(mut self, max_tokens: u32) -> Self {
        self.default_max_tokens = max_tokens;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Placeholder user turn when a conversation starts with the assistant.
const CONVERSATION_START: &str = "(The conversation begins.)";

/// Anthropic API provider implementation.
///
/// Makes exactly one HTTP attempt per call; retry policy belongs to callers.
pub struct AnthropicProvider {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider with the given configuration.
    pub fn new(config: AnthropicConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Builds the messages endpoint URL.
    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    /// Converts our request to Anthropic's format.
    fn to_anthropic_request(&self, request: &CompletionRequest) -> AnthropicRequest {
        let (tools, tool_choice) = match &request.response_schema {
            Some(schema) => (
                Some(vec![AnthropicTool {
                    name: schema.name.clone(),
                    description: "Record the classification of the student's message.".to_string(),
                    input_schema: schema.schema.clone(),
                }]),
                Some(ToolChoice {
                    choice_type: "tool".to_string(),
                    name: schema.name.clone(),
                }),
            ),
            None => (None, None),
        };

        AnthropicRequest {
            model: self.config.model.clone(),
            messages: alternating_messages(&request.messages),
            system: request.system_prompt.clone(),
            max_tokens: request.max_tokens.unwrap_or(self.config.default_max_tokens),
            temperature: request.temperature,
            tools,
            tool_choice,
        }
    }

    /// Sends a request.
    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, AIError> {
        let anthropic_request = self.to_anthropic_request(request);

        self.client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("Content-Type", "application/json")
            .json(&anthropic_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(AIError::AuthenticationFailed),
            429 => Err(AIError::rate_limited(Self::parse_retry_after(&error_body))),
            400 => {
                if error_body.contains("prompt is too long") {
                    Err(AIError::context_too_long(0, self.max_context_tokens()))
                } else {
                    Err(AIError::InvalidRequest(error_body))
                }
            }
            500..=599 => Err(AIError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(AIError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Parses retry-after from error response.
    fn parse_retry_after(error_body: &str) -> u32 {
        if let Ok(parsed) = serde_json::from_str::<Value>(error_body) {
            if let Some(s) = parsed
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
            {
                if let Some(idx) = s.find("try again in ") {
                    let rest = &s[idx + 13..];
                    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
                    if let Ok(secs) = digits.parse::<u32>() {
                        return secs;
                    }
                }
            }
        }
        60
    }

    /// Parses a successful response body.
    async fn parse_response(&self, response: Response) -> Result<CompletionResponse, AIError> {
        let response = self.handle_response_status(response).await?;

        let anthropic_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        into_completion(anthropic_response)
    }

    fn max_context_tokens(&self) -> u32 {
        200_000
    }
}

#[async_trait]
impl AIProvider for AnthropicProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        tracing::debug!(
            trace_id = %request.metadata.trace_id,
            purpose = %request.metadata.purpose,
            structured = request.is_structured(),
            "anthropic completion"
        );
        let response = self.send_request(&request).await?;
        self.parse_response(response).await
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        // Claude models use ~4 characters per token on average
        (text.len() / 4).max(1) as u32
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("anthropic", &self.config.model, self.max_context_tokens())
            .with_structured_output(true)
    }
}

/// Converts role-tagged messages into the strictly alternating
/// user/assistant sequence the Messages API requires.
///
/// System messages are dropped (they travel in `system`), consecutive
/// turns from the same role are merged, and a placeholder user turn is
/// inserted if the sequence would start with the assistant.
fn alternating_messages(messages: &[Message]) -> Vec<AnthropicMessage> {
    let mut result: Vec<AnthropicMessage> = Vec::new();

    for msg in messages {
        let role = match msg.role {
            MessageRole::System => continue,
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        match result.last_mut() {
            Some(last) if last.role == role => {
                last.content.push_str("\n\n");
                last.content.push_str(&msg.content);
            }
            _ => result.push(AnthropicMessage {
                role: role.to_string(),
                content: msg.content.clone(),
            }),
        }
    }

    if result.first().map_or(true, |m| m.role != "user") {
        result.insert(
            0,
            AnthropicMessage {
                role: "user".to_string(),
                content: CONVERSATION_START.to_string(),
            },
        );
    }

    result
}

/// Maps an API response to a completion.
///
/// A `tool_use` block wins over text: its input is the structured output.
fn into_completion(response: AnthropicResponse) -> Result<CompletionResponse, AIError> {
    let tool_input = response
        .content
        .iter()
        .find(|block| block.block_type == "tool_use")
        .and_then(|block| block.input.as_ref());

    let content = match tool_input {
        Some(input) => serde_json::to_string(input)
            .map_err(|e| AIError::parse(format!("Failed to encode tool input: {}", e)))?,
        None => response
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join(""),
    };

    let finish_reason = match response.stop_reason.as_deref() {
        Some("max_tokens") => FinishReason::Length,
        Some("tool_use") => FinishReason::ToolUse,
        Some("refusal") => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    };

    if finish_reason == FinishReason::ContentFilter {
        return Err(AIError::content_filtered("model declined to respond"));
    }

    Ok(CompletionResponse {
        content,
        usage: TokenUsage::new(response.usage.input_tokens, response.usage.output_tokens),
        model: response.model,
        finish_reason,
    })
}

// ----- Anthropic API Types -----

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    choice_type: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
    input: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{RequestMetadata, ResponseSchema};
    use serde_json::json;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(AnthropicConfig::new("test-key")).unwrap()
    }

    #[test]
    fn config_builder_works() {
        let config = AnthropicConfig::new("test-key")
            .with_model("claude-3-opus-20240229")
            .with_base_url("https://custom.api.com")
            .with_timeout(Duration::from_secs(30))
            .with_default_max_tokens(512);

        assert_eq!(config.model, "claude-3-opus-20240229");
        assert_eq!(config.base_url, "https://custom.api.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.default_max_tokens, 512);
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn messages_alternate_starting_with_user() {
        let messages = vec![
            Message::system("ignored"),
            Message::assistant("Opening"),
            Message::user("First"),
            Message::user("Task"),
        ];

        let converted = alternating_messages(&messages);

        assert_eq!(converted.len(), 3);
        assert_eq!(converted[0].role, "user");
        assert_eq!(converted[0].content, CONVERSATION_START);
        assert_eq!(converted[1].role, "assistant");
        assert_eq!(converted[2].content, "First\n\nTask");
    }

    #[test]
    fn structured_request_forces_tool_call() {
        let request = CompletionRequest::new(RequestMetadata::new("t", "closure.classification"))
            .with_message(MessageRole::User, "hi")
            .with_response_schema(ResponseSchema::new("closure_decision", json!({"type": "object"})));

        let body = serde_json::to_value(provider().to_anthropic_request(&request)).unwrap();

        assert_eq!(body["tools"][0]["name"], "closure_decision");
        assert_eq!(body["tool_choice"]["type"], "tool");
        assert_eq!(body["tool_choice"]["name"], "closure_decision");
        assert_eq!(body["max_tokens"], 1024);
    }

    #[test]
    fn text_request_has_no_tools() {
        let request = CompletionRequest::new(RequestMetadata::new("t", "closure.generation"))
            .with_message(MessageRole::User, "hi")
            .with_max_tokens(300);

        let body = serde_json::to_value(provider().to_anthropic_request(&request)).unwrap();

        assert!(body.get("tools").is_none());
        assert_eq!(body["max_tokens"], 300);
    }

    #[test]
    fn tool_use_block_becomes_json_content() {
        let response: AnthropicResponse = serde_json::from_value(json!({
            "model": "claude",
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 10, "output_tokens": 5},
            "content": [
                {"type": "tool_use", "id": "x", "name": "d", "input": {"intent": "TR_CLARIFY"}}
            ]
        }))
        .unwrap();

        let completion = into_completion(response).unwrap();

        assert_eq!(completion.finish_reason, FinishReason::ToolUse);
        assert_eq!(completion.usage.total_tokens, 15);
        let value: Value = serde_json::from_str(&completion.content).unwrap();
        assert_eq!(value["intent"], "TR_CLARIFY");
    }

    #[test]
    fn text_blocks_are_concatenated() {
        let response: AnthropicResponse = serde_json::from_value(json!({
            "model": "claude",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 1, "output_tokens": 1},
            "content": [{"type": "text", "text": "Hello"}, {"type": "text", "text": " there"}]
        }))
        .unwrap();

        assert_eq!(into_completion(response).unwrap().content, "Hello there");
    }

    #[test]
    fn provider_info_reports_structured_output() {
        let info = provider().provider_info();
        assert_eq!(info.name, "anthropic");
        assert_eq!(info.max_context_tokens, 200_000);
        assert!(info.supports_structured_output);
    }

    #[test]
    fn estimate_tokens_approximates() {
        assert_eq!(provider().estimate_tokens("Hi"), 1);
        assert_eq!(provider().estimate_tokens("Hello, world!"), 3);
    }

    #[test]
    fn parse_retry_after_reads_message() {
        let error = r#"{"error":{"message":"Please try again in 12s"}}"#;
        assert_eq!(AnthropicProvider::parse_retry_after(error), 12);
        let error = r#"{"error":{"message":"Rate limit exceeded"}}"#;
        assert_eq!(AnthropicProvider::parse_retry_after(error), 60);
    }
}
