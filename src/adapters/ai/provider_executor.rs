//! Prompt executor backed by an `AIProvider`.
//!
//! Translates a dialogue `Prompt` into a completion request, and for
//! classification prompts validates the JSON reply against the prompt's
//! decision schema. A reply that fails validation is retried once with the
//! identical request; an intent outside the stage vocabulary is not.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::dialogue::{DecisionSchema, Prompt, SchemaValidationError, Speaker};
use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, ExecutionOutput, ExecutorError,
    MessageRole, PromptExecutor, RequestMetadata, ResponseSchema,
};

/// Attempts made for a classification prompt before giving up.
pub const DECISION_ATTEMPTS: u32 = 2;

/// Executes prompts through a language model provider.
pub struct ProviderPromptExecutor {
    provider: Arc<dyn AIProvider>,
    timeout: Option<Duration>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl ProviderPromptExecutor {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self {
            provider,
            timeout: None,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Bounds each provider call; expiry surfaces as `AIError::Timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Builds the completion request for a prompt.
    ///
    /// Student turns become user messages, tutor turns assistant messages,
    /// and the task is appended as the final user message.
    fn to_request(&self, prompt: &Prompt, trace_id: &str) -> CompletionRequest {
        let mut request = CompletionRequest::new(RequestMetadata::new(
            trace_id,
            prompt.purpose.to_string(),
        ))
        .with_system_prompt(prompt.instructions.clone());

        for turn in &prompt.turns {
            let role = match turn.speaker {
                Speaker::Student => MessageRole::User,
                Speaker::Tutor => MessageRole::Assistant,
            };
            request = request.with_message(role, turn.content.clone());
        }
        request = request.with_message(MessageRole::User, prompt.task.clone());

        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(schema) = prompt.schema {
            request = request.with_response_schema(ResponseSchema::new(
                schema.name,
                schema.to_json_schema(),
            ));
        }
        request
    }

    async fn call(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.provider.complete(request))
                .await
                .map_err(|_| AIError::Timeout {
                    timeout_secs: whole_seconds(timeout),
                })?,
            None => self.provider.complete(request).await,
        }
    }

    async fn execute_text(&self, request: CompletionRequest) -> Result<ExecutionOutput, ExecutorError> {
        let response = self.call(request).await?;
        let text = response.content.trim();
        if text.is_empty() {
            return Err(ExecutorError::UnexpectedOutput(
                "provider returned empty text".to_string(),
            ));
        }
        Ok(ExecutionOutput::Text(text.to_string()))
    }

    async fn execute_structured(
        &self,
        request: CompletionRequest,
        schema: &DecisionSchema,
    ) -> Result<ExecutionOutput, ExecutorError> {
        let trace_id = request.metadata.trace_id.clone();
        let mut last_failure = ExecutorError::decision_parse("", "no attempt made");

        for attempt in 1..=DECISION_ATTEMPTS {
            let response = self.call(request.clone()).await?;

            match decode_decision(schema, &response.content) {
                Ok(value) => return Ok(ExecutionOutput::Structured(value)),
                Err(e) if e.is_fatal() => {
                    tracing::warn!(
                        trace_id = %trace_id,
                        error = %e,
                        "classifier returned an intent outside the stage vocabulary"
                    );
                    return Err(fatal_decision(e, response.content));
                }
                Err(e) => {
                    tracing::warn!(
                        trace_id = %trace_id,
                        attempt,
                        schema = schema.name,
                        error = %e,
                        "classifier output failed validation"
                    );
                    last_failure = ExecutorError::decision_parse(response.content, e.to_string());
                }
            }
        }

        Err(last_failure)
    }
}

#[async_trait]
impl PromptExecutor for ProviderPromptExecutor {
    async fn execute(&self, prompt: &Prompt) -> Result<ExecutionOutput, ExecutorError> {
        let trace_id = Uuid::new_v4().to_string();
        let request = self.to_request(prompt, &trace_id);

        tracing::debug!(
            trace_id = %trace_id,
            purpose = %prompt.purpose,
            turns = prompt.turns.len(),
            structured = prompt.is_structured(),
            "executing prompt"
        );

        match prompt.schema {
            Some(schema) => self.execute_structured(request, schema).await,
            None => self.execute_text(request).await,
        }
    }
}

/// Whole seconds in a timeout, rounded up.
fn whole_seconds(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis().div_ceil(1000)).unwrap_or(u32::MAX)
}

/// Maps a validation failure that must not be retried.
fn fatal_decision(err: SchemaValidationError, raw: String) -> ExecutorError {
    match err.illegal_intent() {
        Some((intent, stage)) => ExecutorError::IllegalIntent { intent, stage, raw },
        None => ExecutorError::decision_parse(raw, err.to_string()),
    }
}

/// Extracts, parses and validates a classifier reply.
fn decode_decision(schema: &DecisionSchema, content: &str) -> Result<Value, SchemaValidationError> {
    let value: Value = serde_json::from_str(extract_json(content))
        .map_err(|e| SchemaValidationError::Malformed(e.to_string()))?;
    schema.validate(&value)?;
    Ok(value)
}

/// Strips code fences and surrounding prose from a JSON reply.
fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::domain::dialogue::{
        Intent, Stage, StageBuilder, StanceClassifierInput, StanceOpeningInput, TopicContext, Turn,
    };
    use serde_json::json;

    fn topic() -> TopicContext {
        TopicContext::new("Is lying ever justified?").unwrap()
    }

    fn opening_prompt() -> Prompt {
        StageBuilder::StanceOpening(StanceOpeningInput { topic: topic() })
            .build(&[Turn::tutor("Welcome"), Turn::student("Hi")])
    }

    fn stance_classifier_prompt() -> Prompt {
        StageBuilder::StanceClassifier(StanceClassifierInput {
            topic: topic(),
            student_message: "Yes, to save a life.".to_string(),
            clarifying: false,
        })
        .build(&[Turn::student("Yes, to save a life.")])
    }

    fn executor(provider: &MockAIProvider) -> ProviderPromptExecutor {
        ProviderPromptExecutor::new(Arc::new(provider.clone()))
    }

    #[test]
    fn extract_json_handles_fences_and_prose() {
        assert_eq!(extract_json("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json("Here you go: {\"a\":1} done"), "{\"a\":1}");
        assert_eq!(extract_json("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[tokio::test]
    async fn text_prompt_maps_roles_and_appends_task() {
        let provider = MockAIProvider::new().with_response("  Where do you stand?  ");
        let output = executor(&provider)
            .with_max_tokens(200)
            .execute(&opening_prompt())
            .await
            .unwrap();

        assert_eq!(output, ExecutionOutput::Text("Where do you stand?".to_string()));

        let request = provider.last_call().unwrap();
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].role, MessageRole::Assistant);
        assert_eq!(request.messages[1].role, MessageRole::User);
        assert_eq!(request.messages[2].role, MessageRole::User);
        assert_eq!(request.messages[2].content, opening_prompt().task);
        assert_eq!(request.max_tokens, Some(200));
        assert_eq!(request.metadata.purpose, "asking_stance.generation");
        assert!(!request.is_structured());
    }

    #[tokio::test]
    async fn empty_text_is_unexpected() {
        let provider = MockAIProvider::new().with_response("   ");
        let err = executor(&provider)
            .execute(&opening_prompt())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::UnexpectedOutput(_)));
    }

    #[tokio::test]
    async fn structured_prompt_returns_validated_value() {
        let decision = json!({"intent": "TR_V1_ESTABLISHED", "position": "Yes", "reason": "Life"});
        let provider = MockAIProvider::new().with_response(format!("```json\n{}\n```", decision));

        let output = executor(&provider)
            .execute(&stance_classifier_prompt())
            .await
            .unwrap();

        assert_eq!(output, ExecutionOutput::Structured(decision));
        let request = provider.last_call().unwrap();
        assert_eq!(request.response_schema.unwrap().name, "stance_decision");
    }

    #[tokio::test]
    async fn invalid_decision_is_retried_once() {
        let provider = MockAIProvider::new()
            .with_json(json!({"intent": "TR_V1_ESTABLISHED"}))
            .with_json(json!({"intent": "TR_CLARIFY", "clarifying_question": "Why?"}));

        let output = executor(&provider)
            .execute(&stance_classifier_prompt())
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 2);
        assert!(matches!(output, ExecutionOutput::Structured(_)));
        let calls = provider.get_calls();
        assert_eq!(calls[0].messages, calls[1].messages);
    }

    #[tokio::test]
    async fn second_invalid_decision_fails() {
        let provider = MockAIProvider::new()
            .with_response("not json")
            .with_json(json!({"intent": "TR_MAYBE"}))
            .with_json(json!({"intent": "TR_CLARIFY", "clarifying_question": "unused"}));

        let err = executor(&provider)
            .execute(&stance_classifier_prompt())
            .await
            .unwrap_err();

        assert_eq!(provider.call_count(), 2);
        match err {
            ExecutorError::DecisionParse { raw, reason } => {
                assert!(raw.contains("TR_MAYBE"));
                assert!(reason.contains("Unknown intent"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn illegal_intent_is_not_retried() {
        let provider = MockAIProvider::new()
            .with_json(json!({"intent": "TR_CONFIRM_END"}))
            .with_json(json!({"intent": "TR_CLARIFY", "clarifying_question": "unused"}));

        let err = executor(&provider)
            .execute(&stance_classifier_prompt())
            .await
            .unwrap_err();

        assert_eq!(provider.call_count(), 1);
        assert!(matches!(
            err,
            ExecutorError::IllegalIntent {
                intent: Intent::ConfirmEnd,
                stage: Stage::AskingStance,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn provider_errors_surface_without_retry() {
        let provider = MockAIProvider::new()
            .with_error(AIError::network("connection reset"))
            .with_json(json!({"intent": "TR_CLARIFY", "clarifying_question": "unused"}));

        let err = executor(&provider)
            .execute(&stance_classifier_prompt())
            .await
            .unwrap_err();

        assert_eq!(provider.call_count(), 1);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let provider = MockAIProvider::new()
            .with_response("late")
            .with_delay(Duration::from_millis(200));

        let err = executor(&provider)
            .with_timeout(Duration::from_millis(20))
            .execute(&opening_prompt())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExecutorError::Provider(AIError::Timeout { timeout_secs: 1 })
        ));
    }

    #[test]
    fn timeout_seconds_round_up() {
        assert_eq!(whole_seconds(Duration::ZERO), 0);
        assert_eq!(whole_seconds(Duration::from_millis(20)), 1);
        assert_eq!(whole_seconds(Duration::from_millis(1500)), 2);
        assert_eq!(whole_seconds(Duration::from_secs(60)), 60);
    }

    #[test]
    fn nested_illegal_intent_maps_to_illegal_intent() {
        let err = SchemaValidationError::Multiple(vec![
            SchemaValidationError::MissingRequired {
                field: "position".to_string(),
            },
            SchemaValidationError::IllegalIntent {
                intent: Intent::Complete,
                stage: Stage::AskingStance,
            },
        ]);

        match fatal_decision(err, "{\"intent\":\"TR_COMPLETE\"}".to_string()) {
            ExecutorError::IllegalIntent { intent, stage, raw } => {
                assert_eq!(intent, Intent::Complete);
                assert_eq!(stage, Stage::AskingStance);
                assert!(raw.contains("TR_COMPLETE"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
