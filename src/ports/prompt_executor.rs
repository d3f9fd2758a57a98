//! Prompt Executor Port - runs a built prompt against a language model.
//!
//! Generation prompts come back as text. Classification prompts come back
//! as a JSON value already validated against the prompt's decision schema.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::dialogue::{Intent, Prompt, Stage};

use super::AIError;

/// Result of a successful execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutput {
    Text(String),
    Structured(Value),
}

impl ExecutionOutput {
    pub fn into_text(self) -> Option<String> {
        match self {
            ExecutionOutput::Text(text) => Some(text),
            ExecutionOutput::Structured(_) => None,
        }
    }

    pub fn into_structured(self) -> Option<Value> {
        match self {
            ExecutionOutput::Structured(value) => Some(value),
            ExecutionOutput::Text(_) => None,
        }
    }
}

/// Errors surfaced by a prompt executor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutorError {
    #[error("provider error: {0}")]
    Provider(#[from] AIError),

    /// Output did not satisfy the decision schema after the retry.
    #[error("decision could not be parsed: {reason}")]
    DecisionParse { raw: String, reason: String },

    /// Output named an intent that the stage does not allow.
    #[error("intent {intent} is not legal in stage {stage}")]
    IllegalIntent {
        intent: Intent,
        stage: Stage,
        raw: String,
    },

    #[error("unexpected output: {0}")]
    UnexpectedOutput(String),
}

impl ExecutorError {
    pub fn decision_parse(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        ExecutorError::DecisionParse {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the same call may succeed when repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            ExecutorError::Provider(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Raw model output attached to the failure, if any.
    pub fn raw(&self) -> Option<&str> {
        match self {
            ExecutorError::DecisionParse { raw, .. } | ExecutorError::IllegalIntent { raw, .. } => {
                Some(raw)
            }
            _ => None,
        }
    }
}

/// Port for executing prompts.
#[async_trait]
pub trait PromptExecutor: Send + Sync {
    /// Runs the prompt once, retrying a failed decision parse a single time.
    async fn execute(&self, prompt: &Prompt) -> Result<ExecutionOutput, ExecutorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_retryable_provider_errors_are_retryable() {
        assert!(ExecutorError::Provider(AIError::network("reset")).is_retryable());
        assert!(!ExecutorError::Provider(AIError::AuthenticationFailed).is_retryable());
        assert!(!ExecutorError::decision_parse("{}", "missing intent").is_retryable());
    }

    #[test]
    fn raw_output_is_exposed_for_decision_failures() {
        let err = ExecutorError::IllegalIntent {
            intent: Intent::ConfirmEnd,
            stage: Stage::AskingStance,
            raw: "{\"intent\":\"TR_CONFIRM_END\"}".to_string(),
        };
        assert_eq!(err.raw(), Some("{\"intent\":\"TR_CONFIRM_END\"}"));
        assert_eq!(ExecutorError::UnexpectedOutput("x".into()).raw(), None);
    }

    #[test]
    fn output_accessors() {
        assert_eq!(
            ExecutionOutput::Text("hi".into()).into_text(),
            Some("hi".to_string())
        );
        assert!(ExecutionOutput::Text("hi".into()).into_structured().is_none());
    }
}
