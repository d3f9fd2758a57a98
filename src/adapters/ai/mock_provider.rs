//! Scripted AI provider for tests and offline runs.
//!
//! Replies are queued up front and handed out one per `complete` call.
//! Tutor prose is queued with `with_response`, classifier decisions with
//! `with_json`, and provider failures with `with_error`. Once the script
//! is used up every call returns [`DEFAULT_MOCK_RESPONSE`].
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response("Is it ever right to lie?")
//!     .with_json(json!({"intent": "TR_V1_ESTABLISHED", "position": "No", "reason": "Trust"}));
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo,
    TokenUsage,
};

/// Content returned once the script runs out.
pub const DEFAULT_MOCK_RESPONSE: &str = "Mock response";

#[derive(Debug, Clone)]
enum Scripted {
    Reply {
        content: String,
        finish_reason: FinishReason,
    },
    Fail(AIError),
}

/// Provider that plays back a fixed script and records every request.
///
/// Clones share the script and the request log, so a test can hand one
/// clone to the executor and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MockAIProvider {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    delay: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockAIProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a plain text reply.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(Scripted::Reply {
            content: content.into(),
            finish_reason: FinishReason::Stop,
        })
    }

    /// Queues a structured reply, delivered the way tool-use output is.
    pub fn with_json(self, value: Value) -> Self {
        self.push(Scripted::Reply {
            content: value.to_string(),
            finish_reason: FinishReason::ToolUse,
        })
    }

    /// Queues a provider failure.
    pub fn with_error(self, error: AIError) -> Self {
        self.push(Scripted::Fail(error))
    }

    /// Holds every call for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }

    pub fn last_call(&self) -> Option<CompletionRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Scripted replies not yet handed out.
    pub fn remaining(&self) -> usize {
        lock(&self.script).len()
    }

    fn push(self, entry: Scripted) -> Self {
        lock(&self.script).push_back(entry);
        self
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        lock(&self.requests).push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let next = lock(&self.script).pop_front();
        match next {
            Some(Scripted::Fail(err)) => Err(err),
            Some(Scripted::Reply {
                content,
                finish_reason,
            }) => Ok(self.response(content, finish_reason)),
            None => Ok(self.response(DEFAULT_MOCK_RESPONSE.to_string(), FinishReason::Stop)),
        }
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        u32::try_from(text.len() / 4).unwrap_or(u32::MAX).max(1)
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("mock", "mock-dialogue", 128_000).with_structured_output(true)
    }
}

impl MockAIProvider {
    fn response(&self, content: String, finish_reason: FinishReason) -> CompletionResponse {
        let completion_tokens = self.estimate_tokens(&content);
        CompletionResponse {
            content,
            usage: TokenUsage::new(0, completion_tokens),
            model: "mock-dialogue".to_string(),
            finish_reason,
        }
    }
}
