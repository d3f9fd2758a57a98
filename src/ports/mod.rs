//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - Raw language model completions
//! - `PromptExecutor` - Runs dialogue prompts, validating structured output
//! - `DialogueStateStore` - Load/save of dialogue state per conversation

mod ai_provider;
mod dialogue_state_store;
mod prompt_executor;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata, ResponseSchema, TokenUsage,
};
pub use dialogue_state_store::{DialogueStateStore, StateStoreError};
pub use prompt_executor::{ExecutionOutput, ExecutorError, PromptExecutor};
