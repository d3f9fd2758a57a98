//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Model providers and the prompt executor built on them
//! - `storage` - Dialogue state stores (in-memory, YAML files)

pub mod ai;
pub mod storage;

pub use ai::{
    executor_from_config, provider_from_config, AnthropicConfig, AnthropicProvider, MockAIProvider,
    OpenAIConfig, OpenAIProvider, ProviderPromptExecutor,
};
pub use storage::{store_from_config, FileDialogueStore, InMemoryDialogueStore};
