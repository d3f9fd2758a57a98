//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port for various LLM providers, and
//! the prompt executor that runs dialogue prompts through them.
//!
//! ## Available Adapters
//!
//! - `MockAIProvider` - Scripted mock for testing
//! - `OpenAIProvider` - OpenAI chat models
//! - `AnthropicProvider` - Anthropic Claude models
//! - `ProviderPromptExecutor` - `PromptExecutor` over any provider

mod anthropic_provider;
mod factory;
mod mock_provider;
mod openai_provider;
mod provider_executor;

pub use anthropic_provider::{AnthropicConfig, AnthropicProvider};
pub use factory::{executor_from_config, provider_from_config};
pub use mock_provider::{MockAIProvider, DEFAULT_MOCK_RESPONSE};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
pub use provider_executor::{ProviderPromptExecutor, DECISION_ATTEMPTS};
