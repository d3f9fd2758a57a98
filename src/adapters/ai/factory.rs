//! Builds the configured provider and executor.

use secrecy::ExposeSecret;
use std::sync::Arc;

use crate::config::{AiConfig, AiProvider};
use crate::ports::{AIError, AIProvider};

use super::{
    AnthropicConfig, AnthropicProvider, MockAIProvider, OpenAIConfig, OpenAIProvider,
    ProviderPromptExecutor,
};

/// Creates the primary provider named by the configuration.
pub fn provider_from_config(config: &AiConfig) -> Result<Arc<dyn AIProvider>, AIError> {
    let provider: Arc<dyn AIProvider> = match config.primary_provider {
        AiProvider::Anthropic => {
            let key = config
                .anthropic_api_key
                .as_ref()
                .ok_or_else(|| AIError::InvalidRequest("ANTHROPIC_API_KEY not set".to_string()))?;
            let anthropic = AnthropicConfig::new(key.expose_secret().clone())
                .with_model(config.anthropic_model.clone())
                .with_timeout(config.timeout())
                .with_default_max_tokens(config.max_tokens);
            Arc::new(AnthropicProvider::new(anthropic)?)
        }
        AiProvider::OpenAI => {
            let key = config
                .openai_api_key
                .as_ref()
                .ok_or_else(|| AIError::InvalidRequest("OPENAI_API_KEY not set".to_string()))?;
            let openai = OpenAIConfig::new(key.expose_secret().clone())
                .with_model(config.openai_model.clone())
                .with_timeout(config.timeout());
            Arc::new(OpenAIProvider::new(openai)?)
        }
        AiProvider::Mock => Arc::new(MockAIProvider::new()),
    };

    let info = provider.provider_info();
    tracing::info!(provider = %info.name, model = %info.model, "AI provider configured");
    Ok(provider)
}

/// Creates a prompt executor over the configured provider.
pub fn executor_from_config(config: &AiConfig) -> Result<ProviderPromptExecutor, AIError> {
    let mut executor = ProviderPromptExecutor::new(provider_from_config(config)?)
        .with_timeout(config.timeout())
        .with_max_tokens(config.max_tokens);
    if let Some(temperature) = config.temperature {
        executor = executor.with_temperature(temperature);
    }
    Ok(executor)
}
