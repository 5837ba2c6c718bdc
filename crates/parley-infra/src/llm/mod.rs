//! Model provider implementations.
//!
//! Contains concrete implementations of the [`LlmProvider`] trait defined
//! in `parley-core` (Anthropic Claude and an offline mock), plus a factory
//! ([`create_provider`]) that picks one from [`LlmSettings`].
//!
//! [`LlmProvider`]: parley_core::llm::provider::LlmProvider

pub mod anthropic;
pub mod mock;

use secrecy::SecretString;
use tracing::info;

use parley_core::llm::box_provider::BoxLlmProvider;
use parley_types::config::LlmSettings;
use parley_types::llm::LlmError;

use self::anthropic::AnthropicProvider;
use self::mock::MockLlmProvider;

/// Create a [`BoxLlmProvider`] from [`LlmSettings`].
///
/// # Errors
///
/// Returns `LlmError::AuthenticationFailed` when the real backend is
/// selected but no API key is configured.
pub fn create_provider(settings: &LlmSettings) -> Result<BoxLlmProvider, LlmError> {
    if settings.mock {
        info!("Using mock model backend");
        return Ok(BoxLlmProvider::new(MockLlmProvider::new()));
    }

    let key = settings
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or(LlmError::AuthenticationFailed)?;
    let provider = AnthropicProvider::new(SecretString::from(key.to_string()))?;
    info!(model = %settings.model, "Using Anthropic model backend");
    Ok(BoxLlmProvider::new(provider))
}
