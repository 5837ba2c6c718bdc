//! Configuration types for Parley.
//!
//! `ParleyConfig` represents the top-level `config.toml` that selects the
//! model backend and sizes the conversation budgets. All fields have
//! defaults, so an empty file (or no file) is a valid configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Parley server.
///
/// Loaded from `~/.parley/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub chat: ChatConfig,
}

/// Model backend selection.
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Model identifier sent upstream.
    #[serde(default = "default_model")]
    pub model: String,

    /// Serve canned responses from the mock backend instead of a real model.
    #[serde(default)]
    pub mock: bool,

    /// Anthropic API key. Usually supplied through `ANTHROPIC_API_KEY` instead.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_model() -> String {
    "claude-3-sonnet-20240229".to_string()
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            mock: false,
            api_key: None,
        }
    }
}

// The key never appears in Debug output.
impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("model", &self.model)
            .field("mock", &self.mock)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Budgets and framing sizes for a chat turn.
///
/// Passed into the truncator and the streaming engine at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Estimated history size above which truncation kicks in.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Size the history is cut down to once truncation triggers.
    #[serde(default = "default_target_tokens")]
    pub target_tokens: u32,

    /// Cap on the length of the model's reply.
    #[serde(default = "default_max_response_tokens")]
    pub max_response_tokens: u32,

    /// Characters per outgoing chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Capacity of the channel between the producer task and the consumer.
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
}

fn default_max_tokens() -> u32 {
    16_000
}

fn default_target_tokens() -> u32 {
    12_000
}

fn default_max_response_tokens() -> u32 {
    1_000
}

fn default_chunk_size() -> usize {
    50
}

fn default_stream_buffer() -> usize {
    32
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            target_tokens: default_target_tokens(),
            max_response_tokens: default_max_response_tokens(),
            chunk_size: default_chunk_size(),
            stream_buffer: default_stream_buffer(),
        }
    }
}

impl ChatConfig {
    /// Check the relationships between the fields.
    pub fn validate(&self) -> Result<(), String> {
        if self.target_tokens >= self.max_tokens {
            return Err(format!(
                "chat.target_tokens ({}) must be below chat.max_tokens ({})",
                self.target_tokens, self.max_tokens
            ));
        }
        if self.chunk_size == 0 {
            return Err("chat.chunk_size must be at least 1".to_string());
        }
        if self.stream_buffer == 0 {
            return Err("chat.stream_buffer must be at least 1".to_string());
        }
        Ok(())
    }
}
