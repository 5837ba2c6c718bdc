//! Anthropic Claude model provider implementation.
//!
//! This module provides the [`AnthropicProvider`] which implements the
//! [`LlmProvider`](parley_core::llm::provider::LlmProvider) trait for
//! the Anthropic Messages API with SSE streaming.

pub mod client;
pub mod streaming;
pub mod types;

pub use client::AnthropicProvider;
