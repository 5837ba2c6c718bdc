//! Shared domain types for Parley.
//!
//! Chat sessions and messages, LLM request/stream shapes, configuration, and
//! the error enums shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
