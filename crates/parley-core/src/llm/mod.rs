//! LLM provider abstractions for Parley.
//!
//! - `LlmProvider`: the streaming completion capability every backend implements
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `TokenBudget`: history truncation against the context budget

pub mod box_provider;
pub mod provider;
pub mod token_budget;
