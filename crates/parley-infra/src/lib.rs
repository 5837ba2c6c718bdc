//! Infrastructure layer for Parley.
//!
//! Contains implementations of the port traits defined in `parley-core`:
//! the SQLite session store, the Anthropic and mock model providers, the
//! configuration loader, and an HTTP client for the chat endpoint.

pub mod client;
pub mod config;
pub mod llm;
pub mod sqlite;
