//! Chat pipeline and port trait definitions for Parley.
//!
//! This crate defines the "ports" (`SessionStore`, `LlmProvider`) that the
//! infrastructure layer implements, together with the pure parts of a chat
//! turn: history truncation, chunk re-segmentation, the streaming engine, and
//! the event-stream transport codec. It depends only on `parley-types` --
//! never on `parley-infra` or any database/HTTP crate.

pub mod chat;
pub mod llm;
pub mod transport;
