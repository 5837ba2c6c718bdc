//! Chat sessions and the streaming turn pipeline.
//!
//! - `SessionStore`: persistence port for sessions and their message logs
//! - `ChatService`: session CRUD facade used by the HTTP and CLI callers
//! - `StreamingChatEngine`: one chat turn from history load to persistence
//! - `chunker`: fixed-size re-segmentation of model output

pub mod chunker;
pub mod engine;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod fakes;

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
