//! HTTP/REST API layer for Parley.
//!
//! Axum-based API under `/api/` with session CRUD, the SSE chat stream,
//! a JSON error body, and CORS support.

pub mod error;
pub mod handlers;
pub mod router;

#[cfg(test)]
pub(crate) mod test_support;
