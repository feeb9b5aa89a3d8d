//! Adapters - Implementations of port interfaces.
//!
//! - `ai` - oracle clients (Gemini, OpenAI-compatible, scripted mock)
//! - `assessment` - in-memory assessment store
//! - `http` - axum REST surface

pub mod ai;
pub mod assessment;
pub mod http;
