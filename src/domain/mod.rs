//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `intake` - Pre-appointment intake interview: frames, sessions, reports

pub mod foundation;
pub mod intake;
