//! Error types for the intake session aggregate.

use super::state::IntakeState;

/// Rejected operations on an interview session.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum IntakeSessionError {
    #[error("session already started")]
    AlreadyStarted,

    #[error("session not started")]
    NotStarted,

    #[error("session already finalized ({0:?})")]
    Finalized(IntakeState),

    #[error("answer cannot be empty")]
    EmptyAnswer,

    #[error("answer too long: {actual} characters exceeds maximum of {max}")]
    AnswerTooLong { max: usize, actual: usize },

    #[error("invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: IntakeState, to: IntakeState },
}
