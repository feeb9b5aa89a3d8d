//! Errors shared by the intake command and query handlers.

use thiserror::Error;

use super::engine::InterviewError;
use crate::domain::foundation::{AppointmentId, DomainError, ErrorCode, IntakeSessionId};

#[derive(Debug, Clone, Error)]
pub enum IntakeCommandError {
    #[error("intake session not found: {0}")]
    SessionNotFound(IntakeSessionId),

    #[error("intake session {session_id} does not belong to appointment {appointment_id}")]
    AppointmentMismatch {
        session_id: IntakeSessionId,
        appointment_id: AppointmentId,
    },

    #[error("no assessment recorded for appointment {0}")]
    AssessmentNotFound(AppointmentId),

    #[error(transparent)]
    Interview(#[from] InterviewError),

    #[error("repository error: {0}")]
    Repository(#[from] DomainError),
}

impl IntakeCommandError {
    pub fn code(&self) -> ErrorCode {
        match self {
            IntakeCommandError::SessionNotFound(_) | IntakeCommandError::AppointmentMismatch { .. } => {
                ErrorCode::SessionNotFound
            }
            IntakeCommandError::AssessmentNotFound(_) => ErrorCode::AssessmentNotFound,
            IntakeCommandError::Interview(err) => err.code(),
            IntakeCommandError::Repository(err) => err.code(),
        }
    }
}
