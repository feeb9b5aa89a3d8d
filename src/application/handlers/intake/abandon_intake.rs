//! AbandonIntake - Command handler ending an interview the patient walked away from.

use std::sync::Arc;

use super::errors::IntakeCommandError;
use super::registry::IntakeSessionRegistry;
use crate::domain::foundation::{AppointmentId, DomainError, IntakeSessionId};
use crate::domain::intake::AssessmentStatus;
use crate::ports::AssessmentRepository;

#[derive(Debug, Clone)]
pub struct AbandonIntakeCommand {
    pub session_id: IntakeSessionId,
}

#[derive(Debug, Clone)]
pub struct AbandonIntakeResult {
    pub session_id: IntakeSessionId,
    pub appointment_id: Option<AppointmentId>,
}

pub struct AbandonIntakeHandler {
    registry: Arc<IntakeSessionRegistry>,
    assessments: Arc<dyn AssessmentRepository>,
}

impl AbandonIntakeHandler {
    pub fn new(
        registry: Arc<IntakeSessionRegistry>,
        assessments: Arc<dyn AssessmentRepository>,
    ) -> Self {
        Self {
            registry,
            assessments,
        }
    }

    pub async fn handle(
        &self,
        cmd: AbandonIntakeCommand,
    ) -> Result<AbandonIntakeResult, IntakeCommandError> {
        let handle = self
            .registry
            .remove(&cmd.session_id)
            .await
            .ok_or_else(|| IntakeCommandError::SessionNotFound(cmd.session_id.clone()))?;

        // Waits for an in-flight turn; that turn may still finish the interview.
        let appointment_id = handle.lock().await.session().appointment_id().cloned();

        if let Some(appointment_id) = &appointment_id {
            if let Some(mut record) = self.assessments.find_by_appointment(appointment_id).await? {
                if record.session_id == cmd.session_id
                    && record.status == AssessmentStatus::InProgress
                {
                    record.abandon().map_err(DomainError::from)?;
                    self.assessments.save(&record).await?;
                }
            }
        }

        tracing::info!(session_id = %cmd.session_id, "Intake abandoned");

        Ok(AbandonIntakeResult {
            session_id: cmd.session_id,
            appointment_id,
        })
    }
}
