//! StartIntake - Command handler that opens an intake interview for an appointment.

use std::sync::Arc;

use super::engine::{EngineSettings, InterviewEngine};
use super::errors::IntakeCommandError;
use super::registry::IntakeSessionRegistry;
use crate::domain::foundation::{AppointmentId, DomainError, IntakeSessionId};
use crate::domain::intake::{AssessmentRecord, AssessmentStatus};
use crate::ports::{AIProvider, AssessmentRepository};

/// Command to start an intake for an appointment.
#[derive(Debug, Clone)]
pub struct StartIntakeCommand {
    pub appointment_id: AppointmentId,
}

/// Result of a started intake.
#[derive(Debug, Clone)]
pub struct StartIntakeResult {
    pub session_id: IntakeSessionId,
    /// Opening question for the patient.
    pub question: String,
}

/// Handler for starting intakes.
pub struct StartIntakeHandler {
    oracle: Arc<dyn AIProvider>,
    registry: Arc<IntakeSessionRegistry>,
    assessments: Arc<dyn AssessmentRepository>,
    settings: EngineSettings,
}

impl StartIntakeHandler {
    pub fn new(
        oracle: Arc<dyn AIProvider>,
        registry: Arc<IntakeSessionRegistry>,
        assessments: Arc<dyn AssessmentRepository>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            oracle,
            registry,
            assessments,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: StartIntakeCommand,
    ) -> Result<StartIntakeResult, IntakeCommandError> {
        let session_id = IntakeSessionId::generate();
        let mut engine = InterviewEngine::new(
            session_id.clone(),
            Arc::clone(&self.oracle),
            self.settings.clone(),
        )
        .with_appointment(cmd.appointment_id.clone());

        // Nothing is registered or recorded unless the opening question arrived.
        let question = engine.start().await?;

        // A new intake supersedes one still running for the same appointment.
        if let Some(mut previous) = self
            .assessments
            .find_by_appointment(&cmd.appointment_id)
            .await?
        {
            if previous.status == AssessmentStatus::InProgress {
                self.registry.remove(&previous.session_id).await;
                previous.abandon().map_err(DomainError::from)?;
                self.assessments.save(&previous).await?;
                tracing::info!(
                    appointment_id = %cmd.appointment_id,
                    superseded = %previous.session_id,
                    "Running intake superseded"
                );
            }
        }

        let record = AssessmentRecord::started(cmd.appointment_id.clone(), session_id.clone());
        self.assessments.save(&record).await?;
        self.registry.insert(engine).await;

        tracing::info!(
            appointment_id = %cmd.appointment_id,
            session_id = %session_id,
            "Intake started"
        );

        Ok(StartIntakeResult {
            session_id,
            question,
        })
    }
}
