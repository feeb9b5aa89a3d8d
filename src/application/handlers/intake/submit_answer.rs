//! SubmitAnswer - Command handler relaying one patient answer to its interview.
//!
//! Finished interviews (report, emergency or report failure) are removed from
//! the registry and their outcome written to the assessment record.

use std::sync::Arc;

use super::engine::TurnOutcome;
use super::errors::IntakeCommandError;
use super::registry::IntakeSessionRegistry;
use crate::domain::foundation::{AppointmentId, DomainError, IntakeSessionId, ValidationError};
use crate::domain::intake::{AssessmentRecord, IntakeState};
use crate::ports::AssessmentRepository;

/// Command carrying one patient answer.
#[derive(Debug, Clone)]
pub struct SubmitAnswerCommand {
    pub appointment_id: AppointmentId,
    pub session_id: IntakeSessionId,
    pub answer: String,
}

/// Result of one accepted answer.
#[derive(Debug, Clone)]
pub struct SubmitAnswerResult {
    pub outcome: TurnOutcome,
    /// True once the interview accepts no further answers.
    pub finished: bool,
}

/// Handler for patient answers.
pub struct SubmitAnswerHandler {
    registry: Arc<IntakeSessionRegistry>,
    assessments: Arc<dyn AssessmentRepository>,
}

impl SubmitAnswerHandler {
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
        cmd: SubmitAnswerCommand,
    ) -> Result<SubmitAnswerResult, IntakeCommandError> {
        let handle = self
            .registry
            .get(&cmd.session_id)
            .await
            .ok_or_else(|| IntakeCommandError::SessionNotFound(cmd.session_id.clone()))?;

        // Held for the whole turn: answers to one session never interleave.
        let mut engine = handle.lock().await;

        if engine.session().appointment_id() != Some(&cmd.appointment_id) {
            return Err(IntakeCommandError::AppointmentMismatch {
                session_id: cmd.session_id,
                appointment_id: cmd.appointment_id,
            });
        }

        match engine.next_turn(&cmd.answer).await {
            Ok(outcome) => {
                let finished = outcome.is_final();
                if finished {
                    self.registry.remove(&cmd.session_id).await;
                    self.record_outcome(&cmd, &outcome).await?;
                }
                Ok(SubmitAnswerResult { outcome, finished })
            }
            Err(err) => {
                if engine.session().state() == IntakeState::Failed {
                    self.registry.remove(&cmd.session_id).await;
                    if let Err(repo_err) = self
                        .update_record(&cmd, |record| record.fail(err.to_string()))
                        .await
                    {
                        tracing::error!(
                            appointment_id = %cmd.appointment_id,
                            session_id = %cmd.session_id,
                            error = %repo_err,
                            "Failed intake could not be recorded"
                        );
                    }
                }
                Err(err.into())
            }
        }
    }

    async fn record_outcome(
        &self,
        cmd: &SubmitAnswerCommand,
        outcome: &TurnOutcome,
    ) -> Result<(), IntakeCommandError> {
        match outcome {
            TurnOutcome::Report { data } => {
                self.update_record(cmd, |record| record.complete(data.clone()))
                    .await
            }
            TurnOutcome::Emergency { finding, .. } => {
                self.update_record(cmd, |record| record.escalate(finding.clone()))
                    .await
            }
            TurnOutcome::Question { .. } => Ok(()),
        }
    }

    /// Applies `apply` to the appointment's record if it still belongs to
    /// this session. A record owned by a newer intake is left untouched.
    async fn update_record<F>(
        &self,
        cmd: &SubmitAnswerCommand,
        apply: F,
    ) -> Result<(), IntakeCommandError>
    where
        F: FnOnce(&mut AssessmentRecord) -> Result<(), ValidationError>,
    {
        let record = self
            .assessments
            .find_by_appointment(&cmd.appointment_id)
            .await?;

        let mut record = match record {
            Some(record) if record.session_id == cmd.session_id => record,
            other => {
                tracing::warn!(
                    appointment_id = %cmd.appointment_id,
                    session_id = %cmd.session_id,
                    owner = ?other.map(|r| r.session_id.to_string()),
                    "Assessment record not owned by this session, outcome not recorded"
                );
                return Ok(());
            }
        };

        apply(&mut record).map_err(DomainError::from)?;
        self.assessments.save(&record).await?;

        tracing::info!(
            appointment_id = %cmd.appointment_id,
            session_id = %cmd.session_id,
            status = ?record.status,
            "Assessment recorded"
        );
        Ok(())
    }
}
