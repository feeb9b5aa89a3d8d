//! Query handlers for intake status and recorded assessments.

use serde::Serialize;
use std::sync::Arc;

use super::errors::IntakeCommandError;
use super::registry::IntakeSessionRegistry;
use crate::domain::foundation::{AppointmentId, IntakeSessionId, Timestamp};
use crate::domain::intake::{AssessmentRecord, FrameId, IntakeState};
use crate::ports::AssessmentRepository;

#[derive(Debug, Clone)]
pub struct GetIntakeQuery {
    pub session_id: IntakeSessionId,
}

/// Progress snapshot of a running interview. Carries no patient text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntakeView {
    pub session_id: IntakeSessionId,
    pub appointment_id: Option<AppointmentId>,
    pub state: IntakeState,
    pub patient_turns: usize,
    pub covered_frames: Vec<FrameId>,
    pub missing_frames: Vec<FrameId>,
    pub current_question: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

pub struct GetIntakeHandler {
    registry: Arc<IntakeSessionRegistry>,
}

impl GetIntakeHandler {
    pub fn new(registry: Arc<IntakeSessionRegistry>) -> Self {
        Self { registry }
    }

    pub async fn handle(&self, query: GetIntakeQuery) -> Result<IntakeView, IntakeCommandError> {
        let handle = self
            .registry
            .get(&query.session_id)
            .await
            .ok_or_else(|| IntakeCommandError::SessionNotFound(query.session_id.clone()))?;

        let engine = handle.lock().await;
        let session = engine.session();

        Ok(IntakeView {
            session_id: session.id().clone(),
            appointment_id: session.appointment_id().cloned(),
            state: session.state(),
            patient_turns: session.patient_turns(),
            covered_frames: session.coverage().covered(),
            missing_frames: session.coverage().missing(),
            current_question: session.transcript().last_question().map(str::to_string),
            created_at: session.created_at(),
            updated_at: session.updated_at(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GetAssessmentQuery {
    pub appointment_id: AppointmentId,
}

pub struct GetAssessmentHandler {
    assessments: Arc<dyn AssessmentRepository>,
}

impl GetAssessmentHandler {
    pub fn new(assessments: Arc<dyn AssessmentRepository>) -> Self {
        Self { assessments }
    }

    pub async fn handle(
        &self,
        query: GetAssessmentQuery,
    ) -> Result<AssessmentRecord, IntakeCommandError> {
        self.assessments
            .find_by_appointment(&query.appointment_id)
            .await?
            .ok_or(IntakeCommandError::AssessmentNotFound(query.appointment_id))
    }
}
