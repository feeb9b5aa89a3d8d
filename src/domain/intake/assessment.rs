//! Pre-assessment record kept against an appointment.
//!
//! This is what the clinic sees after an intake: whether it is still running,
//! how it ended and, when it completed, the structured report.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    AppointmentId, IntakeSessionId, StateMachine, Timestamp, ValidationError,
};

use super::emergency::EmergencyFinding;
use super::report::StructuredReport;

/// Outcome status of an appointment's pre-assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    InProgress,
    Completed,
    Escalated,
    Failed,
    Abandoned,
}

impl StateMachine for AssessmentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use AssessmentStatus::*;
        matches!(
            (self, target),
            (InProgress, Completed) | (InProgress, Escalated) | (InProgress, Failed) | (InProgress, Abandoned)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use AssessmentStatus::*;
        match self {
            InProgress => vec![Completed, Escalated, Failed, Abandoned],
            Completed | Escalated | Failed | Abandoned => vec![],
        }
    }
}

/// Stored pre-assessment for one appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub appointment_id: AppointmentId,
    pub session_id: IntakeSessionId,
    pub status: AssessmentStatus,
    pub structured_report: Option<StructuredReport>,
    pub red_flag: Option<EmergencyFinding>,
    pub failure_reason: Option<String>,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl AssessmentRecord {
    /// A record for an intake that has just started.
    pub fn started(appointment_id: AppointmentId, session_id: IntakeSessionId) -> Self {
        Self {
            appointment_id,
            session_id,
            status: AssessmentStatus::InProgress,
            structured_report: None,
            red_flag: None,
            failure_reason: None,
            started_at: Timestamp::now(),
            completed_at: None,
        }
    }

    pub fn complete(&mut self, report: StructuredReport) -> Result<(), ValidationError> {
        self.finish(AssessmentStatus::Completed)?;
        self.structured_report = Some(report);
        Ok(())
    }

    pub fn escalate(&mut self, finding: EmergencyFinding) -> Result<(), ValidationError> {
        self.finish(AssessmentStatus::Escalated)?;
        self.red_flag = Some(finding);
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), ValidationError> {
        self.finish(AssessmentStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    pub fn abandon(&mut self) -> Result<(), ValidationError> {
        self.finish(AssessmentStatus::Abandoned)
    }

    fn finish(&mut self, status: AssessmentStatus) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(status)?;
        self.completed_at = Some(Timestamp::now());
        Ok(())
    }
}
