//! HTTP DTOs for intake endpoints.
//!
//! Field names follow the patient-facing client: the session id travels as
//! `agent_session_id` and every reply carries a display `message`.

use serde::{Deserialize, Serialize};

use crate::application::handlers::intake::{IntakeView, TurnOutcome};
use crate::domain::intake::{
    AssessmentRecord, AssessmentStatus, EmergencyFinding, FrameId, IntakeState, StructuredReport,
};

/// Shown to the patient once the report has been produced.
pub const COMPLETION_MESSAGE: &str = "Assessment complete!";

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// One patient answer.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitMessageRequest {
    pub agent_session_id: String,
    pub message: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Response to a started intake.
#[derive(Debug, Clone, Serialize)]
pub struct StartIntakeResponse {
    pub agent_session_id: String,
    /// Opening question.
    pub message: String,
}

/// Response to one patient answer.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitMessageResponse {
    pub message: String,
    pub finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_report: Option<StructuredReport>,
    pub outcome: TurnOutcome,
}

impl From<TurnOutcome> for SubmitMessageResponse {
    fn from(outcome: TurnOutcome) -> Self {
        let (message, structured_report) = match &outcome {
            TurnOutcome::Question { text } => (text.clone(), None),
            TurnOutcome::Report { data } => (COMPLETION_MESSAGE.to_string(), Some(data.clone())),
            TurnOutcome::Emergency { advice, .. } => (advice.clone(), None),
        };
        Self {
            message,
            finished: outcome.is_final(),
            structured_report,
            outcome,
        }
    }
}

/// Progress of a running intake.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeStatusResponse {
    pub agent_session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
    pub state: IntakeState,
    pub patient_turns: usize,
    pub covered_frames: Vec<FrameId>,
    pub missing_frames: Vec<FrameId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<IntakeView> for IntakeStatusResponse {
    fn from(view: IntakeView) -> Self {
        Self {
            agent_session_id: view.session_id.to_string(),
            appointment_id: view.appointment_id.map(|id| id.to_string()),
            state: view.state,
            patient_turns: view.patient_turns,
            covered_frames: view.covered_frames,
            missing_frames: view.missing_frames,
            current_question: view.current_question,
            created_at: view.created_at.to_rfc3339(),
            updated_at: view.updated_at.to_rfc3339(),
        }
    }
}

/// Response to an abandoned intake.
#[derive(Debug, Clone, Serialize)]
pub struct AbandonIntakeResponse {
    pub agent_session_id: String,
    pub message: String,
}

/// Stored assessment for an appointment.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResponse {
    pub appointment_id: String,
    pub agent_session_id: String,
    pub status: AssessmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_report: Option<StructuredReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub red_flag: Option<EmergencyFinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl From<AssessmentRecord> for AssessmentResponse {
    fn from(record: AssessmentRecord) -> Self {
        Self {
            appointment_id: record.appointment_id.to_string(),
            agent_session_id: record.session_id.to_string(),
            status: record.status,
            structured_report: record.structured_report,
            red_flag: record.red_flag,
            failure_reason: record.failure_reason,
            started_at: record.started_at.to_rfc3339(),
            completed_at: record.completed_at.map(|ts| ts.to_rfc3339()),
        }
    }
}

/// Liveness and oracle identity.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub provider: String,
    pub model: String,
    pub active_sessions: usize,
}

/// Error body shared by all intake endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl ToString, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
