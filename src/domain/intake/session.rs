//! Interview session aggregate.
//!
//! Holds everything one patient's intake accumulates. Mutators are only
//! called once the oracle has answered, so a failed oracle call leaves the
//! session exactly as it was.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AppointmentId, IntakeSessionId, StateMachine, Timestamp};

use super::coverage::FrameCoverage;
use super::emergency::EmergencyFinding;
use super::errors::IntakeSessionError;
use super::frame::FrameId;
use super::report::StructuredReport;
use super::state::IntakeState;
use super::transcript::{Speaker, Transcript};

/// Maximum accepted length of one patient answer, in characters.
pub const MAX_ANSWER_LENGTH: usize = 4_000;

/// One patient's intake conversation and its accumulated state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeSession {
    id: IntakeSessionId,
    appointment_id: Option<AppointmentId>,
    state: IntakeState,
    transcript: Transcript,
    coverage: FrameCoverage,
    report: Option<StructuredReport>,
    escalation: Option<EmergencyFinding>,
    failure: Option<String>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl IntakeSession {
    /// Creates an uninitialized session.
    pub fn new(id: IntakeSessionId) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            appointment_id: None,
            state: IntakeState::Uninitialized,
            transcript: Transcript::new(),
            coverage: FrameCoverage::new(),
            report: None,
            escalation: None,
            failure: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Links the session to the appointment it screens for.
    pub fn with_appointment(mut self, appointment_id: AppointmentId) -> Self {
        self.appointment_id = Some(appointment_id);
        self
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    pub fn id(&self) -> &IntakeSessionId {
        &self.id
    }

    pub fn appointment_id(&self) -> Option<&AppointmentId> {
        self.appointment_id.as_ref()
    }

    pub fn state(&self) -> IntakeState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn coverage(&self) -> &FrameCoverage {
        &self.coverage
    }

    pub fn report(&self) -> Option<&StructuredReport> {
        self.report.as_ref()
    }

    pub fn escalation(&self) -> Option<&EmergencyFinding> {
        self.escalation.as_ref()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Number of answers accepted so far.
    pub fn patient_turns(&self) -> usize {
        self.transcript.patient_turns()
    }

    // ───────────────────────────────────────────────────────────────
    // Guards
    // ───────────────────────────────────────────────────────────────

    /// Fails unless the session is waiting for an answer.
    pub fn ensure_accepting_answers(&self) -> Result<(), IntakeSessionError> {
        match self.state {
            IntakeState::AwaitingPatientInput => Ok(()),
            IntakeState::Uninitialized => Err(IntakeSessionError::NotStarted),
            finalized => Err(IntakeSessionError::Finalized(finalized)),
        }
    }

    /// Checks an answer without recording it; returns the trimmed text.
    pub fn validate_answer(&self, answer: &str) -> Result<String, IntakeSessionError> {
        self.ensure_accepting_answers()?;

        let trimmed = answer.trim();
        if trimmed.is_empty() {
            return Err(IntakeSessionError::EmptyAnswer);
        }
        let length = trimmed.chars().count();
        if length > MAX_ANSWER_LENGTH {
            return Err(IntakeSessionError::AnswerTooLong {
                max: MAX_ANSWER_LENGTH,
                actual: length,
            });
        }
        Ok(trimmed.to_string())
    }

    // ───────────────────────────────────────────────────────────────
    // Transitions
    // ───────────────────────────────────────────────────────────────

    /// Records the framing and the opening question.
    pub fn begin(
        &mut self,
        framing: impl Into<String>,
        opening_question: impl Into<String>,
    ) -> Result<(), IntakeSessionError> {
        if self.state != IntakeState::Uninitialized {
            return Err(IntakeSessionError::AlreadyStarted);
        }
        self.transition(IntakeState::AwaitingPatientInput)?;
        self.transcript.push(Speaker::System, framing);
        self.transcript.push(Speaker::Interviewer, opening_question);
        Ok(())
    }

    /// Records an answer followed by the next interviewer question.
    pub fn record_exchange(
        &mut self,
        answer: impl Into<String>,
        question: impl Into<String>,
        covered: &[FrameId],
    ) -> Result<(), IntakeSessionError> {
        self.transition(IntakeState::AwaitingPatientInput)?;
        self.transcript.push(Speaker::Patient, answer);
        self.transcript.push(Speaker::Interviewer, question);
        self.coverage.record(covered.iter().copied());
        Ok(())
    }

    /// Records the final answer and the report it produced.
    pub fn record_completion(
        &mut self,
        answer: impl Into<String>,
        report: StructuredReport,
        covered: &[FrameId],
    ) -> Result<(), IntakeSessionError> {
        self.transition(IntakeState::Complete)?;
        self.transcript.push(Speaker::Patient, answer);
        self.coverage.record(covered.iter().copied());
        self.report = Some(report);
        Ok(())
    }

    /// Records an answer that triggered emergency escalation and the advice given.
    pub fn record_escalation(
        &mut self,
        answer: impl Into<String>,
        finding: EmergencyFinding,
        advice: impl Into<String>,
    ) -> Result<(), IntakeSessionError> {
        self.transition(IntakeState::Escalated)?;
        self.transcript.push(Speaker::Patient, answer);
        self.transcript.push(Speaker::Interviewer, advice);
        self.escalation = Some(finding);
        Ok(())
    }

    /// Records the final answer of an interview whose report could not be built.
    pub fn record_failure(
        &mut self,
        answer: impl Into<String>,
        reason: impl Into<String>,
    ) -> Result<(), IntakeSessionError> {
        self.transition(IntakeState::Failed)?;
        self.transcript.push(Speaker::Patient, answer);
        self.failure = Some(reason.into());
        Ok(())
    }

    fn transition(&mut self, target: IntakeState) -> Result<(), IntakeSessionError> {
        if self.state.is_finalized() {
            return Err(IntakeSessionError::Finalized(self.state));
        }
        self.state = self
            .state
            .transition_to(target)
            .map_err(|_| IntakeSessionError::InvalidTransition {
                from: self.state,
                to: target,
            })?;
        self.updated_at = Timestamp::now();
        Ok(())
    }
}
