//! Interview protocol engine.
//!
//! Drives one intake session against the oracle: obtains the opening
//! question, relays each answer with a steering instruction, decides between
//! continuing and finalizing, and turns the final exchange into a
//! structured report.
//!
//! The session is only mutated after the oracle has answered. A transport
//! failure or timeout leaves the transcript untouched, so the caller can
//! repeat the same call.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::foundation::{AppointmentId, ErrorCode, IntakeSessionId};
use crate::domain::intake::{
    prompts, CoveragePolicy, EmergencyFinding, EmergencyScreen, FrameId, IntakeSession,
    IntakeSessionError, IntakeState, OracleReply, ReplyError, ReportError, Speaker,
    StructuredReport, EMERGENCY_ADVICE,
};
use crate::ports::{AIError, AIProvider, CompletionRequest, Message, RequestMetadata, RequestPurpose};

/// Tunables for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Upper bound on each oracle call.
    pub oracle_timeout: Duration,
    /// Answers after which the interview is finalized regardless of coverage.
    pub max_patient_turns: usize,
    pub coverage_policy: CoveragePolicy,
    pub emergency_screen: EmergencyScreen,
    pub temperature: Option<f32>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            oracle_timeout: Duration::from_secs(60),
            max_patient_turns: 30,
            coverage_policy: CoveragePolicy::TrustOracle,
            emergency_screen: EmergencyScreen::enabled(),
            temperature: None,
        }
    }
}

/// Result of one accepted patient answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The interview continues with this question.
    Question { text: String },
    /// The interview is complete.
    Report { data: StructuredReport },
    /// The answer described a possible emergency; the interview is over.
    Emergency {
        advice: String,
        finding: EmergencyFinding,
    },
}

impl TurnOutcome {
    /// Returns true if no further answers will be accepted.
    pub fn is_final(&self) -> bool {
        !matches!(self, TurnOutcome::Question { .. })
    }
}

/// Errors surfaced by the engine. Nothing is retried internally.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InterviewError {
    #[error(transparent)]
    Session(#[from] IntakeSessionError),

    #[error("oracle unavailable: {0}")]
    Oracle(#[from] AIError),

    #[error("oracle did not answer within {timeout_secs}s")]
    OracleTimeout { timeout_secs: u64 },

    #[error("oracle reply could not be understood: {0}")]
    InvalidReply(#[from] ReplyError),

    #[error("report generation failed: {0}")]
    ReportGeneration(#[from] ReportError),
}

impl InterviewError {
    /// Returns true if the session had already ended.
    pub fn is_finalized(&self) -> bool {
        matches!(self, InterviewError::Session(IntakeSessionError::Finalized(_)))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            InterviewError::Session(IntakeSessionError::Finalized(_)) => ErrorCode::SessionFinalized,
            InterviewError::Session(IntakeSessionError::EmptyAnswer) => ErrorCode::EmptyField,
            InterviewError::Session(IntakeSessionError::AnswerTooLong { .. }) => {
                ErrorCode::ValidationFailed
            }
            InterviewError::Session(_) => ErrorCode::InvalidStateTransition,
            InterviewError::Oracle(_) | InterviewError::InvalidReply(_) => {
                ErrorCode::OracleUnavailable
            }
            InterviewError::OracleTimeout { .. } => ErrorCode::OracleTimeout,
            InterviewError::ReportGeneration(_) => ErrorCode::ReportGenerationFailed,
        }
    }
}

/// One interview, bound to its oracle.
pub struct InterviewEngine {
    session: IntakeSession,
    oracle: Arc<dyn AIProvider>,
    settings: EngineSettings,
    framing: String,
}

impl InterviewEngine {
    pub fn new(id: IntakeSessionId, oracle: Arc<dyn AIProvider>, settings: EngineSettings) -> Self {
        Self {
            session: IntakeSession::new(id),
            oracle,
            settings,
            framing: prompts::framing_instruction(),
        }
    }

    pub fn with_appointment(mut self, appointment_id: AppointmentId) -> Self {
        self.session = self.session.with_appointment(appointment_id);
        self
    }

    pub fn id(&self) -> &IntakeSessionId {
        self.session.id()
    }

    pub fn session(&self) -> &IntakeSession {
        &self.session
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Obtains the opening question and moves the session to awaiting input.
    pub async fn start(&mut self) -> Result<String, InterviewError> {
        match self.session.state() {
            IntakeState::Uninitialized => {}
            state if state.is_finalized() => {
                return Err(IntakeSessionError::Finalized(state).into())
            }
            _ => return Err(IntakeSessionError::AlreadyStarted.into()),
        }

        let raw = self
            .ask(RequestPurpose::Opening, Vec::new(), prompts::opening_instruction())
            .await?;

        let question = match OracleReply::parse(&raw)? {
            OracleReply::Question { text, .. } => text,
            OracleReply::Complete { .. } => return Err(ReplyError::MissingQuestion.into()),
        };

        self.session.begin(self.framing.clone(), question.clone())?;
        tracing::info!(session_id = %self.session.id(), "Intake interview started");
        Ok(question)
    }

    /// Relays one patient answer and returns what happens next.
    pub async fn next_turn(&mut self, answer: &str) -> Result<TurnOutcome, InterviewError> {
        let answer = self.session.validate_answer(answer)?;
        let turn = self.session.patient_turns() + 1;

        tracing::debug!(
            session_id = %self.session.id(),
            turn,
            answer_len = answer.len(),
            "Patient answer received"
        );

        if let Some(finding) = self.settings.emergency_screen.screen(&answer) {
            tracing::warn!(
                session_id = %self.session.id(),
                turn,
                category = ?finding.category,
                "Emergency language detected, ending interview"
            );
            self.session
                .record_escalation(answer, finding.clone(), EMERGENCY_ADVICE)?;
            return Ok(TurnOutcome::Emergency {
                advice: EMERGENCY_ADVICE.to_string(),
                finding,
            });
        }

        let history = self.history_with_answer(&answer);

        if turn >= self.settings.max_patient_turns {
            tracing::warn!(
                session_id = %self.session.id(),
                turn,
                limit = self.settings.max_patient_turns,
                "Turn limit reached, finalizing interview"
            );
            return self.finalize(answer, history, Vec::new(), None).await;
        }

        let raw = self
            .ask(RequestPurpose::Steering, history.clone(), prompts::steering_instruction())
            .await?;

        match OracleReply::parse(&raw)? {
            OracleReply::Question {
                text,
                covered_frames,
            } => self.continue_with(answer, text, &covered_frames),
            OracleReply::Complete {
                covered_frames,
                inline_report,
            } => {
                let mut projected = self.session.coverage().clone();
                projected.record(covered_frames.iter().copied());

                if self.settings.coverage_policy.permits_completion(&projected) {
                    return self
                        .finalize(answer, history, covered_frames, inline_report)
                        .await;
                }

                let missing = projected.missing();
                tracing::info!(
                    session_id = %self.session.id(),
                    turn,
                    missing = missing.len(),
                    "Completion claimed with uncovered frames, re-probing"
                );

                let raw = self
                    .ask(
                        RequestPurpose::Reprobe,
                        history.clone(),
                        prompts::reprobe_instruction(&missing),
                    )
                    .await?;

                match OracleReply::parse(&raw)? {
                    OracleReply::Question {
                        text,
                        covered_frames: more,
                    } => {
                        let covered = merge(covered_frames, more);
                        self.continue_with(answer, text, &covered)
                    }
                    OracleReply::Complete {
                        covered_frames: more,
                        inline_report,
                    } => {
                        tracing::warn!(
                            session_id = %self.session.id(),
                            turn,
                            "Completion repeated after re-probe, accepting"
                        );
                        let covered = merge(covered_frames, more);
                        self.finalize(answer, history, covered, inline_report).await
                    }
                }
            }
        }
    }

    fn continue_with(
        &mut self,
        answer: String,
        question: String,
        covered: &[FrameId],
    ) -> Result<TurnOutcome, InterviewError> {
        self.session
            .record_exchange(answer, question.clone(), covered)?;
        Ok(TurnOutcome::Question { text: question })
    }

    /// Builds the report from an inline payload or one report request.
    async fn finalize(
        &mut self,
        answer: String,
        history: Vec<Message>,
        covered: Vec<FrameId>,
        inline_report: Option<String>,
    ) -> Result<TurnOutcome, InterviewError> {
        let raw = match inline_report {
            Some(raw) => raw,
            None => {
                self.ask(RequestPurpose::Report, history, prompts::report_instruction())
                    .await?
            }
        };

        match StructuredReport::parse(&raw) {
            Ok(report) => {
                self.session
                    .record_completion(answer, report.clone(), &covered)?;
                tracing::info!(
                    session_id = %self.session.id(),
                    turns = self.session.patient_turns(),
                    red_flags = report.red_flags.len(),
                    "Intake interview completed"
                );
                Ok(TurnOutcome::Report { data: report })
            }
            Err(err) => {
                self.session.record_failure(answer, err.to_string())?;
                tracing::error!(
                    session_id = %self.session.id(),
                    error = %err,
                    "Structured report could not be parsed, session terminated"
                );
                Err(err.into())
            }
        }
    }

    /// Sends one request with a one-off instruction appended as the final user message.
    async fn ask(
        &self,
        purpose: RequestPurpose,
        history: Vec<Message>,
        instruction: String,
    ) -> Result<String, InterviewError> {
        let metadata = RequestMetadata::new(
            self.session.id().clone(),
            purpose,
            Uuid::new_v4().to_string(),
        );
        let mut request = CompletionRequest::new(metadata)
            .with_system_prompt(self.framing.clone())
            .with_messages(history)
            .with_message(crate::ports::MessageRole::User, instruction);
        if let Some(temperature) = self.settings.temperature {
            request = request.with_temperature(temperature);
        }

        let started = Instant::now();
        let timeout = self.settings.oracle_timeout;
        let response = match tokio::time::timeout(timeout, self.oracle.complete(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                tracing::warn!(
                    session_id = %self.session.id(),
                    %purpose,
                    error = %err,
                    "Oracle call failed"
                );
                return Err(err.into());
            }
            Err(_) => {
                tracing::warn!(
                    session_id = %self.session.id(),
                    %purpose,
                    timeout_secs = timeout.as_secs(),
                    "Oracle call timed out"
                );
                return Err(InterviewError::OracleTimeout {
                    timeout_secs: timeout.as_secs(),
                });
            }
        };

        tracing::debug!(
            session_id = %self.session.id(),
            %purpose,
            elapsed_ms = started.elapsed().as_millis() as u64,
            tokens = response.usage.total_tokens,
            "Oracle replied"
        );
        Ok(response.content)
    }

    /// The stored conversation as oracle messages, followed by the pending answer.
    fn history_with_answer(&self, answer: &str) -> Vec<Message> {
        let mut messages: Vec<Message> = self
            .session
            .transcript()
            .turns()
            .iter()
            .filter_map(|turn| match turn.speaker {
                Speaker::System => None,
                Speaker::Interviewer => Some(Message::assistant(&turn.text)),
                Speaker::Patient => Some(Message::user(&turn.text)),
            })
            .collect();
        messages.push(Message::user(answer));
        messages
    }
}

fn merge(mut first: Vec<FrameId>, second: Vec<FrameId>) -> Vec<FrameId> {
    first.extend(second);
    first
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::domain::intake::{RedFlagCategory, FRAME_CHECKLIST};
    use crate::ports::MessageRole;
    use proptest::prelude::*;

    const REPORT_JSON: &str = r#"{
        "summary_of_complaints": "Headache for three days",
        "symptom_timeline": "Started Monday, worse in the evenings",
        "key_risk_factors": ["Hypertension"],
        "clinical_patterns": "Tension-type pattern",
        "red_flags": [],
        "narrative_section": "The patient reports a headache."
    }"#;

    fn question(text: &str) -> String {
        serde_json::json!({"status": "continue", "question": text, "covered_frames": []}).to_string()
    }

    fn question_covering(text: &str, frames: &[&str]) -> String {
        serde_json::json!({"status": "continue", "question": text, "covered_frames": frames})
            .to_string()
    }

    fn complete() -> String {
        serde_json::json!({"status": "complete", "covered_frames": []}).to_string()
    }

    fn all_frames() -> Vec<&'static str> {
        FRAME_CHECKLIST.iter().map(|f| f.id.as_str()).collect()
    }

    fn engine_with(oracle: MockAIProvider, settings: EngineSettings) -> InterviewEngine {
        InterviewEngine::new(
            IntakeSessionId::new("session-1").unwrap(),
            Arc::new(oracle),
            settings,
        )
    }

    fn engine(oracle: MockAIProvider) -> InterviewEngine {
        engine_with(oracle, EngineSettings::default())
    }

    async fn started(oracle: MockAIProvider) -> InterviewEngine {
        let mut engine = engine(oracle.with_response(question("What brings you in today?")));
        engine.start().await.unwrap();
        engine
    }

    mod start {
        use super::*;

        #[tokio::test]
        async fn returns_question_and_awaits_input() {
            let oracle = MockAIProvider::new().with_response(question("What brings you in today?"));
            let mut engine = engine(oracle.clone());

            let first = engine.start().await.unwrap();

            assert_eq!(first, "What brings you in today?");
            assert_eq!(engine.session().state(), IntakeState::AwaitingPatientInput);
            assert_eq!(engine.session().transcript().len(), 2);
        }

        #[tokio::test]
        async fn sends_framing_as_system_prompt_and_opening_instruction() {
            let oracle = MockAIProvider::new().with_response(question("Hello?"));
            let mut engine = engine(oracle.clone());
            engine.start().await.unwrap();

            let call = oracle.last_call().unwrap();
            assert_eq!(call.metadata.purpose, RequestPurpose::Opening);
            assert!(call
                .system_prompt
                .as_deref()
                .unwrap()
                .contains("chief_complaint"));
            assert_eq!(call.messages.len(), 1);
            assert_eq!(call.messages[0].role, MessageRole::User);
        }

        #[tokio::test]
        async fn accepts_plain_text_opening() {
            let oracle = MockAIProvider::new().with_response("Hi, what brings you in?");
            let mut engine = engine(oracle);
            assert_eq!(engine.start().await.unwrap(), "Hi, what brings you in?");
        }

        #[tokio::test]
        async fn oracle_failure_leaves_session_uninitialized() {
            let oracle = MockAIProvider::new().with_error(MockError::Unavailable {
                message: "down".to_string(),
            });
            let mut engine = engine(oracle);

            let err = engine.start().await.unwrap_err();

            assert!(matches!(err, InterviewError::Oracle(AIError::Unavailable { .. })));
            assert_eq!(engine.session().state(), IntakeState::Uninitialized);
            assert!(engine.session().transcript().is_empty());
        }

        #[tokio::test]
        async fn completion_as_opening_is_invalid() {
            let oracle = MockAIProvider::new().with_response(complete());
            let mut engine = engine(oracle);
            assert_eq!(
                engine.start().await.unwrap_err(),
                InterviewError::InvalidReply(ReplyError::MissingQuestion)
            );
        }

        #[tokio::test]
        async fn second_start_fails() {
            let mut engine = started(MockAIProvider::new()).await;
            assert_eq!(
                engine.start().await.unwrap_err(),
                InterviewError::Session(IntakeSessionError::AlreadyStarted)
            );
        }
    }

    mod turns {
        use super::*;

        #[tokio::test]
        async fn continuing_turn_appends_two_entries() {
            let oracle = MockAIProvider::new();
            let mut engine = started(oracle.clone()).await;
            oracle.push_response(question_covering("Since when?", &["chief_complaint"]));

            let outcome = engine.next_turn("I have a headache").await.unwrap();

            assert_eq!(
                outcome,
                TurnOutcome::Question {
                    text: "Since when?".to_string()
                }
            );
            assert_eq!(engine.session().transcript().len(), 4);
            assert!(engine.session().coverage().contains(FrameId::ChiefComplaint));
        }

        #[tokio::test]
        async fn steering_request_carries_history_and_instruction() {
            let oracle = MockAIProvider::new();
            let mut engine = started(oracle.clone()).await;
            oracle.push_response(question("Since when?"));

            engine.next_turn("I have a headache").await.unwrap();

            let call = oracle.last_call().unwrap();
            assert_eq!(call.metadata.purpose, RequestPurpose::Steering);
            let roles: Vec<_> = call.messages.iter().map(|m| m.role).collect();
            assert_eq!(
                roles,
                vec![MessageRole::Assistant, MessageRole::User, MessageRole::User]
            );
            assert_eq!(call.messages[1].content, "I have a headache");
        }

        #[tokio::test]
        async fn completion_requests_report_and_appends_one_entry() {
            let oracle = MockAIProvider::new();
            let mut engine = started(oracle.clone()).await;
            oracle.push_response(complete());
            oracle.push_response(format!("```json\n{REPORT_JSON}\n```"));

            let outcome = engine.next_turn("No, that's all").await.unwrap();

            match outcome {
                TurnOutcome::Report { data } => {
                    assert_eq!(data.summary_of_complaints, "Headache for three days");
                    assert_eq!(data.key_risk_factors, vec!["Hypertension".to_string()]);
                }
                other => panic!("expected report, got {other:?}"),
            }
            assert_eq!(engine.session().state(), IntakeState::Complete);
            assert_eq!(engine.session().transcript().len(), 3);
            assert_eq!(
                oracle.last_call().unwrap().metadata.purpose,
                RequestPurpose::Report
            );
        }

        #[tokio::test]
        async fn legacy_sentinel_completes() {
            let oracle = MockAIProvider::new();
            let mut engine = started(oracle.clone()).await;
            oracle.push_response("ASSESSMENT_COMPLETE");
            oracle.push_response(REPORT_JSON);

            let outcome = engine.next_turn("That's everything").await.unwrap();
            assert!(matches!(outcome, TurnOutcome::Report { .. }));
        }

        #[tokio::test]
        async fn inline_report_skips_report_request() {
            let oracle = MockAIProvider::new();
            let mut engine = started(oracle.clone()).await;
            let reply = serde_json::json!({
                "status": "complete",
                "covered_frames": [],
                "report": serde_json::from_str::<serde_json::Value>(REPORT_JSON).unwrap(),
            });
            oracle.push_response(reply.to_string());

            let outcome = engine.next_turn("Done").await.unwrap();

            assert!(matches!(outcome, TurnOutcome::Report { .. }));
            assert_eq!(oracle.call_count(), 2);
        }

        #[tokio::test]
        async fn malformed_report_fails_and_terminates() {
            let oracle = MockAIProvider::new();
            let mut engine = started(oracle.clone()).await;
            oracle.push_response(complete());
            oracle.push_response("{\"summary_of_complaints\": ");

            let err = engine.next_turn("Done").await.unwrap_err();

            assert!(matches!(err, InterviewError::ReportGeneration(_)));
            assert_eq!(err.code(), ErrorCode::ReportGenerationFailed);
            assert_eq!(engine.session().state(), IntakeState::Failed);
            assert_eq!(engine.session().transcript().len(), 3);
        }

        #[tokio::test]
        async fn report_transport_failure_mutates_nothing() {
            let oracle = MockAIProvider::new();
            let mut engine = started(oracle.clone()).await;
            oracle.push_response(complete());
            oracle.push_error(MockError::Network {
                message: "reset".to_string(),
            });
            let before = engine.session().clone();

            let err = engine.next_turn("Done").await.unwrap_err();

            assert!(matches!(err, InterviewError::Oracle(_)));
            assert_eq!(engine.session(), &before);
        }

        #[tokio::test]
        async fn invalid_structured_reply_mutates_nothing() {
            let oracle = MockAIProvider::new();
            let mut engine = started(oracle.clone()).await;
            oracle.push_response(r#"{"status": "continue"}"#);
            let before = engine.session().clone();

            let err = engine.next_turn("A headache").await.unwrap_err();

            assert!(matches!(err, InterviewError::InvalidReply(_)));
            assert_eq!(engine.session(), &before);
        }
    }

    mod finalized {
        use super::*;

        #[tokio::test]
        async fn calls_after_completion_fail_without_mutation() {
            let oracle = MockAIProvider::new();
            let mut engine = started(oracle.clone()).await;
            oracle.push_response(complete());
            oracle.push_response(REPORT_JSON);
            engine.next_turn("Done").await.unwrap();
            let before = engine.session().clone();
            let calls = oracle.call_count();

            let err = engine.next_turn("One more thing").await.unwrap_err();
            assert!(err.is_finalized());
            assert_eq!(err.code(), ErrorCode::SessionFinalized);

            let err = engine.start().await.unwrap_err();
            assert!(err.is_finalized());

            assert_eq!(engine.session(), &before);
            assert_eq!(oracle.call_count(), calls);
        }

        #[tokio::test]
        async fn answer_before_start_is_rejected() {
            let mut engine = engine(MockAIProvider::new());
            assert_eq!(
                engine.next_turn("hello").await.unwrap_err(),
                InterviewError::Session(IntakeSessionError::NotStarted)
            );
        }

        #[tokio::test]
        async fn blank_answer_is_rejected_without_oracle_call() {
            let oracle = MockAIProvider::new();
            let mut engine = started(oracle.clone()).await;

            let err = engine.next_turn("  ").await.unwrap_err();

            assert_eq!(err.code(), ErrorCode::EmptyField);
            assert_eq!(oracle.call_count(), 1);
        }
    }

    mod emergency {
        use super::*;

        #[tokio::test]
        async fn emergency_answer_escalates_without_oracle_call() {
            let oracle = MockAIProvider::new();
            let mut engine = started(oracle.clone()).await;

            let outcome = engine
                .next_turn("I have crushing chest pain and my arm is numb")
                .await
                .unwrap();

            match outcome {
                TurnOutcome::Emergency { advice, finding } => {
                    assert_eq!(advice, EMERGENCY_ADVICE);
                    assert_eq!(finding.category, RedFlagCategory::Cardiac);
                }
                other => panic!("expected emergency, got {other:?}"),
            }
            assert_eq!(engine.session().state(), IntakeState::Escalated);
            assert_eq!(oracle.call_count(), 1);
            assert!(engine.next_turn("hello?").await.unwrap_err().is_finalized());
        }

        #[tokio::test]
        async fn disabled_screen_relays_answer() {
            let oracle = MockAIProvider::new().with_response(question("Hi?"));
            let settings = EngineSettings {
                emergency_screen: EmergencyScreen::disabled(),
                ..EngineSettings::default()
            };
            let mut engine = engine_with(oracle.clone(), settings);
            engine.start().await.unwrap();
            oracle.push_response(question("How long?"));

            let outcome = engine.next_turn("I can't breathe").await.unwrap();
            assert!(matches!(outcome, TurnOutcome::Question { .. }));
        }
    }

    mod limits {
        use super::*;

        #[tokio::test]
        async fn oracle_timeout_is_surfaced_and_mutates_nothing() {
            let oracle = MockAIProvider::new()
                .with_response(question("Hi?"))
                .with_delay(Duration::from_millis(200));
            let settings = EngineSettings {
                oracle_timeout: Duration::from_millis(20),
                ..EngineSettings::default()
            };
            let mut engine = engine_with(oracle, settings);

            let err = engine.start().await.unwrap_err();

            assert!(matches!(err, InterviewError::OracleTimeout { .. }));
            assert_eq!(err.code(), ErrorCode::OracleTimeout);
            assert!(engine.session().transcript().is_empty());
        }

        #[tokio::test]
        async fn turn_limit_forces_report() {
            let oracle = MockAIProvider::new().with_response(question("Hi?"));
            let settings = EngineSettings {
                max_patient_turns: 2,
                ..EngineSettings::default()
            };
            let mut engine = engine_with(oracle.clone(), settings);
            engine.start().await.unwrap();
            oracle.push_response(question("Since when?"));
            oracle.push_response(REPORT_JSON);

            assert!(!engine.next_turn("Headache").await.unwrap().is_final());
            let outcome = engine.next_turn("Since Monday").await.unwrap();

            assert!(matches!(outcome, TurnOutcome::Report { .. }));
            assert_eq!(
                oracle.last_call().unwrap().metadata.purpose,
                RequestPurpose::Report
            );
        }
    }

    mod coverage_gating {
        use super::*;

        fn strict() -> EngineSettings {
            EngineSettings {
                coverage_policy: CoveragePolicy::RequireAllFrames,
                ..EngineSettings::default()
            }
        }

        #[tokio::test]
        async fn premature_completion_is_reprobed() {
            let oracle = MockAIProvider::new().with_response(question("Hi?"));
            let mut engine = engine_with(oracle.clone(), strict());
            engine.start().await.unwrap();
            oracle.push_response(complete());
            oracle.push_response(question_covering("How long has it lasted?", &["chief_complaint"]));

            let outcome = engine.next_turn("Headache").await.unwrap();

            assert_eq!(
                outcome,
                TurnOutcome::Question {
                    text: "How long has it lasted?".to_string()
                }
            );
            let call = oracle.last_call().unwrap();
            assert_eq!(call.metadata.purpose, RequestPurpose::Reprobe);
            assert!(call.last_message().unwrap().content.contains("onset_and_duration"));
        }

        #[tokio::test]
        async fn repeated_completion_is_accepted() {
            let oracle = MockAIProvider::new().with_response(question("Hi?"));
            let mut engine = engine_with(oracle.clone(), strict());
            engine.start().await.unwrap();
            oracle.push_response(complete());
            oracle.push_response(complete());
            oracle.push_response(REPORT_JSON);

            let outcome = engine.next_turn("Headache").await.unwrap();
            assert!(matches!(outcome, TurnOutcome::Report { .. }));
        }

        #[tokio::test]
        async fn full_coverage_completes_directly() {
            let oracle = MockAIProvider::new().with_response(question("Hi?"));
            let mut engine = engine_with(oracle.clone(), strict());
            engine.start().await.unwrap();
            oracle.push_response(
                serde_json::json!({"status": "complete", "covered_frames": all_frames()}).to_string(),
            );
            oracle.push_response(REPORT_JSON);

            let outcome = engine.next_turn("That's all").await.unwrap();

            assert!(matches!(outcome, TurnOutcome::Report { .. }));
            assert!(engine.session().coverage().is_complete());
            assert_eq!(oracle.call_count(), 3);
        }
    }

    fn run<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    proptest! {
        #[test]
        fn history_grows_two_per_turn_and_one_on_finalize(
            answers in prop::collection::vec("[a-z]{1,10}( [a-z]{1,10}){0,3}", 1..8)
        ) {
            let (lengths, final_len, final_state) = run(async {
                let oracle = MockAIProvider::new().with_response(question("Hi?"));
                let settings = EngineSettings {
                    emergency_screen: EmergencyScreen::disabled(),
                    ..EngineSettings::default()
                };
                let mut engine = engine_with(oracle.clone(), settings);
                engine.start().await.unwrap();

                let mut lengths = vec![engine.session().transcript().len()];
                for answer in &answers {
                    oracle.push_response(question("And then?"));
                    engine.next_turn(answer).await.unwrap();
                    lengths.push(engine.session().transcript().len());
                }

                oracle.push_response(complete());
                oracle.push_response(REPORT_JSON);
                engine.next_turn("nothing else").await.unwrap();
                (lengths, engine.session().transcript().len(), engine.session().state())
            });

            prop_assert_eq!(lengths[0], 2);
            for pair in lengths.windows(2) {
                prop_assert_eq!(pair[1], pair[0] + 2);
            }
            prop_assert_eq!(final_len, lengths[lengths.len() - 1] + 1);
            prop_assert_eq!(final_state, IntakeState::Complete);
        }
    }
}
