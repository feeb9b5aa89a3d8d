//! End-to-end intake flows through the application handlers.
//!
//! Each test wires the real handlers, registry and in-memory assessment store
//! around a scripted oracle and drives a whole interview.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use clinical_intake::adapters::ai::{MockAIProvider, MockError};
use clinical_intake::adapters::assessment::InMemoryAssessmentRepository;
use clinical_intake::application::handlers::intake::{
    EngineSettings, GetAssessmentHandler, GetAssessmentQuery, GetIntakeHandler, GetIntakeQuery,
    IntakeCommandError, IntakeSessionRegistry, InterviewError, StartIntakeCommand,
    StartIntakeHandler, SubmitAnswerCommand, SubmitAnswerHandler, TurnOutcome,
};
use clinical_intake::domain::foundation::{AppointmentId, IntakeSessionId};
use clinical_intake::domain::intake::{AssessmentStatus, IntakeState, StructuredReport};
use clinical_intake::ports::{
    AIError, AIProvider, AssessmentRepository, CompletionRequest, CompletionResponse,
    MessageRole, ProviderInfo, RequestPurpose,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

const REPORT_JSON: &str = r#"{
    "summary_of_complaints": "Persistent dry cough",
    "symptom_timeline": "Began two weeks ago, worse at night",
    "key_risk_factors": ["Smoker"],
    "clinical_patterns": "Post-viral cough pattern",
    "red_flags": [],
    "narrative_section": "The patient reports a dry cough for two weeks."
}"#;

struct Intake {
    start: StartIntakeHandler,
    submit: SubmitAnswerHandler,
    get_intake: GetIntakeHandler,
    get_assessment: GetAssessmentHandler,
    registry: Arc<IntakeSessionRegistry>,
}

impl Intake {
    fn new(oracle: Arc<dyn AIProvider>) -> Self {
        let registry = Arc::new(IntakeSessionRegistry::new());
        let assessments: Arc<dyn AssessmentRepository> =
            Arc::new(InMemoryAssessmentRepository::new());

        Self {
            start: StartIntakeHandler::new(
                oracle,
                Arc::clone(&registry),
                Arc::clone(&assessments),
                EngineSettings::default(),
            ),
            submit: SubmitAnswerHandler::new(Arc::clone(&registry), Arc::clone(&assessments)),
            get_intake: GetIntakeHandler::new(Arc::clone(&registry)),
            get_assessment: GetAssessmentHandler::new(assessments),
            registry,
        }
    }

    async fn begin(&self, appointment: &str) -> (IntakeSessionId, String) {
        let result = self
            .start
            .handle(StartIntakeCommand {
                appointment_id: appointment_id(appointment),
            })
            .await
            .unwrap();
        (result.session_id, result.question)
    }

    async fn answer(
        &self,
        appointment: &str,
        session_id: &IntakeSessionId,
        text: &str,
    ) -> Result<TurnOutcome, IntakeCommandError> {
        self.submit
            .handle(SubmitAnswerCommand {
                appointment_id: appointment_id(appointment),
                session_id: session_id.clone(),
                answer: text.to_string(),
            })
            .await
            .map(|result| result.outcome)
    }

    async fn status(&self, appointment: &str) -> AssessmentStatus {
        self.get_assessment
            .handle(GetAssessmentQuery {
                appointment_id: appointment_id(appointment),
            })
            .await
            .unwrap()
            .status
    }
}

fn appointment_id(id: &str) -> AppointmentId {
    AppointmentId::new(id).unwrap()
}

fn question_text(outcome: &TurnOutcome) -> &str {
    match outcome {
        TurnOutcome::Question { text } => text,
        other => panic!("expected a question, got {:?}", other),
    }
}

// =============================================================================
// Scenario A: completion on the fifth answer
// =============================================================================

#[tokio::test]
async fn sentinel_on_fifth_answer_yields_report() {
    let oracle = MockAIProvider::new().with_responses([
        "What brings you in today?",
        "How long has the cough lasted?",
        "Is it dry or productive?",
        "Does anything make it better or worse?",
        "Have you taken anything for it?",
        "ASSESSMENT_COMPLETE",
        REPORT_JSON,
    ]);
    let intake = Intake::new(Arc::new(oracle.clone()));

    let (session_id, opening) = intake.begin("apt-a").await;
    assert_eq!(opening, "What brings you in today?");

    let answers = [
        "I have a cough",
        "About two weeks",
        "Dry, mostly at night",
        "Worse when lying down",
        "Just some cough drops",
    ];
    let expected = [
        "How long has the cough lasted?",
        "Is it dry or productive?",
        "Does anything make it better or worse?",
        "Have you taken anything for it?",
    ];

    for (answer, question) in answers[..4].iter().zip(expected) {
        let outcome = intake.answer("apt-a", &session_id, answer).await.unwrap();
        assert_eq!(question_text(&outcome), question);
    }

    let outcome = intake.answer("apt-a", &session_id, answers[4]).await.unwrap();
    let report = match outcome {
        TurnOutcome::Report { data } => data,
        other => panic!("expected a report, got {:?}", other),
    };
    assert_eq!(report, StructuredReport::parse(REPORT_JSON).unwrap());

    // Opening, five steering calls and one report request.
    assert_eq!(oracle.call_count(), 7);
    let last = oracle.last_call().unwrap();
    assert_eq!(last.metadata.purpose, RequestPurpose::Report);

    assert!(intake.registry.is_empty().await);
    assert_eq!(intake.status("apt-a").await, AssessmentStatus::Completed);
}

// =============================================================================
// Scenario B: completion followed by an unusable report
// =============================================================================

#[tokio::test]
async fn broken_report_is_a_distinct_failure_and_ends_the_session() {
    let oracle = MockAIProvider::new().with_responses([
        "What brings you in today?",
        "ASSESSMENT_COMPLETE",
        "{\"summary_of_complaints\": \"Cough\", ",
    ]);
    let intake = Intake::new(Arc::new(oracle));

    let (session_id, _) = intake.begin("apt-b").await;

    let err = intake
        .answer("apt-b", &session_id, "A cough, that's all")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IntakeCommandError::Interview(InterviewError::ReportGeneration(_))
    ));

    assert!(!intake.registry.contains(&session_id).await);
    assert_eq!(intake.status("apt-b").await, AssessmentStatus::Failed);

    let err = intake
        .answer("apt-b", &session_id, "Hello?")
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeCommandError::SessionNotFound(_)));
}

// =============================================================================
// Scenario C: transport failure mid-interview
// =============================================================================

#[tokio::test]
async fn transport_error_leaves_history_untouched_and_retry_is_safe() {
    let oracle = MockAIProvider::new().with_responses([
        "What brings you in today?",
        "How long has it lasted?",
    ]);
    let oracle = oracle.with_error(MockError::Network {
        message: "connection reset".to_string(),
    });
    oracle.push_response("Is it dry or productive?");
    let intake = Intake::new(Arc::new(oracle.clone()));

    let (session_id, _) = intake.begin("apt-c").await;
    intake
        .answer("apt-c", &session_id, "I have a cough")
        .await
        .unwrap();

    let before = intake
        .get_intake
        .handle(GetIntakeQuery {
            session_id: session_id.clone(),
        })
        .await
        .unwrap();

    // Third oracle call fails.
    let err = intake
        .answer("apt-c", &session_id, "About two weeks")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IntakeCommandError::Interview(InterviewError::Oracle(AIError::Network(_)))
    ));

    let after = intake
        .get_intake
        .handle(GetIntakeQuery {
            session_id: session_id.clone(),
        })
        .await
        .unwrap();
    assert_eq!(after.patient_turns, before.patient_turns);
    assert_eq!(after.current_question, before.current_question);
    assert_eq!(after.state, IntakeState::AwaitingPatientInput);
    assert_eq!(intake.status("apt-c").await, AssessmentStatus::InProgress);

    // The same answer again goes through.
    let outcome = intake
        .answer("apt-c", &session_id, "About two weeks")
        .await
        .unwrap();
    assert_eq!(question_text(&outcome), "Is it dry or productive?");
    assert_eq!(oracle.call_count(), 4);

    let view = intake
        .get_intake
        .handle(GetIntakeQuery { session_id })
        .await
        .unwrap();
    assert_eq!(view.patient_turns, 2);
}

// =============================================================================
// Scenario D: concurrent sessions
// =============================================================================

/// Replies with a question naming the latest answer it was shown, and flags
/// any request that mixes answers from two patients.
struct EchoOracle {
    crosstalk: AtomicBool,
}

impl EchoOracle {
    fn patient_of(text: &str) -> Option<&'static str> {
        if text.starts_with("alpha-") {
            Some("alpha")
        } else if text.starts_with("beta-") {
            Some("beta")
        } else {
            None
        }
    }
}

#[async_trait]
impl AIProvider for EchoOracle {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let answers: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .filter(|text| Self::patient_of(text).is_some())
            .collect();

        let mut patients: Vec<&str> = answers.iter().filter_map(|a| Self::patient_of(a)).collect();
        patients.dedup();
        if patients.len() > 1 {
            self.crosstalk.store(true, Ordering::SeqCst);
        }

        tokio::time::sleep(Duration::from_millis(2)).await;

        let question = match answers.last() {
            Some(answer) => format!("Tell me more about {answer}"),
            None => "What brings you in today?".to_string(),
        };
        Ok(CompletionResponse::text(question, "echo-1"))
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("echo", "echo-1", 8_192)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sessions_never_cross_contaminate() {
    let oracle = Arc::new(EchoOracle {
        crosstalk: AtomicBool::new(false),
    });
    let intake = Arc::new(Intake::new(oracle.clone()));

    let (alpha_id, _) = intake.begin("apt-alpha").await;
    let (beta_id, _) = intake.begin("apt-beta").await;

    let drive = |patient: &'static str, appointment: &'static str, session_id: IntakeSessionId| {
        let intake = Arc::clone(&intake);
        tokio::spawn(async move {
            let mut questions = Vec::new();
            for turn in 1..=6 {
                let answer = format!("{patient}-{turn}");
                let outcome = intake
                    .answer(appointment, &session_id, &answer)
                    .await
                    .unwrap();
                questions.push(question_text(&outcome).to_string());
            }
            questions
        })
    };

    let alpha = drive("alpha", "apt-alpha", alpha_id.clone());
    let beta = drive("beta", "apt-beta", beta_id.clone());
    let (alpha, beta) = (alpha.await.unwrap(), beta.await.unwrap());

    for (turn, question) in alpha.iter().enumerate() {
        assert_eq!(question, &format!("Tell me more about alpha-{}", turn + 1));
    }
    for (turn, question) in beta.iter().enumerate() {
        assert_eq!(question, &format!("Tell me more about beta-{}", turn + 1));
    }
    assert!(!oracle.crosstalk.load(Ordering::SeqCst));

    for session_id in [alpha_id, beta_id] {
        let view = intake
            .get_intake
            .handle(GetIntakeQuery { session_id })
            .await
            .unwrap();
        assert_eq!(view.patient_turns, 6);
    }
}

// =============================================================================
// Deterministic replay
// =============================================================================

#[tokio::test]
async fn replaying_the_same_answers_gives_the_same_outputs() {
    let script = [
        "What brings you in today?",
        "How long has it lasted?",
        "ASSESSMENT_COMPLETE",
        REPORT_JSON,
    ];
    let answers = ["A cough", "Two weeks"];

    let mut runs = Vec::new();
    for _ in 0..2 {
        let intake = Intake::new(Arc::new(MockAIProvider::new().with_responses(script)));
        let (session_id, opening) = intake.begin("apt-r").await;
        let mut outputs = vec![format!("{:?}", opening)];
        for answer in answers {
            let outcome = intake.answer("apt-r", &session_id, answer).await.unwrap();
            outputs.push(format!("{:?}", outcome));
        }
        runs.push(outputs);
    }

    assert_eq!(runs[0], runs[1]);
}
