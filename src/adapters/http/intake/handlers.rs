//! HTTP handlers for intake endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::application::handlers::intake::{
    AbandonIntakeCommand, AbandonIntakeHandler, EngineSettings, GetAssessmentHandler,
    GetAssessmentQuery, GetIntakeHandler, GetIntakeQuery, IntakeCommandError,
    IntakeSessionRegistry, InterviewError, StartIntakeCommand, StartIntakeHandler,
    SubmitAnswerCommand, SubmitAnswerHandler,
};
use crate::domain::foundation::{AppointmentId, IntakeSessionId, ValidationError};
use crate::domain::intake::IntakeSessionError;
use crate::ports::{AIProvider, AssessmentRepository, ProviderInfo};

use super::dto::{
    AbandonIntakeResponse, AssessmentResponse, ErrorResponse, HealthResponse,
    IntakeStatusResponse, StartIntakeResponse, SubmitMessageRequest, SubmitMessageResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct IntakeHandlers {
    start_handler: Arc<StartIntakeHandler>,
    submit_handler: Arc<SubmitAnswerHandler>,
    abandon_handler: Arc<AbandonIntakeHandler>,
    get_intake_handler: Arc<GetIntakeHandler>,
    get_assessment_handler: Arc<GetAssessmentHandler>,
    registry: Arc<IntakeSessionRegistry>,
    provider: ProviderInfo,
}

impl IntakeHandlers {
    /// Wires every intake handler around one shared session registry.
    pub fn new(
        oracle: Arc<dyn AIProvider>,
        assessments: Arc<dyn AssessmentRepository>,
        settings: EngineSettings,
    ) -> Self {
        let registry = Arc::new(IntakeSessionRegistry::new());
        let provider = oracle.provider_info();

        Self {
            start_handler: Arc::new(StartIntakeHandler::new(
                oracle,
                Arc::clone(&registry),
                Arc::clone(&assessments),
                settings,
            )),
            submit_handler: Arc::new(SubmitAnswerHandler::new(
                Arc::clone(&registry),
                Arc::clone(&assessments),
            )),
            abandon_handler: Arc::new(AbandonIntakeHandler::new(
                Arc::clone(&registry),
                Arc::clone(&assessments),
            )),
            get_intake_handler: Arc::new(GetIntakeHandler::new(Arc::clone(&registry))),
            get_assessment_handler: Arc::new(GetAssessmentHandler::new(assessments)),
            registry,
            provider,
        }
    }

    pub fn registry(&self) -> &Arc<IntakeSessionRegistry> {
        &self.registry
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error mapping
// ════════════════════════════════════════════════════════════════════════════

/// Failure of an intake endpoint, rendered as an [`ErrorResponse`].
#[derive(Debug, Error)]
pub enum IntakeApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] ValidationError),

    #[error(transparent)]
    Command(#[from] IntakeCommandError),
}

impl IntakeApiError {
    fn status(&self) -> StatusCode {
        match self {
            IntakeApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            IntakeApiError::Command(err) => command_status(err),
        }
    }

    fn code(&self) -> String {
        match self {
            IntakeApiError::InvalidRequest(_) => "BAD_REQUEST".to_string(),
            IntakeApiError::Command(err) => err.code().to_string(),
        }
    }
}

fn command_status(err: &IntakeCommandError) -> StatusCode {
    match err {
        IntakeCommandError::SessionNotFound(_)
        | IntakeCommandError::AppointmentMismatch { .. }
        | IntakeCommandError::AssessmentNotFound(_) => StatusCode::NOT_FOUND,
        IntakeCommandError::Interview(err) => match err {
            InterviewError::Session(
                IntakeSessionError::EmptyAnswer | IntakeSessionError::AnswerTooLong { .. },
            ) => StatusCode::BAD_REQUEST,
            InterviewError::Session(_) => StatusCode::CONFLICT,
            InterviewError::Oracle(_)
            | InterviewError::InvalidReply(_)
            | InterviewError::ReportGeneration(_) => StatusCode::BAD_GATEWAY,
            InterviewError::OracleTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        },
        IntakeCommandError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for IntakeApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            IntakeApiError::InvalidRequest(err) => ErrorResponse::bad_request(err.to_string()),
            IntakeApiError::Command(IntakeCommandError::Interview(InterviewError::Oracle(ai))) => {
                ErrorResponse::new(self.code(), self.to_string())
                    .with_details(serde_json::json!({ "retryable": ai.is_retryable() }))
            }
            IntakeApiError::Command(_) => ErrorResponse::new(self.code(), self.to_string()),
        };

        if status.is_server_error() {
            tracing::warn!(status = %status, code = %body.code, error = %self, "Intake request failed");
        }

        (status, Json(body)).into_response()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/appointments/:appointment_id/intake - Start an intake
pub async fn start_intake(
    State(handlers): State<IntakeHandlers>,
    Path(appointment_id): Path<String>,
) -> Result<Json<StartIntakeResponse>, IntakeApiError> {
    let cmd = StartIntakeCommand {
        appointment_id: AppointmentId::new(appointment_id)?,
    };

    let result = handlers.start_handler.handle(cmd).await?;

    Ok(Json(StartIntakeResponse {
        agent_session_id: result.session_id.to_string(),
        message: result.question,
    }))
}

/// POST /api/appointments/:appointment_id/intake/messages - Relay one answer
pub async fn submit_message(
    State(handlers): State<IntakeHandlers>,
    Path(appointment_id): Path<String>,
    Json(req): Json<SubmitMessageRequest>,
) -> Result<Json<SubmitMessageResponse>, IntakeApiError> {
    let cmd = SubmitAnswerCommand {
        appointment_id: AppointmentId::new(appointment_id)?,
        session_id: IntakeSessionId::new(req.agent_session_id)?,
        answer: req.message,
    };

    let result = handlers.submit_handler.handle(cmd).await?;

    Ok(Json(SubmitMessageResponse::from(result.outcome)))
}

/// GET /api/intake/:session_id - Progress of a running intake
pub async fn get_intake(
    State(handlers): State<IntakeHandlers>,
    Path(session_id): Path<String>,
) -> Result<Json<IntakeStatusResponse>, IntakeApiError> {
    let query = GetIntakeQuery {
        session_id: IntakeSessionId::new(session_id)?,
    };

    let view = handlers.get_intake_handler.handle(query).await?;

    Ok(Json(view.into()))
}

/// DELETE /api/intake/:session_id - Abandon a running intake
pub async fn abandon_intake(
    State(handlers): State<IntakeHandlers>,
    Path(session_id): Path<String>,
) -> Result<Json<AbandonIntakeResponse>, IntakeApiError> {
    let cmd = AbandonIntakeCommand {
        session_id: IntakeSessionId::new(session_id)?,
    };

    let result = handlers.abandon_handler.handle(cmd).await?;

    Ok(Json(AbandonIntakeResponse {
        agent_session_id: result.session_id.to_string(),
        message: "Intake abandoned".to_string(),
    }))
}

/// GET /api/appointments/:appointment_id/assessment - Stored assessment
pub async fn get_assessment(
    State(handlers): State<IntakeHandlers>,
    Path(appointment_id): Path<String>,
) -> Result<Json<AssessmentResponse>, IntakeApiError> {
    let query = GetAssessmentQuery {
        appointment_id: AppointmentId::new(appointment_id)?,
    };

    let record = handlers.get_assessment_handler.handle(query).await?;

    Ok(Json(record.into()))
}

/// GET /health
pub async fn health(State(handlers): State<IntakeHandlers>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        provider: handlers.provider.name.clone(),
        model: handlers.provider.model.clone(),
        active_sessions: handlers.registry.len().await,
    })
}
