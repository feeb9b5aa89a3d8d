//! HTTP adapter for intake endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    AbandonIntakeResponse, AssessmentResponse, ErrorResponse, HealthResponse,
    IntakeStatusResponse, StartIntakeResponse, SubmitMessageRequest, SubmitMessageResponse,
    COMPLETION_MESSAGE,
};
pub use handlers::{IntakeApiError, IntakeHandlers};
pub use routes::intake_routes;
