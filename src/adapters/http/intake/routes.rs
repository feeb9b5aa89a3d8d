//! HTTP routes for intake endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    abandon_intake, get_assessment, get_intake, health, start_intake, submit_message,
    IntakeHandlers,
};

/// Creates the intake router with all endpoints.
pub fn intake_routes(handlers: IntakeHandlers) -> Router {
    Router::new()
        .route("/api/appointments/:appointment_id/intake", post(start_intake))
        .route(
            "/api/appointments/:appointment_id/intake/messages",
            post(submit_message),
        )
        .route(
            "/api/appointments/:appointment_id/assessment",
            get(get_assessment),
        )
        .route(
            "/api/intake/:session_id",
            get(get_intake).delete(abandon_intake),
        )
        .route("/health", get(health))
        .with_state(handlers)
}
