//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Commands start, advance and abandon interviews; queries read progress and
//! recorded assessments.

pub mod handlers;

pub use handlers::{
    AbandonIntakeCommand, AbandonIntakeHandler, EngineSettings, GetAssessmentHandler,
    GetIntakeHandler, IntakeCommandError, IntakeSessionRegistry, InterviewEngine,
    InterviewError, StartIntakeCommand, StartIntakeHandler, SubmitAnswerCommand,
    SubmitAnswerHandler, TurnOutcome,
};
