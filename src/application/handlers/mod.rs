//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod intake;

pub use intake::{
    AbandonIntakeCommand, AbandonIntakeHandler, AbandonIntakeResult, EngineSettings,
    GetAssessmentHandler, GetAssessmentQuery, GetIntakeHandler, GetIntakeQuery,
    IntakeCommandError, IntakeSessionRegistry, IntakeView, InterviewEngine, InterviewError,
    SessionHandle, StartIntakeCommand, StartIntakeHandler, StartIntakeResult,
    SubmitAnswerCommand, SubmitAnswerHandler, SubmitAnswerResult, TurnOutcome,
};
