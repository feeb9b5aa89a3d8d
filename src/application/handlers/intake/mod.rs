//! Intake application handlers.
//!
//! The interview engine, the registry of live sessions and the command and
//! query handlers the HTTP layer calls.

mod abandon_intake;
mod engine;
mod errors;
mod get_intake;
mod registry;
mod start_intake;
mod submit_answer;

pub use abandon_intake::{AbandonIntakeCommand, AbandonIntakeHandler, AbandonIntakeResult};
pub use engine::{EngineSettings, InterviewEngine, InterviewError, TurnOutcome};
pub use errors::IntakeCommandError;
pub use get_intake::{
    GetAssessmentHandler, GetAssessmentQuery, GetIntakeHandler, GetIntakeQuery, IntakeView,
};
pub use registry::{IntakeSessionRegistry, SessionHandle};
pub use start_intake::{StartIntakeCommand, StartIntakeHandler, StartIntakeResult};
pub use submit_answer::{SubmitAnswerCommand, SubmitAnswerHandler, SubmitAnswerResult};
