//! Intake interview domain.
//!
//! The fixed frame checklist, the session aggregate and the pure pieces of
//! the interview protocol: prompt composition, oracle reply parsing, report
//! parsing, coverage gating and the emergency pre-screen.

mod assessment;
mod coverage;
mod emergency;
mod errors;
mod frame;
pub mod prompts;
mod reply;
mod report;
mod session;
mod state;
mod transcript;

pub use assessment::{AssessmentRecord, AssessmentStatus};
pub use coverage::{CoveragePolicy, FrameCoverage};
pub use emergency::{EmergencyFinding, EmergencyScreen, RedFlagCategory, EMERGENCY_ADVICE};
pub use errors::IntakeSessionError;
pub use frame::{Frame, FrameId, UnknownFrame, FRAME_CHECKLIST};
pub use reply::{OracleReply, ReplyError};
pub use report::{strip_code_fences, ReportError, StructuredReport, MAX_REPORT_LENGTH};
pub use session::{IntakeSession, MAX_ANSWER_LENGTH};
pub use state::IntakeState;
pub use transcript::{Speaker, Transcript, Turn};
