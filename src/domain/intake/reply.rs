//! Interpretation of the oracle's reply to an interview step.
//!
//! The oracle is asked for a tagged JSON object (`status` = `continue` or
//! `complete`). Because the status is explicit, a question that happens to
//! contain the completion sentinel is still a question. Replies that are not
//! structured fall back to scanning for the sentinel.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::frame::FrameId;
use super::prompts::COMPLETION_SENTINEL;
use super::report::strip_code_fences;

/// What the oracle decided for this step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleReply {
    /// Keep interviewing with this question.
    Question {
        text: String,
        covered_frames: Vec<FrameId>,
    },
    /// The oracle judges every frame covered.
    Complete {
        covered_frames: Vec<FrameId>,
        /// Report content the oracle volunteered alongside the signal.
        inline_report: Option<String>,
    },
}

/// Reply could not be interpreted as a question or a completion signal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReplyError {
    #[error("oracle reply is empty")]
    Empty,

    #[error("oracle reply has unknown status '{0}'")]
    UnknownStatus(String),

    #[error("oracle reply asks to continue but carries no question")]
    MissingQuestion,

    #[error("oracle reply looks structured but is malformed: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct WireReply {
    status: String,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    covered_frames: Vec<String>,
    #[serde(default)]
    report: Option<Value>,
}

impl OracleReply {
    /// Interprets a raw oracle reply.
    pub fn parse(raw: &str) -> Result<Self, ReplyError> {
        let stripped = strip_code_fences(raw);
        if stripped.is_empty() {
            return Err(ReplyError::Empty);
        }

        if stripped.starts_with('{') {
            return match serde_json::from_str::<WireReply>(&stripped) {
                Ok(wire) => Self::from_wire(wire),
                Err(_) if stripped.contains(COMPLETION_SENTINEL) => Ok(Self::legacy_complete(&stripped)),
                Err(e) => Err(ReplyError::Malformed(e.to_string())),
            };
        }

        if stripped.contains(COMPLETION_SENTINEL) {
            return Ok(Self::legacy_complete(&stripped));
        }

        Ok(OracleReply::Question {
            text: stripped,
            covered_frames: Vec::new(),
        })
    }

    /// Returns true for a completion signal.
    pub fn is_complete(&self) -> bool {
        matches!(self, OracleReply::Complete { .. })
    }

    fn from_wire(wire: WireReply) -> Result<Self, ReplyError> {
        let covered_frames = wire
            .covered_frames
            .iter()
            .filter_map(|name| name.parse::<FrameId>().ok())
            .collect();

        match wire.status.trim().to_ascii_lowercase().as_str() {
            "continue" | "question" | "in_progress" => {
                let text = wire
                    .question
                    .map(|q| q.trim().to_string())
                    .filter(|q| !q.is_empty())
                    .ok_or(ReplyError::MissingQuestion)?;
                Ok(OracleReply::Question {
                    text,
                    covered_frames,
                })
            }
            "complete" | "completed" | "done" => Ok(OracleReply::Complete {
                covered_frames,
                inline_report: wire.report.filter(|r| !r.is_null()).map(|r| r.to_string()),
            }),
            _ => Err(ReplyError::UnknownStatus(wire.status)),
        }
    }

    /// Completion signalled by the bare sentinel; anything brace-like after it
    /// is treated as a volunteered report.
    fn legacy_complete(text: &str) -> Self {
        let inline_report = text
            .find(COMPLETION_SENTINEL)
            .map(|pos| text[pos + COMPLETION_SENTINEL.len()..].trim())
            .filter(|rest| rest.contains('{'))
            .map(str::to_string);

        OracleReply::Complete {
            covered_frames: Vec::new(),
            inline_report,
        }
    }
}
